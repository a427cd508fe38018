/// Block sizes and payload addresses are kept on this boundary.
pub const DOUBLE_WORD: usize = 8;

/// Rounds the given size up to the next double word boundary.
///
/// # Examples
///
/// ```rust
/// use pheap::align;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(1 + 4), 8);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::DOUBLE_WORD - 1) & !($crate::align::DOUBLE_WORD - 1)
  };
}

/// Returns whether the given address or offset sits on a double word boundary.
#[inline]
pub fn is_aligned(value: usize) -> bool {
  value & (DOUBLE_WORD - 1) == 0
}
