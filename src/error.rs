use thiserror::Error;

/// Errors reported by every heap operation.
///
/// A failed call never leaves a partial update behind: validation happens
/// before any header is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
  /// A size of zero, a size larger than the managed capacity, or a capacity
  /// that cannot be encoded in a block header.
  #[error("invalid argument: {size} bytes ({reason})")]
  InvalidArgument { size: usize, reason: &'static str },

  #[error("heap is already initialized")]
  AlreadyInitialized,

  #[error("heap is not initialized")]
  NotInitialized,

  /// The region source could not provide the backing store.
  #[error("could not obtain {len} bytes from the environment")]
  EnvironmentAllocationFailure { len: usize },

  /// No free block is large enough. Coalescing and retrying may succeed.
  #[error("no free block of {required} bytes available")]
  CapacityExhausted { required: usize },

  /// Null, misaligned, out of range, or not a live allocation (double free).
  #[error("invalid handle {addr:#x}: {reason}")]
  InvalidHandle { addr: usize, reason: &'static str },

  #[error("heap corrupted at offset {offset}: {reason}")]
  Corrupted { offset: usize, reason: &'static str },
}

pub type Result<T> = core::result::Result<T, HeapError>;
