use crate::align::{DOUBLE_WORD, is_aligned};

/// Bytes taken by a block header (and by a free block footer).
pub const HEADER_SIZE: usize = size_of::<u32>();

/// Smallest block that can exist: a header plus the rest of a double word.
pub const MIN_BLOCK_SIZE: usize = DOUBLE_WORD;

/// Header word marking the end of the block list.
pub const SENTINEL: u32 = 1;

/// Largest block size a header word can carry.
pub const MAX_BLOCK_SIZE: usize = (u32::MAX as usize) & !(DOUBLE_WORD - 1);

const ALLOCATED_BIT: u32 = 0b01;
const PREV_ALLOCATED_BIT: u32 = 0b10;
const STATUS_MASK: u32 = (DOUBLE_WORD - 1) as u32;

/// Decoded block header.
///
/// The size always includes the header itself and is a positive multiple of
/// [`DOUBLE_WORD`]. Status is only ever read through the two flags, never by
/// arithmetic on the raw word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  size: usize,
  pub allocated: bool,
  pub prev_allocated: bool,
}

impl Header {
  /// Builds a header.
  ///
  /// # Panics
  ///
  /// Panics if `size` is zero, not a multiple of the double word, or too
  /// large to encode. Callers derive sizes from existing blocks, so this
  /// only fires on a broken invariant.
  pub fn new(
    size: usize,
    allocated: bool,
    prev_allocated: bool,
  ) -> Self {
    assert!(
      Self::valid_size(size),
      "block size {size} is not a positive multiple of {DOUBLE_WORD}"
    );
    Self {
      size,
      allocated,
      prev_allocated,
    }
  }

  pub fn free(
    size: usize,
    prev_allocated: bool,
  ) -> Self {
    Self::new(size, false, prev_allocated)
  }

  pub fn used(
    size: usize,
    prev_allocated: bool,
  ) -> Self {
    Self::new(size, true, prev_allocated)
  }

  pub fn valid_size(size: usize) -> bool {
    size >= MIN_BLOCK_SIZE && size <= MAX_BLOCK_SIZE && is_aligned(size)
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn is_free(&self) -> bool {
    !self.allocated
  }

  /// Decodes a raw word. `None` means the word is the sentinel or not a
  /// valid header at all.
  pub fn decode(word: u32) -> Option<Self> {
    if word == SENTINEL {
      return None;
    }
    let size = (word & !STATUS_MASK) as usize;
    if !Self::valid_size(size) {
      return None;
    }
    Some(Self {
      size,
      allocated: word & ALLOCATED_BIT != 0,
      prev_allocated: word & PREV_ALLOCATED_BIT != 0,
    })
  }

  pub fn encode(&self) -> u32 {
    let mut word = self.size as u32;
    if self.allocated {
      word |= ALLOCATED_BIT;
    }
    if self.prev_allocated {
      word |= PREV_ALLOCATED_BIT;
    }
    word
  }

  pub fn with_allocated(
    self,
    allocated: bool,
  ) -> Self {
    Self { allocated, ..self }
  }

  pub fn with_prev_allocated(
    self,
    prev_allocated: bool,
  ) -> Self {
    Self {
      prev_allocated,
      ..self
    }
  }

  pub fn with_size(
    self,
    size: usize,
  ) -> Self {
    Self::new(size, self.allocated, self.prev_allocated)
  }
}
