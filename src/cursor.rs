use crate::block::Header;
use crate::region::Region;

/// Handle to a block: its header offset in the region and the decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
  pub offset: usize,
  pub header: Header,
}

impl BlockRef {
  /// Reads the block at `offset`. `None` at the sentinel, or if the word
  /// there does not describe a block that fits before the sentinel.
  pub fn read(
    region: &Region,
    offset: usize,
  ) -> Option<Self> {
    if offset >= region.capacity() {
      return None;
    }
    let header = Header::decode(region.read(offset))?;
    if header.size() > region.capacity() - offset {
      return None;
    }
    Some(Self { offset, header })
  }

  pub fn size(&self) -> usize {
    self.header.size()
  }

  /// Offset one past the last byte, i.e. where the next header starts.
  pub fn end(&self) -> usize {
    self.offset + self.size()
  }

  /// The block immediately to the right, or `None` if that is the sentinel.
  pub fn next(
    &self,
    region: &Region,
  ) -> Option<Self> {
    Self::read(region, self.end())
  }
}

/// Walks the block list in address order, from the first block to the
/// sentinel.
///
/// The cursor only ever moves forward by a decoded block size and stops on
/// anything it cannot decode, so it never leaves the region.
pub struct Blocks<'a> {
  region: Option<&'a Region>,
  offset: usize,
}

impl<'a> Blocks<'a> {
  pub fn new(region: &'a Region) -> Self {
    Self {
      region: Some(region),
      offset: 0,
    }
  }

  /// A cursor over nothing, for a heap that has no region yet.
  pub fn empty() -> Self {
    Self {
      region: None,
      offset: 0,
    }
  }
}

impl Iterator for Blocks<'_> {
  type Item = BlockRef;

  fn next(&mut self) -> Option<BlockRef> {
    let region = self.region?;

    match BlockRef::read(region, self.offset) {
      Some(block) => {
        self.offset = block.end();
        Some(block)
      }
      None => {
        self.region = None;
        None
      }
    }
  }
}
