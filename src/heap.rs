use std::ptr::NonNull;

use log::{debug, trace, warn};

use crate::align::is_aligned;
use crate::block::{HEADER_SIZE, Header, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, SENTINEL};
use crate::cursor::{BlockRef, Blocks};
use crate::error::{HeapError, Result};
use crate::region::{Mmap, Region, RegionSource};
use crate::report::Report;

/// A best-fit heap over a single region obtained once from its source.
///
/// All bookkeeping lives in band: every block starts with a [`Header`] and
/// free blocks end with a footer repeating their size. Releasing a block
/// never merges it with its neighbors; call [`Heap::coalesce`] for that.
///
/// The heap is not `Send` or `Sync`. Wrap it in a lock covering every call
/// to share it between threads.
pub struct Heap<S: RegionSource = Mmap> {
  source: S,
  region: Option<Region>,
}

impl Heap<Mmap> {
  pub fn new() -> Self {
    Self::with_source(Mmap)
  }
}

impl Default for Heap<Mmap> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: RegionSource> Heap<S> {
  pub fn with_source(source: S) -> Self {
    Self {
      source,
      region: None,
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.region.is_some()
  }

  /// Bytes covered by blocks, headers included. Zero before [`Heap::init`].
  pub fn capacity(&self) -> usize {
    self.region.as_ref().map_or(0, Region::capacity)
  }

  /// Lays out the heap over a fresh region of at least `capacity` bytes.
  ///
  /// The request is rounded up to whole pages. Eight bytes of the mapping
  /// are kept for the alignment pad and the sentinel, the rest becomes one
  /// free block. Only the first successful call has an effect.
  pub fn init(
    &mut self,
    capacity: usize,
  ) -> Result<()> {
    if self.region.is_some() {
      warn!("heap initialized twice");
      return Err(HeapError::AlreadyInitialized);
    }

    if capacity == 0 {
      return Err(HeapError::InvalidArgument {
        size: capacity,
        reason: "capacity must be positive",
      });
    }

    let page_size = self.source.page_size();
    let len = capacity
      .checked_next_multiple_of(page_size)
      .filter(|&len| is_aligned(len))
      .filter(|&len| len >= Region::RESERVED + MIN_BLOCK_SIZE)
      .filter(|&len| len - Region::RESERVED <= MAX_BLOCK_SIZE)
      .ok_or(HeapError::InvalidArgument {
        size: capacity,
        reason: "capacity cannot be laid out in whole pages",
      })?;

    let base = self
      .source
      .acquire(len)
      .ok_or(HeapError::EnvironmentAllocationFailure { len })?;

    if !is_aligned(base.as_ptr() as usize) {
      warn!("region source returned misaligned base {:?}, dropping it", base);
      return Err(HeapError::EnvironmentAllocationFailure { len });
    }

    let usable = len - Region::RESERVED;
    let mut region = unsafe { Region::new(base, usable) };

    region.write(usable, SENTINEL);
    // No block precedes the first one, so it counts as allocated.
    region.write(0, Header::free(usable, true).encode());
    write_footer(&mut region, 0, usable);

    debug!(
      "heap initialized: {} bytes requested, {} mapped at {:?}, capacity {}",
      capacity, len, base, usable
    );

    self.region = Some(region);
    Ok(())
  }

  /// Allocates a block with room for `size` payload bytes.
  ///
  /// Free blocks are scanned in address order. A block of exactly the
  /// required size is taken as soon as it is found; otherwise the smallest
  /// sufficient block (the first one on ties) is split and its leading part
  /// handed out. The returned pointer is double word aligned.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let region = self.region.as_mut().ok_or(HeapError::NotInitialized)?;

    if size == 0 || size > region.capacity() {
      return Err(HeapError::InvalidArgument {
        size,
        reason: "size must be positive and within capacity",
      });
    }

    let required = crate::align!(size + HEADER_SIZE);

    let mut exact: Option<BlockRef> = None;
    let mut best: Option<BlockRef> = None;

    for block in Blocks::new(region) {
      if !block.header.is_free() || block.size() < required {
        continue;
      }

      if block.size() == required {
        exact = Some(block);
        break;
      }

      if best.is_none_or(|best| block.size() < best.size()) {
        trace!("best fit so far: {} bytes at offset {}", block.size(), block.offset);
        best = Some(block);
      }
    }

    if let Some(block) = exact {
      region.write(block.offset, block.header.with_allocated(true).encode());
      if let Some(next) = block.next(region) {
        region.write(next.offset, next.header.with_prev_allocated(true).encode());
      }

      debug!("allocated {} bytes at offset {} (exact fit)", required, block.offset);
      return Ok(region.payload(block.offset));
    }

    let Some(block) = best else {
      debug!("no free block of {} bytes", required);
      return Err(HeapError::CapacityExhausted { required });
    };

    region.write(
      block.offset,
      Header::used(required, block.header.prev_allocated).encode(),
    );

    // The remainder takes over the old footer slot; the block after it
    // still follows a free block, so its header is left alone.
    let rest = block.offset + required;
    let rest_size = block.size() - required;
    region.write(rest, Header::free(rest_size, true).encode());
    write_footer(region, rest, rest_size);

    debug!(
      "allocated {} bytes at offset {} (split, {} bytes left free)",
      required, block.offset, rest_size
    );
    Ok(region.payload(block.offset))
  }

  /// Releases a block previously returned by [`Heap::allocate`].
  ///
  /// The block becomes free and its right neighbor learns that its
  /// predecessor is free. Nothing is merged.
  pub fn release(
    &mut self,
    ptr: *mut u8,
  ) -> Result<()> {
    let region = self.region.as_mut().ok_or(HeapError::NotInitialized)?;
    let addr = ptr as usize;

    let reject = |reason: &'static str| {
      warn!("rejected release of {:#x}: {}", addr, reason);
      HeapError::InvalidHandle { addr, reason }
    };

    if ptr.is_null() {
      return Err(reject("null pointer"));
    }

    if !is_aligned(addr) {
      return Err(reject("misaligned pointer"));
    }

    let offset = region
      .header_of(addr)
      .ok_or_else(|| reject("outside the heap"))?;

    let block = Blocks::new(region)
      .take_while(|block| block.offset <= offset)
      .find(|block| block.offset == offset)
      .ok_or_else(|| reject("not the start of a block"))?;

    if block.header.is_free() {
      return Err(reject("block is not allocated"));
    }

    region.write(block.offset, block.header.with_allocated(false).encode());
    write_footer(region, block.offset, block.size());

    if let Some(next) = block.next(region) {
      region.write(next.offset, next.header.with_prev_allocated(false).encode());
    }

    debug!("released {} bytes at offset {}", block.size(), block.offset);
    Ok(())
  }

  /// Merges every run of adjacent free blocks into its first block.
  ///
  /// Returns whether anything was merged. One pass over the block list.
  pub fn coalesce(&mut self) -> bool {
    let Some(region) = self.region.as_mut() else {
      return false;
    };

    let mut merged = false;
    let mut cursor = BlockRef::read(region, 0);

    while let Some(block) = cursor {
      if block.header.allocated {
        cursor = block.next(region);
        continue;
      }

      let mut size = block.size();
      let mut next = block.next(region);

      while let Some(neighbor) = next.filter(|neighbor| neighbor.header.is_free()) {
        trace!(
          "absorbing {} bytes at offset {} into offset {}",
          neighbor.size(),
          neighbor.offset,
          block.offset
        );
        size += neighbor.size();
        next = neighbor.next(region);
      }

      if size != block.size() {
        region.write(block.offset, block.header.with_size(size).encode());
        write_footer(region, block.offset, size);
        merged = true;
      }

      cursor = next;
    }

    debug!("coalesce pass done, merged: {}", merged);
    merged
  }

  /// Blocks in address order. Empty before initialization.
  pub fn blocks(&self) -> Blocks<'_> {
    match &self.region {
      Some(region) => Blocks::new(region),
      None => Blocks::empty(),
    }
  }

  /// Checks every block list invariant: valid headers, exact tiling up to
  /// the sentinel, accurate predecessor bits and footers on free blocks.
  pub fn verify(&self) -> Result<()> {
    let region = self.region.as_ref().ok_or(HeapError::NotInitialized)?;
    let capacity = region.capacity();

    let mut offset = 0;
    let mut prev_allocated = true;

    while offset < capacity {
      let corrupted = |reason| HeapError::Corrupted { offset, reason };

      let header = Header::decode(region.read(offset)).ok_or(corrupted("invalid header"))?;

      if header.size() > capacity - offset {
        return Err(corrupted("block runs past the sentinel"));
      }

      if header.prev_allocated != prev_allocated {
        return Err(corrupted("stale predecessor bit"));
      }

      if header.is_free() && region.read(offset + header.size() - HEADER_SIZE) as usize != header.size() {
        return Err(corrupted("free block footer does not match its header"));
      }

      prev_allocated = header.allocated;
      offset += header.size();
    }

    if region.read(capacity) != SENTINEL {
      return Err(HeapError::Corrupted {
        offset: capacity,
        reason: "missing sentinel",
      });
    }

    Ok(())
  }

  pub fn report(&self) -> Report {
    let start = self.region.as_ref().map_or(0, Region::start);
    Report::new(start, self.blocks())
  }

  /// Prints the block table to stdout.
  pub fn dump(&self) {
    println!("{}", self.report());
  }
}

fn write_footer(
  region: &mut Region,
  offset: usize,
  size: usize,
) {
  region.write(offset + size - HEADER_SIZE, size as u32);
}
