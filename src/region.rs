use std::ptr::{self, NonNull};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, _SC_PAGESIZE, mmap, sysconf};
use log::warn;

use crate::block::HEADER_SIZE;

/// Used when the platform refuses to report its page size.
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Provider of the backing store for a heap.
///
/// # Safety
///
/// A pointer returned by `acquire(len)` must be page aligned, zeroed, and
/// valid for reads and writes of `len` bytes for as long as the source's
/// heap exists. The range must not be handed out again.
///
/// A range the heap rejects (a base that is not double word aligned) is
/// never given back to the source; it stays mapped for the process.
pub unsafe trait RegionSource {
  /// Granularity the requested capacity is rounded up to. A page size that
  /// is not a multiple of 8 makes `Heap::init` fail before `acquire` runs.
  fn page_size(&self) -> usize;

  fn acquire(
    &mut self,
    len: usize,
  ) -> Option<NonNull<u8>>;
}

/// Anonymous private mapping obtained through `mmap(2)`.
///
/// The mapping is held for the rest of the process and never unmapped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mmap;

unsafe impl RegionSource for Mmap {
  fn page_size(&self) -> usize {
    let size = unsafe { sysconf(_SC_PAGESIZE) };
    if size <= 0 {
      FALLBACK_PAGE_SIZE
    } else {
      size as usize
    }
  }

  fn acquire(
    &mut self,
    len: usize,
  ) -> Option<NonNull<u8>> {
    let addr = unsafe {
      mmap(
        ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if addr == MAP_FAILED {
      warn!("mmap of {} bytes failed: {}", len, std::io::Error::last_os_error());
      return None;
    }

    NonNull::new(addr.cast())
  }
}

/// The managed byte range, addressed by block offsets.
///
/// ```text
///   base        start                                   sentinel
///    │           │                                          │
///    ▼           ▼                                          ▼
///    ┌──────┬────────────────────────────────────────────┬──────┐
///    │ pad  │ block │ block │ ...                  │ block │ 0x1  │
///    └──────┴────────────────────────────────────────────┴──────┘
///      4 B   ◄──────────────── capacity ───────────────►   4 B
/// ```
///
/// Offset 0 is the first block header, offset `capacity` is the sentinel.
/// Skipping the first four bytes puts every payload on a double word.
#[derive(Debug)]
pub struct Region {
  start: NonNull<u8>,
  capacity: usize,
}

impl Region {
  /// Number of bytes of a mapping that do not belong to any block.
  pub const RESERVED: usize = 2 * HEADER_SIZE;

  /// # Safety
  ///
  /// `base` must be double word aligned and valid for reads and writes of
  /// `capacity + Region::RESERVED` bytes for the lifetime of the region.
  pub unsafe fn new(
    base: NonNull<u8>,
    capacity: usize,
  ) -> Self {
    Self {
      start: unsafe { base.add(HEADER_SIZE) },
      capacity,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Address of the first block header.
  pub fn start(&self) -> usize {
    self.start.as_ptr() as usize
  }

  /// Reads the word at a block offset. The sentinel offset is readable.
  pub fn read(
    &self,
    offset: usize,
  ) -> u32 {
    self.check(offset);
    unsafe { self.start.add(offset).cast::<u32>().read() }
  }

  pub fn write(
    &mut self,
    offset: usize,
    word: u32,
  ) {
    self.check(offset);
    unsafe { self.start.add(offset).cast::<u32>().write(word) }
  }

  /// Payload pointer of the block whose header lives at `offset`.
  pub fn payload(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset < self.capacity);
    unsafe { self.start.add(offset + HEADER_SIZE) }
  }

  /// Header offset of the block owning the payload at `addr`, if `addr`
  /// could be a payload inside this region at all.
  pub fn header_of(
    &self,
    addr: usize,
  ) -> Option<usize> {
    let offset = addr.checked_sub(self.start())?.checked_sub(HEADER_SIZE)?;
    (offset < self.capacity).then_some(offset)
  }

  fn check(
    &self,
    offset: usize,
  ) {
    assert!(
      offset <= self.capacity && offset % HEADER_SIZE == 0,
      "offset {offset} outside region of {} bytes",
      self.capacity
    );
  }
}
