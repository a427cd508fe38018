//! # pheap - A Best-Fit Heap over a Single Region
//!
//! This crate manages one memory region obtained from the operating system
//! (through `mmap(2)`) and serves allocation and release requests from it
//! using **implicit block lists**: every block carries its own header, and
//! the list is walked by stepping over block sizes.
//!
//! ## Overview
//!
//! ```text
//!   Region Layout:
//!
//!   ┌─────┬────────┬────────┬──────────────┬────────┬─────────────┬──────┐
//!   │ pad │ A (16) │ F (24) │    B (48)    │ C (8)  │   F (rest)  │ end  │
//!   └─────┴────────┴────────┴──────────────┴────────┴─────────────┴──────┘
//!    4 B   alloc     free      alloc         alloc     free        0x1
//!
//!   A = allocated, F = free, end = sentinel header.
//!   Walking from the first header and adding each size lands on the next
//!   header, until the sentinel.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   pheap
//!   ├── align      - Double word rounding (align!)
//!   ├── block      - Header record and its packed word encoding
//!   ├── cursor     - Block list walker (Blocks, BlockRef)
//!   ├── error      - HeapError
//!   ├── heap       - Heap: init, allocate, release, coalesce, verify
//!   ├── region     - Backing store (RegionSource, Mmap) and word access
//!   └── report     - Block table for inspection
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pheap::Heap;
//!
//! fn main() -> Result<(), pheap::HeapError> {
//!     let mut heap = Heap::new();
//!     heap.init(4096)?;
//!
//!     let ptr = heap.allocate(64)?;
//!     unsafe { ptr.as_ptr().write_bytes(0, 64) };
//!
//!     heap.release(ptr.as_ptr())?;
//!     heap.coalesce();
//!     heap.dump();
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! Each block starts with a 4 byte header word. Sizes are multiples of 8,
//! which leaves the low bits free for status:
//!
//! ```text
//!   Header Word:
//!   ┌──────────────────────────────────────────┬──────┬──────┐
//!   │            size (multiple of 8)          │  p   │  a   │
//!   └──────────────────────────────────────────┴──────┴──────┘
//!                                               bit 1  bit 0
//!
//!   a = this block is allocated
//!   p = the block before this one is allocated
//!
//!   Free Block:
//!   ┌────────┬──────────────────────────────────────┬────────┐
//!   │ header │                                      │ footer │
//!   │ size|p │                                      │  size  │
//!   └────────┴──────────────────────────────────────┴────────┘
//!
//!   Allocated Block:
//!   ┌────────┬───────────────────────────────────────────────┐
//!   │ header │              payload (8 B aligned)            │
//!   │size|p|1│                                               │
//!   └────────┴───────────────────────────────────────────────┘
//!             ▲
//!             └── Pointer returned to user
//! ```
//!
//! Allocation is **best fit**: the smallest free block that is large enough
//! wins, unless a block of exactly the right size turns up first. A larger
//! block is split and its tail becomes a new free block.
//!
//! Release only flips status bits. Adjacent free blocks stay separate until
//! [`Heap::coalesce`] is called, typically after an allocation failed with
//! [`HeapError::CapacityExhausted`]:
//!
//! ```text
//!   before:  │ F 16 │ F 24 │ F 32 │ A 8 │
//!   after:   │        F 72        │ A 8 │
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization, `Heap` is neither `Send`
//!   nor `Sync`
//! - **Fixed size**: the region never grows or shrinks after `init`
//! - **Delayed coalescing**: free neighbors merge only on request
//! - **Unix-only**: the default source requires `libc` and `mmap`
//!
//! ## Safety
//!
//! The heap itself is safe to drive; the pointers it hands out are raw, and
//! using them is up to the caller. Custom backing stores implement the
//! unsafe [`RegionSource`] trait.

pub mod align;
mod block;
mod cursor;
mod error;
mod heap;
mod region;
mod report;

pub use block::{HEADER_SIZE, Header};
pub use cursor::{BlockRef, Blocks};
pub use error::{HeapError, Result};
pub use heap::Heap;
pub use region::{Mmap, RegionSource};
pub use report::{BlockReport, Report};
