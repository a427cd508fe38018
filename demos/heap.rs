use pheap::{Heap, HeapError};

fn main() -> Result<(), HeapError> {
  env_logger::init();

  let mut heap = Heap::new();
  heap.init(4096)?;
  heap.dump();

  // --------------------------------------------------------------------
  // 1) Allocate growing payloads until the heap runs out.
  // --------------------------------------------------------------------
  let mut taken = Vec::new();
  for size in 1..200 {
    match heap.allocate(size) {
      Ok(ptr) => taken.push(ptr),
      Err(HeapError::CapacityExhausted { required }) => {
        println!("\n[1] Out of space after {} allocations, needed {} bytes", taken.len(), required);
        break;
      }
      Err(err) => return Err(err),
    }
  }
  heap.dump();

  // --------------------------------------------------------------------
  // 2) Release every other block. Free blocks stay separate.
  // --------------------------------------------------------------------
  for ptr in taken.iter().step_by(2) {
    heap.release(ptr.as_ptr())?;
  }
  println!("\n[2] Released every other block");
  heap.dump();

  // --------------------------------------------------------------------
  // 3) Release the rest, then merge the free runs.
  // --------------------------------------------------------------------
  for ptr in taken.iter().skip(1).step_by(2) {
    heap.release(ptr.as_ptr())?;
  }
  let large = heap.capacity() / 2;
  println!("\n[3] Allocating {} bytes before coalescing: {:?}", large, heap.allocate(large).err());
  println!("[3] Coalesced: {}", heap.coalesce());
  println!("[3] Allocating {} bytes after coalescing: {:?}", large, heap.allocate(large).map(|_| ()));
  heap.dump();

  heap.verify()
}
