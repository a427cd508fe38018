use std::fmt;

use crate::cursor::BlockRef;

/// One row of the block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReport {
  pub allocated: bool,
  pub prev_allocated: bool,
  /// Address of the header.
  pub begin: usize,
  /// Address of the last byte of the block.
  pub end: usize,
  pub size: usize,
}

/// Snapshot of the block list, for inspection only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
  /// Address of the first block header.
  pub start: usize,
  pub blocks: Vec<BlockReport>,
  pub used: usize,
  pub free: usize,
}

impl Report {
  pub fn new(
    start: usize,
    blocks: impl Iterator<Item = BlockRef>,
  ) -> Self {
    let mut report = Self {
      start,
      ..Self::default()
    };

    for block in blocks {
      let begin = start + block.offset;

      if block.header.allocated {
        report.used += block.size();
      } else {
        report.free += block.size();
      }

      report.blocks.push(BlockReport {
        allocated: block.header.allocated,
        prev_allocated: block.header.prev_allocated,
        begin,
        end: begin + block.size() - 1,
        size: block.size(),
      });
    }

    report
  }

  pub fn total(&self) -> usize {
    self.used + self.free
  }
}

fn status(allocated: bool) -> &'static str {
  if allocated { "alloc" } else { "FREE " }
}

impl fmt::Display for Report {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let rule = "-".repeat(81);

    writeln!(f, "{:*^81}", " Block List ")?;
    writeln!(f, "No.\tStatus\tPrev\tBegin\t\tEnd\t\tSize")?;
    writeln!(f, "{rule}")?;

    for (i, block) in self.blocks.iter().enumerate() {
      writeln!(
        f,
        "{}\t{}\t{}\t{:#010x}\t{:#010x}\t{:4}",
        i + 1,
        status(block.allocated),
        status(block.prev_allocated),
        block.begin,
        block.end,
        block.size
      )?;
    }

    writeln!(f, "{rule}")?;
    writeln!(f, "Total used size = {:4}", self.used)?;
    writeln!(f, "Total free size = {:4}", self.free)?;
    write!(f, "Total size      = {:4}", self.total())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Heap;

  #[test]
  fn test_report_totals() {
    let mut heap = Heap::new();
    heap.init(4096).unwrap();

    let a = heap.allocate(12).unwrap();
    heap.allocate(100).unwrap();
    heap.release(a.as_ptr()).unwrap();

    let report = heap.report();

    assert_eq!(report.blocks.len(), 3);
    assert_eq!(report.used, 104);
    assert_eq!(report.free, heap.capacity() - 104);
    assert_eq!(report.total(), heap.capacity());
  }

  #[test]
  fn test_report_rows() {
    let mut heap = Heap::new();
    heap.init(4096).unwrap();

    let a = heap.allocate(12).unwrap();
    let report = heap.report();
    let first = report.blocks[0];
    let second = report.blocks[1];

    assert_eq!(first.begin + 4, a.as_ptr() as usize);
    assert_eq!(first.end, first.begin + 15);
    assert!(first.allocated && first.prev_allocated);
    assert_eq!(second.begin, first.end + 1);
    assert!(!second.allocated && second.prev_allocated);
    assert_eq!(second.size, heap.capacity() - 16);
  }

  #[test]
  fn test_report_uninitialized() {
    let report = Heap::new().report();

    assert!(report.blocks.is_empty());
    assert_eq!(report.total(), 0);
  }

  #[test]
  fn test_display() {
    let mut heap = Heap::new();
    heap.init(4096).unwrap();
    heap.allocate(12).unwrap();

    let text = heap.report().to_string();
    let rows: Vec<_> = text.lines().filter(|l| l.starts_with(char::is_numeric)).collect();

    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("1\talloc\talloc\t0x"));
    assert!(rows[1].starts_with("2\tFREE \talloc\t0x"));
    assert!(text.ends_with(&format!("Total size      = {:4}", heap.capacity())));
  }
}
