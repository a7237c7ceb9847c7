use std::fmt;

/// Running totals kept by an [`crate::Allocator`]. They only ever grow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Counters {
    /// One per successful mapping call, whatever its length.
    pub pages_mapped: usize,
    /// One per unmapping call.
    pub pages_unmapped: usize,
    pub bytes_mapped: usize,
    pub bytes_unmapped: usize,
    pub chunks_allocated: usize,
    pub chunks_freed: usize,
}

/// Snapshot of the allocator counters, returned by [`crate::Allocator::stats`].
///
/// `free_length` is not a counter: it is computed by walking the free list
/// when the snapshot is taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub pages_mapped: usize,
    pub pages_unmapped: usize,
    pub chunks_allocated: usize,
    pub chunks_freed: usize,
    pub free_length: usize,
    /// Total bytes obtained from the kernel.
    pub bytes_mapped: usize,
    /// Total bytes given back to the kernel.
    pub bytes_unmapped: usize,
}

impl Counters {
    pub fn snapshot(&self, free_length: usize) -> Stats {
        Stats {
            pages_mapped: self.pages_mapped,
            pages_unmapped: self.pages_unmapped,
            chunks_allocated: self.chunks_allocated,
            chunks_freed: self.chunks_freed,
            free_length,
            bytes_mapped: self.bytes_mapped,
            bytes_unmapped: self.bytes_unmapped,
        }
    }
}

impl Stats {
    /// Bytes currently mapped, either on the free list or handed out.
    pub fn bytes_in_use(&self) -> usize {
        self.bytes_mapped - self.bytes_unmapped
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== pagealloc stats ==")?;
        writeln!(f, "Mapped:   {}", self.pages_mapped)?;
        writeln!(f, "Unmapped: {}", self.pages_unmapped)?;
        writeln!(f, "Allocs:   {}", self.chunks_allocated)?;
        writeln!(f, "Frees:    {}", self.chunks_freed)?;
        write!(f, "Freelen:  {}", self.free_length)
    }
}
