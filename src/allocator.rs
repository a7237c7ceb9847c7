use std::{cmp, ptr::NonNull};

use crate::{
    PAGE_SIZE,
    block::{FREE_NODE_SIZE, FreeNode, HEADER_SIZE, Header},
    error::AllocError,
    freelist::{FreeBlocks, FreeList},
    kernel::{Kernel, PlatformMemory},
    page_source::PageSource,
    stats::{Counters, Stats},
    utils::align,
};

/// Free-list allocator on top of page mappings.
///
/// Requests are split in two classes by the size of the block they need
/// (request plus a one word header):
///
/// - **Small** (`< PAGE_SIZE`): carved out of single pages. Released blocks go
///   back to an address-ordered [`FreeList`] where neighbours are coalesced,
///   and are reused first-fit. Small pages are never returned to the kernel.
/// - **Large** (`>= PAGE_SIZE`): get their own mapping of whole pages, which is
///   unmapped as soon as the block is released.
///
/// ```text
///               small                                    large
/// +--------+-------------+--------------+     +--------+--------------------------+
/// | Header |   payload   |  FreeNode..  |     | Header |   payload (n pages)      |
/// +--------+-------------+--------------+     +--------+--------------------------+
///          ^              \ remainder on            ^
///          |                the free list           |
///     returned pointer                         returned pointer
/// ```
///
/// There is no locking of any kind: an `Allocator` is meant to be used from
/// one thread, and holding raw pointers makes it neither `Send` nor `Sync`.
/// Dropping it doesn't unmap anything; memory still mapped stays with the
/// process until it exits.
pub struct Allocator<M: PlatformMemory = Kernel> {
    free_list: FreeList,
    pages: PageSource<M>,
    counters: Counters,
}

impl Allocator<Kernel> {
    /// Creates an allocator that maps its memory from the operating system.
    pub const fn new() -> Self {
        Self::with_memory(Kernel)
    }
}

impl Default for Allocator<Kernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: PlatformMemory> Allocator<M> {
    /// Creates an allocator with an empty free list and zeroed counters that
    /// maps its pages from `memory`.
    pub const fn with_memory(memory: M) -> Self {
        Self {
            free_list: FreeList::new(),
            pages: PageSource::new(memory),
            counters: Counters {
                pages_mapped: 0,
                pages_unmapped: 0,
                bytes_mapped: 0,
                bytes_unmapped: 0,
                chunks_allocated: 0,
                chunks_freed: 0,
            },
        }
    }

    /// Allocates at least `size` bytes and returns a word-aligned pointer to
    /// them. The memory is not initialized.
    ///
    /// Fails if `size` is too big to be represented once the header is added,
    /// or if the kernel can't map more pages.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.counters.chunks_allocated += 1;

        let need = block_size(size)?;

        if need < PAGE_SIZE {
            self.allocate_small(need)
        } else {
            self.allocate_large(size, need)
        }
    }

    /// Gives back a pointer obtained from [`Allocator::allocate`].
    ///
    /// Small blocks go back to the free list, large ones are unmapped.
    ///
    /// **SAFETY**: `ptr` must come from `allocate` on this same allocator and
    /// must not have been released already. Neither condition is checked.
    pub unsafe fn release(&mut self, ptr: NonNull<u8>) {
        self.counters.chunks_freed += 1;

        unsafe {
            let header = Header::from_payload(ptr);
            let size = header.as_ref().size;

            if size < PAGE_SIZE {
                log::trace!("release {size} bytes at {header:p} to the free list");
                let node = FreeNode::write(header.cast(), size);
                self.free_list.insert(node);
            } else {
                log::trace!("release {size} byte region at {header:p}");
                self.pages.release(header.cast(), size, &mut self.counters);
            }
        }
    }

    /// Takes a snapshot of the counters. The free list length is computed now.
    pub fn stats(&self) -> Stats {
        self.counters.snapshot(self.free_list.len())
    }

    /// Writes [`Allocator::stats`] to stderr.
    pub fn print_stats(&self) {
        eprintln!("\n{}", self.stats());
    }

    /// Address and size, header included, of every free block in address order.
    pub fn free_blocks(&self) -> FreeBlocks<'_> {
        self.free_list.iter()
    }

    /// The backend pages are mapped from.
    pub fn memory(&self) -> &M {
        &self.pages.memory
    }

    fn allocate_small(&mut self, need: usize) -> Result<NonNull<u8>, AllocError> {
        // A free block that spans two adjacent mappings can be a page or more
        // long. Handing it out whole would make it look like a large region on
        // release, so it is only taken when it will be split.
        let fits = |size: usize| size >= need && (size < PAGE_SIZE || size - need >= FREE_NODE_SIZE);

        let (block, size) = match self.free_list.take_first(fits) {
            Some(node) => {
                let size = unsafe { node.as_ref().size };
                log::trace!("reuse free block of {size} bytes at {node:p} for {need} bytes");
                (node.cast::<u8>(), size)
            }
            None => {
                let page = self.pages.acquire(PAGE_SIZE, &mut self.counters)?;
                log::trace!("fresh page at {page:p} for {need} bytes");
                (page, PAGE_SIZE)
            }
        };

        let mut recorded = size;

        if size - need >= FREE_NODE_SIZE {
            unsafe {
                let rest = FreeNode::write(block.add(need), size - need);
                log::trace!("split {size} bytes, {} bytes back to the free list", size - need);
                self.free_list.insert(rest);
            }
            recorded = need;
        }

        Ok(unsafe { Header::write(block, recorded) })
    }

    fn allocate_large(&mut self, size: usize, need: usize) -> Result<NonNull<u8>, AllocError> {
        let len = align(need, PAGE_SIZE).ok_or(AllocError::SizeOverflow { requested: size })?;
        let region = self.pages.acquire(len, &mut self.counters)?;
        log::trace!("large region of {len} bytes at {region:p}");

        Ok(unsafe { Header::write(region, len) })
    }
}

/// Size of the block that serves a `size` bytes request: header included,
/// rounded up to a word and never smaller than a [`FreeNode`].
fn block_size(size: usize) -> Result<usize, AllocError> {
    let need = size
        .checked_add(HEADER_SIZE)
        .and_then(|need| align(need, HEADER_SIZE))
        .ok_or(AllocError::SizeOverflow { requested: size })?;

    Ok(cmp::max(need, FREE_NODE_SIZE))
}
