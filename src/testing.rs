//! In-process memory backend for tests.

use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

use crate::{PAGE_SIZE, kernel::PlatformMemory};

/// Gives out consecutive pages of one page-aligned buffer, so regions obtained
/// one after the other are adjacent and addresses are predictable.
///
/// Returned regions are only recorded, never reused.
pub(crate) struct ArenaMemory {
    base: NonNull<u8>,
    layout: Layout,
    used: usize,
    /// Length of every successful request, in order.
    pub requests: Vec<usize>,
    /// `(address, length)` of every region returned, in order.
    pub returned: Vec<(usize, usize)>,
}

impl ArenaMemory {
    pub fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).unwrap();
        let base = NonNull::new(unsafe { alloc::alloc_zeroed(layout) }).unwrap();

        Self {
            base,
            layout,
            used: 0,
            requests: Vec::new(),
            returned: Vec::new(),
        }
    }

    /// Address of the arena byte at `offset`.
    pub fn addr(&self, offset: usize) -> usize {
        self.base.as_ptr() as usize + offset
    }
}

impl PlatformMemory for ArenaMemory {
    unsafe fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
        if self.used + len > self.layout.size() {
            return None;
        }

        let addr = unsafe { self.base.add(self.used) };
        self.used += len;
        self.requests.push(len);

        Some(addr)
    }

    unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) -> bool {
        self.returned.push((addr.as_ptr() as usize, len));
        true
    }
}

impl Drop for ArenaMemory {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}
