use std::{process, ptr::NonNull};

use crate::{PAGE_SIZE, error::AllocError, kernel::PlatformMemory, stats::Counters, utils};

/// Hands out and takes back whole-page regions, keeping the mapping counters
/// up to date.
///
/// A region is created by exactly one [`PageSource::acquire`] and destroyed by
/// exactly one [`PageSource::release`] of the same length. Regions are never
/// split or partially returned.
pub(crate) struct PageSource<M> {
    pub memory: M,
}

impl<M: PlatformMemory> PageSource<M> {
    pub const fn new(memory: M) -> Self {
        Self { memory }
    }

    /// Maps `len` bytes, rounded up to whole pages, of fresh read/write memory.
    pub fn acquire(&mut self, len: usize, counters: &mut Counters) -> Result<NonNull<u8>, AllocError> {
        let len = utils::div_up(len.max(1), PAGE_SIZE)
            .checked_mul(PAGE_SIZE)
            .ok_or(AllocError::SizeOverflow { requested: len })?;

        let Some(addr) = (unsafe { self.memory.request_memory(len) }) else {
            log::debug!("kernel refused to map {len} bytes");
            return Err(AllocError::OutOfMemory { bytes: len });
        };

        counters.pages_mapped += 1;
        counters.bytes_mapped += len;
        log::debug!(
            "mapped {} page(s) at {:p}",
            utils::div_up(len, PAGE_SIZE),
            addr
        );

        Ok(addr)
    }

    /// Unmaps a whole region previously returned by [`PageSource::acquire`].
    ///
    /// If the kernel rejects the request our bookkeeping is already broken,
    /// so the process is aborted.
    ///
    /// **SAFETY**: `addr` and `len` must describe a region from `acquire`
    /// that is not referenced anymore.
    pub unsafe fn release(&mut self, addr: NonNull<u8>, len: usize, counters: &mut Counters) {
        debug_assert_eq!(0, len % PAGE_SIZE);

        if !unsafe { self.memory.return_memory(addr, len) } {
            log::error!("kernel rejected unmapping {len} bytes at {addr:p}");
            process::abort();
        }

        counters.pages_unmapped += 1;
        counters.bytes_unmapped += len;
        log::debug!("unmapped {len} bytes at {addr:p}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ArenaMemory;

    #[test]
    fn acquire_rounds_to_pages() {
        let mut pages = PageSource::new(ArenaMemory::new(8));
        let mut counters = Counters::default();

        let first = pages.acquire(5008, &mut counters).unwrap();
        let second = pages.acquire(1, &mut counters).unwrap();

        assert_eq!(vec![2 * PAGE_SIZE, PAGE_SIZE], pages.memory.requests);
        assert_eq!(first.as_ptr() as usize + 2 * PAGE_SIZE, second.as_ptr() as usize);
        assert_eq!(2, counters.pages_mapped);
        assert_eq!(3 * PAGE_SIZE, counters.bytes_mapped);
    }

    #[test]
    fn acquire_failure_is_out_of_memory() {
        let mut pages = PageSource::new(ArenaMemory::new(1));
        let mut counters = Counters::default();

        assert_eq!(
            Err(AllocError::OutOfMemory { bytes: 2 * PAGE_SIZE }),
            pages.acquire(PAGE_SIZE + 1, &mut counters)
        );
        assert_eq!(0, counters.pages_mapped);
    }

    #[test]
    fn acquire_overflow() {
        let mut pages = PageSource::new(ArenaMemory::new(1));
        let mut counters = Counters::default();

        assert_eq!(
            Err(AllocError::SizeOverflow { requested: usize::MAX }),
            pages.acquire(usize::MAX, &mut counters)
        );
    }

    #[test]
    fn release_counts_once_per_region() {
        let mut pages = PageSource::new(ArenaMemory::new(4));
        let mut counters = Counters::default();

        let addr = pages.acquire(3 * PAGE_SIZE, &mut counters).unwrap();
        unsafe { pages.release(addr, 3 * PAGE_SIZE, &mut counters) };

        assert_eq!(vec![(addr.as_ptr() as usize, 3 * PAGE_SIZE)], pages.memory.returned);
        assert_eq!(1, counters.pages_unmapped);
        assert_eq!(3 * PAGE_SIZE, counters.bytes_unmapped);
    }
}
