use std::ptr::NonNull;

/// This trait provides an abstraction to handle low level memory operations
/// and syscalls. The allocator, our top level view of this, has nothing to do
/// with the concrete implementations / APIs offered by each kernel.
pub trait PlatformMemory {
    /// Request a memory region of size `len`, readable and writable. It returns
    /// a pointer to the given location or `None` if the underlying syscall fails.
    ///
    /// **SAFETY**: `len` must be a non-zero multiple of [`crate::PAGE_SIZE`].
    unsafe fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>>;

    /// Returns the memory of size `len` starting from `addr` back to the kernel.
    /// It returns `false` if the kernel rejected the request.
    ///
    /// **SAFETY**: `addr` and `len` must describe exactly one region previously
    /// obtained from [`PlatformMemory::request_memory`] and never used again.
    unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) -> bool;
}

/// The operating system's virtual memory, the default backend of
/// [`crate::Allocator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Kernel;

#[cfg(unix)]
mod unix {
    use super::{Kernel, PlatformMemory};

    use libc::{mmap, munmap, off_t, size_t};

    use std::{
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    impl PlatformMemory for Kernel {
        unsafe fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            unsafe {
                let addr = mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET);

                if addr == libc::MAP_FAILED {
                    return None;
                }

                NonNull::new(addr.cast::<u8>())
            }
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) -> bool {
            unsafe { munmap(addr.as_ptr().cast::<c_void>(), len as size_t) == 0 }
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::{os::raw::c_void, ptr::NonNull};

    use super::{Kernel, PlatformMemory};

    use windows::Win32::System::Memory;

    impl PlatformMemory for Kernel {
        unsafe fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            // Read-Write only.
            let protection = Memory::PAGE_READWRITE;

            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, _len: usize) -> bool {
            // MEM_RELEASE always frees the whole reservation, the size must be 0.
            unsafe {
                Memory::VirtualFree(addr.as_ptr().cast::<c_void>(), 0, Memory::MEM_RELEASE).is_ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PAGE_SIZE;

    #[test]
    fn request_and_return_pages() {
        let mut kernel = Kernel;

        unsafe {
            let addr = kernel.request_memory(2 * PAGE_SIZE).unwrap();
            assert_eq!(0, addr.as_ptr() as usize % PAGE_SIZE);

            // Both pages are writable.
            addr.write(7);
            addr.add(2 * PAGE_SIZE - 1).write(9);
            assert_eq!(7, addr.read());
            assert_eq!(9, addr.add(2 * PAGE_SIZE - 1).read());

            assert!(kernel.return_memory(addr, 2 * PAGE_SIZE));
        }
    }
}
