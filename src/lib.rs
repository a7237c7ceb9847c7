//! A small user-space memory allocator built directly on page mappings.
//!
//! Memory is requested from the kernel one page ([`PAGE_SIZE`] bytes) at a time
//! for small blocks, or as a dedicated run of pages for large ones. Every block
//! starts with a one word header holding its size, so a pointer is all
//! [`Allocator::release`] needs:
//!
//! ```text
//! +--------+---------------------------+
//! |  size  |          payload          |
//! +--------+---------------------------+
//! ^        ^
//! block    pointer handed to the user
//! ```
//!
//! Released small blocks are kept in an address-ordered free list whose nodes
//! are written inside the free blocks themselves. Neighbouring free blocks are
//! merged on insertion and reused first-fit.
//!
//! ```no_run
//! use pagealloc::Allocator;
//!
//! let mut allocator = Allocator::new();
//!
//! let ptr = allocator.allocate(64).unwrap();
//! unsafe {
//!     ptr.write_bytes(0, 64);
//!     allocator.release(ptr);
//! }
//!
//! allocator.print_stats();
//! ```

mod allocator;
mod block;
mod error;
mod freelist;
mod kernel;
mod page_source;
mod stats;
mod utils;

#[cfg(test)]
mod testing;

pub use allocator::Allocator;
pub use block::{FREE_NODE_SIZE, HEADER_SIZE};
pub use error::AllocError;
pub use freelist::FreeBlocks;
pub use kernel::{Kernel, PlatformMemory};
pub use stats::Stats;

/// Size of a virtual memory page, the unit memory is mapped in.
pub const PAGE_SIZE: usize = 4096;
