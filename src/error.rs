use std::{error, fmt};

/// Errors returned by [`crate::Allocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The kernel refused to map `bytes` more bytes.
    OutOfMemory { bytes: usize },
    /// `requested` plus the block header can't be represented once rounded
    /// up to a word or to whole pages.
    SizeOverflow { requested: usize },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::OutOfMemory { bytes } => {
                write!(f, "out of memory: could not map {bytes} bytes")
            }
            AllocError::SizeOverflow { requested } => {
                write!(f, "allocation of {requested} bytes overflows the address space")
            }
        }
    }
}

impl error::Error for AllocError {}
