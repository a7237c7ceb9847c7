//! This file contains the helper functions for the allocator. These are functions
//! that don't particularly belong to any concrete module of the program.

/// It aligns `to_be_aligned` using `aligment`, which must be a power of two.
///
/// This is used to round block sizes up to the machine word and large
/// requests up to a whole number of [`crate::PAGE_SIZE`] pages.
/// Returns `None` if the rounded value doesn't fit in a `usize`.
#[inline]
pub fn align(to_be_aligned: usize, aligment: usize) -> Option<usize> {
    debug_assert!(aligment.is_power_of_two());

    to_be_aligned
        .checked_add(aligment - 1)
        .map(|size| size & !(aligment - 1))
}

/// Number of `unit` sized chunks needed to cover `len` bytes.
#[inline]
pub fn div_up(len: usize, unit: usize) -> usize {
    len.div_ceil(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn align_pointer_size() {
        let aligments = vec![(1..8, 8), (9..16, 16), (17..24, 24), (25..32, 32)];

        for (sizes, expected) in aligments {
            for size in sizes {
                assert_eq!(Some(expected), align(size, mem::size_of::<usize>()));
            }
        }
    }

    #[test]
    fn align_page_size() {
        let aligments = vec![(1..4096, 4096), (4097..8192, 8192)];

        for (sizes, expected) in aligments {
            for size in sizes {
                assert_eq!(Some(expected), align(size, 4096))
            }
        }
    }

    #[test]
    fn align_overflow() {
        assert_eq!(None, align(usize::MAX - 2, 4096));
        assert_eq!(Some(0), align(0, 4096));
    }

    #[test]
    fn pages_needed() {
        assert_eq!(2, div_up(5008, 4096));
        assert_eq!(1, div_up(4096, 4096));
        assert_eq!(3, div_up(8193, 4096));
    }
}
