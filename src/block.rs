use std::{mem, ptr::NonNull};

/// Non-null pointer to `T`.
pub(crate) type Link<T> = Option<NonNull<T>>;

/// Size of the header that precedes every block: a single machine word.
pub const HEADER_SIZE: usize = mem::size_of::<Header>();

/// Size of a [`FreeNode`]. A block smaller than this could not be put back
/// on the free list, so it is also the minimum block size.
pub const FREE_NODE_SIZE: usize = mem::size_of::<FreeNode>();

/// Every block starts with a header recording its size, header included.
/// The pointer given to the user is right after it.
///
/// ```text
/// +---------------------+ <------+ block address
/// |        size         |        | -> Header (one word)
/// +---------------------+ <------+ pointer returned to the user
/// |       Content       |        |
/// |         ...         |        | -> size - HEADER_SIZE bytes
/// |                     |        |
/// +---------------------+ <------+ block address + size
/// ```
#[repr(C)]
pub(crate) struct Header {
    /// Size of the block, including this header.
    pub size: usize,
}

/// The free-state view of a block. It is written over the first bytes of the
/// block itself, so keeping a block on the free list costs no extra memory.
///
/// ```text
/// +---------------------+ <------+
/// |        size         |        | -> same word as Header::size
/// +---------------------+        |
/// |        next         |        | -> overwrites the first payload word
/// +---------------------+ <------+
/// |   unused payload    |
/// |         ...         |
/// +---------------------+
/// ```
#[repr(C)]
pub(crate) struct FreeNode {
    /// Size of the block, including its header.
    pub size: usize,
    /// Next free block, at a higher address.
    pub next: Link<FreeNode>,
}

impl Header {
    /// Writes a header of `size` bytes at `addr` and returns the pointer that
    /// is handed to the user.
    ///
    /// **SAFETY**: `addr` must be word aligned and valid for `size` bytes.
    pub unsafe fn write(addr: NonNull<u8>, size: usize) -> NonNull<u8> {
        unsafe {
            addr.cast::<Header>().write(Header { size });
            addr.add(HEADER_SIZE)
        }
    }

    /// Steps back from a user pointer to the header of its block.
    ///
    /// **SAFETY**: `payload` must have been returned by [`Header::write`].
    pub unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<Header> {
        unsafe { payload.sub(HEADER_SIZE).cast() }
    }
}

impl FreeNode {
    /// Turns the block at `addr` into an unlinked free node of `size` bytes.
    ///
    /// **SAFETY**: `addr` must be word aligned, valid for `size` bytes and
    /// `size >= FREE_NODE_SIZE`.
    pub unsafe fn write(addr: NonNull<u8>, size: usize) -> NonNull<FreeNode> {
        debug_assert!(size >= FREE_NODE_SIZE);

        let node = addr.cast::<FreeNode>();
        unsafe { node.write(FreeNode { size, next: None }) };
        node
    }
}

/// Start address of a block.
#[inline]
pub(crate) fn start<T>(block: NonNull<T>) -> usize {
    block.as_ptr() as usize
}

/// First address past the end of a free block.
///
/// **SAFETY**: `node` must point to a live free node.
#[inline]
pub(crate) unsafe fn end(node: NonNull<FreeNode>) -> usize {
    unsafe { start(node) + node.as_ref().size }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_one_word() {
        assert_eq!(mem::size_of::<usize>(), HEADER_SIZE);
        assert_eq!(2 * HEADER_SIZE, FREE_NODE_SIZE);
    }

    #[test]
    fn header_round_trip_offsets() {
        let mut buf = [0usize; 8];
        let addr = NonNull::new(buf.as_mut_ptr()).unwrap().cast::<u8>();

        unsafe {
            let payload = Header::write(addr, 48);
            assert_eq!(start(addr) + HEADER_SIZE, start(payload));

            let header = Header::from_payload(payload);
            assert_eq!(addr.cast::<Header>(), header);
            assert_eq!(48, header.as_ref().size);
        }
    }

    #[test]
    fn free_node_shares_size_word() {
        let mut buf = [0usize; 8];
        let addr = NonNull::new(buf.as_mut_ptr()).unwrap().cast::<u8>();

        unsafe {
            Header::write(addr, 64);
            let node = FreeNode::write(addr, 64);
            assert_eq!(64, node.as_ref().size);
            assert!(node.as_ref().next.is_none());
            assert_eq!(start(addr) + 64, end(node));
        }
    }
}
