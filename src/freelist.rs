use std::{marker::PhantomData, ptr::NonNull};

use crate::block::{FreeNode, Link, end, start};

/// Address-ordered, singly linked list of free blocks.
///
/// The nodes live inside the free blocks themselves (see [`FreeNode`]), so the
/// list never allocates. Two invariants hold after every operation:
///
/// 1. Nodes are sorted by strictly ascending address.
/// 2. No node ends exactly where the next one begins. Adjacent blocks are
///    always merged into one.
///
/// ```text
///  head
///   |
///   v
/// +------+------+         +------+-----------+        +------+------+
/// | size | next | ------> | size |   next    | -----> | size | None |
/// +------+------+         +------+-----------+        +------+------+
///  0x1000  (48)            0x1040   (4048)             0x3000 (2048)
/// ```
pub(crate) struct FreeList {
    head: Link<FreeNode>,
}

/// Iterator over the `(address, size)` of every free block, in address order.
pub struct FreeBlocks<'a> {
    current: Link<FreeNode>,
    marker: PhantomData<&'a FreeList>,
}

impl FreeList {
    /// Creates a new empty list.
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Number of free blocks. Walks the whole list.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> FreeBlocks<'_> {
        FreeBlocks {
            current: self.head,
            marker: PhantomData,
        }
    }

    /// Inserts `node` keeping the list sorted and merges it with the free
    /// blocks right before and/or right after it.
    ///
    /// Walking from the head, `prev` is the last node below `node` and `cur`
    /// the first one above it. Either of them may be missing: the list can be
    /// empty, `node` can become the new head or the new tail.
    ///
    /// ```text
    ///  prev ends at node  -> prev grows, node is not linked
    ///  node ends at cur   -> node grows and takes cur's place
    ///  both               -> prev grows over node and cur
    ///  neither            -> node is linked between prev and cur
    /// ```
    ///
    /// **SAFETY**: `node` must be a [`FreeNode`] written over a block that this
    /// list doesn't already cover.
    pub unsafe fn insert(&mut self, mut node: NonNull<FreeNode>) {
        let mut prev: Link<FreeNode> = None;
        let mut cur = self.head;

        unsafe {
            while let Some(current) = cur {
                if start(current) > start(node) {
                    break;
                }
                debug_assert!(
                    end(current) <= start(node),
                    "block {:#x} is already free",
                    start(node)
                );
                prev = cur;
                cur = current.as_ref().next;
            }

            debug_assert!(cur.is_none_or(|cur| end(node) <= start(cur)));

            let joins_prev = prev.is_some_and(|prev| end(prev) == start(node));
            let joins_next = cur.is_some_and(|cur| end(node) == start(cur));

            match (prev, cur) {
                (Some(mut prev), Some(cur)) if joins_prev && joins_next => {
                    prev.as_mut().size += node.as_ref().size + cur.as_ref().size;
                    prev.as_mut().next = cur.as_ref().next;
                }
                (Some(mut prev), _) if joins_prev => {
                    prev.as_mut().size += node.as_ref().size;
                }
                (_, Some(cur)) if joins_next => {
                    node.as_mut().size += cur.as_ref().size;
                    node.as_mut().next = cur.as_ref().next;
                    self.link_after(prev, node);
                }
                _ => {
                    node.as_mut().next = cur;
                    self.link_after(prev, node);
                }
            }
        }

        #[cfg(debug_assertions)]
        self.check();
    }

    /// Unlinks and returns the first block, in address order, whose size is
    /// accepted by `fits`.
    pub fn take_first(&mut self, mut fits: impl FnMut(usize) -> bool) -> Link<FreeNode> {
        let mut prev: Link<FreeNode> = None;
        let mut cur = self.head;

        unsafe {
            while let Some(current) = cur {
                let next = current.as_ref().next;

                if fits(current.as_ref().size) {
                    match prev {
                        Some(mut prev) => prev.as_mut().next = next,
                        None => self.head = next,
                    }
                    return Some(current);
                }

                prev = cur;
                cur = next;
            }
        }

        None
    }

    /// Makes `node` the successor of `prev`, or the new head if there is no
    /// `prev`.
    unsafe fn link_after(&mut self, prev: Link<FreeNode>, node: NonNull<FreeNode>) {
        match prev {
            Some(mut prev) => unsafe { prev.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
    }

    /// Panics if the list is out of order or holds two adjacent blocks.
    #[cfg(any(test, debug_assertions))]
    pub fn check(&self) {
        let mut last_end = None;

        for (addr, size) in self.iter() {
            if let Some(last_end) = last_end {
                assert!(
                    last_end < addr,
                    "free list out of order or uncoalesced at {addr:#x}"
                );
            }
            last_end = Some(addr + size);
        }
    }
}

impl<'a> Iterator for FreeBlocks<'a> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;

        unsafe {
            self.current = node.as_ref().next;

            Some((start(node), node.as_ref().size))
        }
    }
}

impl<'a> IntoIterator for &'a FreeList {
    type Item = (usize, usize);
    type IntoIter = FreeBlocks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
