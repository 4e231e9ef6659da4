use crate::block::{BlockHeader, Link};
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Unordered, intrusive, doubly-linked list of free blocks.
///
/// # Invariants
/// - `sentinel` is not a block; the first free block is `sentinel.next`.
/// - `sentinel.prev` is always `None`.
/// - For every member `a` with `a.next == Some(b)`: `b.prev == Some(a)`.
/// - The first member's `prev` points at the sentinel. Because the list may
///   move together with its owner, that link is refreshed by every mutating
///   primitive before it is relied upon.
pub(crate) struct FreeList {
    sentinel: BlockHeader,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self {
            sentinel: BlockHeader::new(0),
        }
    }

    /// Forget all members.
    pub(crate) const fn reset(&mut self) {
        self.sentinel = BlockHeader::new(0);
    }

    #[cfg(test)]
    pub(crate) const fn is_empty(&self) -> bool {
        self.sentinel.next.is_none()
    }

    pub(crate) const fn sentinel_prev(&self) -> Link {
        self.sentinel.prev
    }

    pub(crate) fn sentinel_addr(&self) -> usize {
        self.sentinel.start()
    }

    /// Point the first member back at the sentinel's current address and
    /// return that address.
    fn anchor(&mut self) -> NonNull<BlockHeader> {
        let sentinel = NonNull::from(&mut self.sentinel);
        // Safety: list members are live headers owned by the heap.
        unsafe {
            if let Some(mut first) = (*sentinel.as_ptr()).next {
                first.as_mut().prev = Some(sentinel);
            }
        }
        sentinel
    }

    /// Push `block` right after the sentinel.
    ///
    /// # Safety
    /// `block` must be a valid header owned by the heap and not on the list.
    pub(crate) unsafe fn insert(&mut self, mut block: NonNull<BlockHeader>) {
        let mut sentinel = self.anchor();
        unsafe {
            let first = sentinel.as_ref().next;
            let node = block.as_mut();
            node.next = first;
            node.prev = Some(sentinel);
            if let Some(mut first) = first {
                first.as_mut().prev = Some(block);
            }
            sentinel.as_mut().next = Some(block);
        }
    }

    /// Unlink `block` and clear its links.
    ///
    /// # Safety
    /// `block` must currently be on this list.
    pub(crate) unsafe fn remove(&mut self, mut block: NonNull<BlockHeader>) {
        self.anchor();
        unsafe {
            let (prev, next) = {
                let node = block.as_ref();
                (node.prev, node.next)
            };
            if let Some(mut prev) = prev {
                prev.as_mut().next = next;
            }
            if let Some(mut next) = next {
                next.as_mut().prev = prev;
            }
            let node = block.as_mut();
            node.next = None;
            node.prev = None;
        }
    }

    pub(crate) const fn iter(&self) -> Iter<'_> {
        Iter {
            cursor: self.sentinel.next,
            _list: PhantomData,
        }
    }
}

/// Walks the list front to back.
pub(crate) struct Iter<'a> {
    cursor: Link,
    _list: PhantomData<&'a FreeList>,
}

impl Iterator for Iter<'_> {
    type Item = NonNull<BlockHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.cursor?;
        // Safety: list members are live headers owned by the heap.
        self.cursor = unsafe { block.as_ref().next };
        Some(block)
    }
}
