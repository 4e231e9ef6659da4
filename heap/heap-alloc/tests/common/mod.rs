#![allow(dead_code)]

use heap_alloc::{ArenaPages, FreeBlock, Heap, PAGE_SIZE};
use std::ptr::NonNull;

pub const PAGES: usize = 32;

/// Page-aligned backing store for [`ArenaPages`].
#[repr(C, align(4096))]
pub struct Pool(pub [u8; PAGES * PAGE_SIZE]);

impl Pool {
    pub fn new() -> Box<Self> {
        Box::new(Self([0; PAGES * PAGE_SIZE]))
    }

    pub fn base(&self) -> usize {
        self.0.as_ptr() as usize
    }
}

/// An initialized heap over `pool`.
pub fn heap(pool: &mut Pool) -> Heap<ArenaPages<'_>> {
    let mut heap = Heap::new(ArenaPages::new(&mut pool.0));
    heap.initialize();
    heap
}

pub fn addr(ptr: NonNull<u8>) -> usize {
    ptr.as_ptr() as usize
}

/// Free block sizes sorted by address.
pub fn free_sizes<P: heap_alloc::PageProvider>(heap: &Heap<P>) -> Vec<usize> {
    let mut blocks: Vec<FreeBlock> = heap.free_blocks().collect();
    blocks.sort_by_key(|b| b.addr);
    blocks.into_iter().map(|b| b.size).collect()
}

/// Deterministic xorshift so runs are reproducible without extra crates.
pub struct XorShift(pub u64);

impl XorShift {
    pub fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// A request size in `8..=max`, multiple of 8.
    pub fn size(&mut self, max: usize) -> usize {
        8 * (1 + (self.next() as usize) % (max / 8))
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next() as usize) % (i + 1);
            items.swap(i, j);
        }
    }
}
