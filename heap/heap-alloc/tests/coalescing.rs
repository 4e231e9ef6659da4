mod common;

use common::{Pool, addr, free_sizes, heap};
use heap_alloc::{HEADER_SIZE, PAGE_SIZE};

/// Region payload left after the three 8-byte blocks A, B, C.
const TAIL: usize = PAGE_SIZE - 4 * HEADER_SIZE - 3 * 8;

#[test]
fn freeing_three_adjacent_blocks_merges_step_by_step() {
    let mut pool = Pool::new();
    let base = pool.base();
    let mut heap = heap(&mut pool);

    let a = heap.allocate(8);
    let b = heap.allocate(8);
    let c = heap.allocate(8);
    assert_eq!(free_sizes(&heap), [TAIL]);

    // B has allocated neighbours on both sides
    unsafe { heap.free(b) };
    assert_eq!(free_sizes(&heap), [8, TAIL]);

    // A absorbs B
    unsafe { heap.free(a) };
    assert_eq!(free_sizes(&heap), [8 + HEADER_SIZE + 8, TAIL]);

    // C bridges A+B and the tail: one block spanning the region
    unsafe { heap.free(c) };
    let blocks: Vec<_> = heap.free_blocks().collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].addr, base);
    assert_eq!(blocks[0].size, PAGE_SIZE - HEADER_SIZE);
    heap.verify().unwrap();
}

#[test]
fn right_neighbour_is_absorbed() {
    let mut pool = Pool::new();
    let mut heap = heap(&mut pool);

    let a = heap.allocate(8);
    let b = heap.allocate(8);
    let _c = heap.allocate(8);

    unsafe { heap.free(b) };
    unsafe { heap.free(a) };
    let merged = heap.free_blocks().find(|blk| blk.size == 8 + HEADER_SIZE + 8);
    assert_eq!(merged.map(|blk| blk.addr), Some(addr(a) - HEADER_SIZE));
    assert_eq!(heap.stats().free_blocks, 2);
}

#[test]
fn left_neighbour_absorbs_the_freed_block() {
    let mut pool = Pool::new();
    let mut heap = heap(&mut pool);

    let a = heap.allocate(16);
    let b = heap.allocate(16);
    let _c = heap.allocate(8);

    unsafe { heap.free(a) };
    unsafe { heap.free(b) };
    assert_eq!(
        free_sizes(&heap),
        [16 + HEADER_SIZE + 16, PAGE_SIZE - 4 * HEADER_SIZE - 40]
    );
    // the survivor is A's header; B's identity is gone
    assert!(heap.free_blocks().any(|blk| blk.addr == addr(a) - HEADER_SIZE));
    assert!(!heap.free_blocks().any(|blk| blk.addr == addr(b) - HEADER_SIZE));
}

#[test]
fn merged_block_is_reused_whole() {
    let mut pool = Pool::new();
    let mut heap = heap(&mut pool);

    let a = heap.allocate(32);
    let b = heap.allocate(32);
    let _guard = heap.allocate(8);
    unsafe {
        heap.free(a);
        heap.free(b);
    }
    // 32 + header + 32 bytes are contiguous again
    assert_eq!(heap.allocate(32 + HEADER_SIZE + 32), a);
    assert_eq!(heap.stats().regions, 1);
}

#[test]
fn blocks_merge_across_contiguous_regions() {
    let mut pool = Pool::new();
    let base = pool.base();
    let mut heap = heap(&mut pool);

    // fill the first page exactly
    let first = heap.allocate(PAGE_SIZE - HEADER_SIZE);
    assert!(heap.free_blocks().next().is_none());

    // the arena hands out the next page right behind it
    let second = heap.allocate(8);
    assert_eq!(addr(second), base + PAGE_SIZE + HEADER_SIZE);

    unsafe {
        heap.free(second);
        heap.free(first);
    }
    let blocks: Vec<_> = heap.free_blocks().collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].size, 2 * PAGE_SIZE - HEADER_SIZE);
    heap.verify().unwrap();
}
