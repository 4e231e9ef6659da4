mod common;

use common::{Pool, addr, heap};
use heap_alloc::{ArenaPages, HEADER_SIZE, Heap, HeapStats, PAGE_SIZE};

#[test]
fn fresh_heap_is_empty() {
    let mut pool = Pool::new();
    let heap = heap(&mut pool);
    assert_eq!(heap.stats(), HeapStats::default());
    assert_eq!(heap.free_blocks().count(), 0);
    heap.verify().unwrap();
}

#[test]
fn initialize_twice_is_harmless() {
    let mut pool = Pool::new();
    let mut heap = Heap::new(ArenaPages::new(&mut pool.0));
    heap.initialize();
    heap.initialize();
    assert_eq!(heap.stats(), HeapStats::default());
    let _p = heap.allocate(8);
    assert_eq!(heap.stats().regions, 1);
}

#[test]
fn reinitialize_empties_the_free_list() {
    let mut pool = Pool::new();
    let mut heap = heap(&mut pool);

    let a = heap.allocate(64);
    let _b = heap.allocate(64);
    unsafe { heap.free(a) };
    assert_eq!(heap.stats().free_blocks, 2);

    heap.initialize();
    assert_eq!(heap.stats(), HeapStats::default());
    assert_eq!(heap.free_blocks().count(), 0);

    // abandoned pages stay with the heap's provider; new work takes fresh ones
    let c = heap.allocate(64);
    assert_eq!(addr(c) % PAGE_SIZE, HEADER_SIZE);
    assert_eq!(heap.pages().acquired(), 2 * PAGE_SIZE);
}

#[test]
fn finalize_changes_nothing() {
    let mut pool = Pool::new();
    let mut heap = heap(&mut pool);
    let p = heap.allocate(128);
    let before = heap.stats();

    heap.finalize();
    assert_eq!(heap.stats(), before);

    // still usable afterwards
    unsafe { heap.free(p) };
    assert_eq!(heap.stats().live_blocks, 0);
}

#[test]
fn heap_can_move_between_calls() {
    let mut pool = Pool::new();
    let mut heap = heap(&mut pool);
    let a = heap.allocate(16);
    let b = heap.allocate(16);
    unsafe { heap.free(a) };

    // the sentinel moves with the heap; the first block's back-link goes stale
    let mut moved = Box::new(heap);
    moved.verify().unwrap();
    unsafe { moved.free(b) };
    let c = moved.allocate(16);
    assert_eq!(c, a);
    moved.verify().unwrap();
    assert_eq!(moved.stats().live_blocks, 1);
}
