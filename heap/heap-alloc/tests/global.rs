//! The process-wide heap is shared state, so everything runs in one test.

use heap_alloc::{HEADER_SIZE, global};

#[test]
fn process_wide_session() {
    let _ = heap_trace::TraceLogger::new(log::LevelFilter::Trace).init();

    global::initialize();
    assert_eq!(global::stats().free_blocks, 0);

    let a = global::allocate(8);
    let b = global::allocate(8);
    let c = global::allocate(8);
    assert_eq!(b.as_ptr() as usize, a.as_ptr() as usize + 8 + HEADER_SIZE);
    assert_eq!(global::stats().live_blocks, 3);

    unsafe {
        global::free(b);
        global::free(a);
        global::free(c);
    }
    let stats = global::stats();
    assert_eq!(stats.live_blocks, 0);
    assert_eq!(stats.free_blocks, 1);
    assert_eq!(stats.free_bytes, stats.region_bytes - HEADER_SIZE);
    global::verify().unwrap();
    global::finalize();

    // a new session starts from scratch
    global::initialize();
    assert_eq!(global::stats().free_blocks, 0);
    assert_eq!(global::stats().regions, 0);
}
