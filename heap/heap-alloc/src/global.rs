//! # Process-wide heap
//!
//! One [`Heap`] over [`SystemPages`], guarded by a [`HeapLock`], plus free
//! functions mirroring the heap's surface and a [`GlobalAlloc`] adapter.
//!
//! The heap is initialized lazily on first use unless [`initialize`] is called
//! explicitly. Calling [`initialize`] later starts a new session and abandons
//! every block handed out before.

use crate::{ALIGNMENT, Heap, HeapLock, HeapStats, IntegrityError, round_request};
use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{NonNull, null_mut};
use core::sync::atomic::{AtomicBool, Ordering};
use heap_pages::SystemPages;
use std::alloc::System;

/// Process-wide heap state.
static HEAP: HeapLock<Heap<SystemPages>> = HeapLock::new(Heap::new(SystemPages::new()));

/// Set once the heap has been initialized.
static DID_INIT: AtomicBool = AtomicBool::new(false);

/// Initialize the heap if nobody did yet.
fn ensure_init() {
    if !DID_INIT.load(Ordering::Acquire) {
        HEAP.with_lock(|heap| {
            if !DID_INIT.load(Ordering::Relaxed) {
                heap.initialize();
                DID_INIT.store(true, Ordering::Release);
            }
        });
    }
}

/// Start a session with an empty free-list.
pub fn initialize() {
    HEAP.with_lock(|heap| {
        heap.initialize();
        DID_INIT.store(true, Ordering::Release);
    });
}

/// Allocate `size` bytes from the process-wide heap.
///
/// # Panics
/// If the system cannot supply pages.
#[must_use]
pub fn allocate(size: usize) -> NonNull<u8> {
    ensure_init();
    HEAP.with_lock(|heap| heap.allocate(size))
}

/// Return a block to the process-wide heap.
///
/// # Safety
/// `ptr` must come from [`allocate`] and must not have been freed since.
pub unsafe fn free(ptr: NonNull<u8>) {
    ensure_init();
    HEAP.with_lock(|heap| unsafe { heap.free(ptr) });
}

/// End the session. Nothing is reclaimed.
pub fn finalize() {
    HEAP.with_lock(|heap| heap.finalize());
}

#[must_use]
pub fn stats() -> HeapStats {
    HEAP.with_lock(|heap| heap.stats())
}

/// See [`Heap::verify`].
///
/// # Errors
/// The first broken free-list invariant.
pub fn verify() -> Result<(), IntegrityError> {
    HEAP.with_lock(|heap| heap.verify())
}

/// [`GlobalAlloc`] front end for the process-wide heap.
///
/// Requests aligned to at most [`ALIGNMENT`] are rounded up to a multiple of
/// it and served by the heap. Wider alignments are passed through to
/// [`System`]; `dealloc` routes by the same rule, so each block goes back to
/// where it came from.
///
/// ```rust,ignore
/// #[global_allocator]
/// static GLOBAL: heap_alloc::global::BestFitAllocator = heap_alloc::global::BestFitAllocator;
/// ```
pub struct BestFitAllocator;

unsafe impl GlobalAlloc for BestFitAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT {
            return unsafe { System.alloc(layout) };
        }
        let Some(size) = round_request(layout.size()) else {
            return null_mut();
        };
        ensure_init();
        HEAP.with_lock(|heap| heap.try_allocate(size).map_or(null_mut(), NonNull::as_ptr))
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.align() > ALIGNMENT {
            unsafe { System.dealloc(ptr, layout) };
            return;
        }
        if let Some(ptr) = NonNull::new(ptr) {
            HEAP.with_lock(|heap| unsafe { heap.free(ptr) });
        }
    }
}
