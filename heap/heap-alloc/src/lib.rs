//! # Best-Fit Free-List Heap
//!
//! A small user-space allocator that serves word-sized to few-kilobyte
//! requests out of page-granular regions supplied by a
//! [`PageProvider`](heap_pages::PageProvider).
//!
//! ## Design outline
//! - **Metadata**: every block is a [`BlockHeader`] followed by its payload.
//!   There is no side table; the headers are the only bookkeeping.
//! - **Free-list**: free blocks are linked through their headers in an
//!   unordered, doubly-linked list headed by a sentinel. Insert and remove are
//!   O(1).
//! - **Allocation**: best fit. The whole list is scanned for the block with the
//!   least slack; an exact fit ends the scan. On a miss a new region of at
//!   least one page is acquired and becomes a single free block. The chosen
//!   block is split when the remainder can hold a header plus payload;
//!   otherwise the remainder stays with the allocation.
//! - **Deallocation**: the header is found right before the pointer. The list is
//!   scanned for a free block starting right after this one and for one ending
//!   right before it; either or both are merged.
//! - **Regions** are never returned to the provider.
//!
//! ```text
//!  region (page aligned)
//! ┌────────┬─────────┬────────┬─────────┬────────┬──────────────────────┐
//! │ header │ payload │ header │ payload │ header │ payload (free)       │
//! └────────┴─────────┴────────┴─────────┴────────┴──────────────────────┘
//!   live               free ◀─────────────────▶ free      (free-list links)
//! ```
//!
//! ## Complexity
//! Allocation and deallocation are both O(n) in the number of free blocks:
//! best fit needs a full scan, and neighbour discovery scans the list instead
//! of using boundary tags. Coalescing keeps that list short.
//!
//! ## Concurrency
//! [`Heap`] is single-threaded and non-reentrant. Share it through a
//! [`HeapLock`]; the [`global`] module (feature `std`) does exactly that for a
//! process-wide instance and exposes it as a `GlobalAlloc`.
//!
//! ## Usage
//! ```rust
//! use heap_alloc::{Heap, SystemPages};
//!
//! let mut heap = Heap::new(SystemPages::new());
//! heap.initialize();
//! let a = heap.allocate(64);
//! let b = heap.allocate(128);
//! unsafe {
//!     heap.free(a);
//!     heap.free(b);
//! }
//! assert_eq!(heap.stats().live_blocks, 0);
//! heap.finalize();
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(unsafe_code)]

mod block;
mod error;
mod free_list;
mod heap;
mod lock;

#[cfg(feature = "std")]
pub mod global;

pub use block::{BlockHeader, HEADER_SIZE};
pub use error::{HeapError, IntegrityError};
pub use heap::{FreeBlock, Heap, HeapStats};
pub use heap_pages::{ArenaPages, PAGE_SIZE, PageError, PageProvider};
#[cfg(feature = "std")]
pub use heap_pages::SystemPages;
pub use lock::{HeapLock, HeapLockGuard};

/// Request granularity and payload alignment.
pub const ALIGNMENT: usize = 8;

/// Round an arbitrary byte count to a valid request size: at least
/// [`ALIGNMENT`], and a multiple of it.
///
/// ```rust
/// # use heap_alloc::round_request;
/// assert_eq!(round_request(0), Some(8));
/// assert_eq!(round_request(8), Some(8));
/// assert_eq!(round_request(13), Some(16));
/// assert_eq!(round_request(usize::MAX), None);
/// ```
#[must_use]
pub const fn round_request(size: usize) -> Option<usize> {
    let size = if size < ALIGNMENT { ALIGNMENT } else { size };
    match size.checked_add(ALIGNMENT - 1) {
        Some(v) => Some(v & !(ALIGNMENT - 1)),
        None => None,
    }
}
