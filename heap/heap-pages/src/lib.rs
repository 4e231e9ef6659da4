//! # Page Providers
//!
//! The heap never talks to the operating system directly. Whenever its
//! free-list cannot satisfy a request it asks a [`PageProvider`] for a fresh,
//! page-aligned region and carves blocks out of it. This crate defines that
//! seam and ships two providers:
//!
//! * [`SystemPages`] (feature `std`): regions come from the process's system
//!   allocator with page alignment. It deliberately bypasses the global
//!   allocator so the heap built on top can itself be installed as
//!   `#[global_allocator]`.
//! * [`ArenaPages`]: a bump provider over a caller-supplied buffer. Regions are
//!   handed out back to back, which makes addresses predictable and lets
//!   neighbouring regions coalesce. Useful for tests and for environments
//!   without a system allocator.
//!
//! ```text
//! ┌──────────────────────────┐  acquire_pages(n)  ┌───────────────────────┐
//! │  heap-alloc (free-list)  │ ─────────────────▶ │  PageProvider         │
//! │                          │ ◀───────────────── │  SystemPages / Arena  │
//! └──────────────────────────┘   NonNull<u8>      └───────────────────────┘
//! ```
//!
//! ## Granularity
//!
//! All regions are multiples of [`PAGE_SIZE`] and start on a page boundary.
//! Providers round requests up with [`page_align_up`].
//!
//! ## Releasing
//!
//! [`PageProvider::release_pages`] is part of the contract but the heap never
//! calls it: regions stay mapped for the lifetime of the heap.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(unsafe_code)]

mod arena;
#[cfg(feature = "std")]
mod system;

use core::ptr::NonNull;

pub use arena::ArenaPages;
#[cfg(feature = "std")]
pub use system::SystemPages;

/// Granularity and alignment of every region handed out by a provider.
pub const PAGE_SIZE: usize = 4096;

/// Source of page-granular memory regions.
///
/// Implementations must hand out regions that are
/// - aligned to [`PAGE_SIZE`],
/// - at least as large as requested,
/// - exclusively owned by the caller until released.
pub trait PageProvider {
    /// Acquire a region of at least `bytes` bytes.
    ///
    /// # Errors
    /// Returns a [`PageError`] when the request is empty, overflows when
    /// rounded to whole pages, or cannot be satisfied.
    fn acquire_pages(&mut self, bytes: usize) -> Result<NonNull<u8>, PageError>;

    /// Give a region back to the provider.
    ///
    /// # Errors
    /// Providers that cannot take memory back return [`PageError::Unsupported`].
    ///
    /// # Safety
    /// - `region` must have been returned by [`acquire_pages`](Self::acquire_pages)
    ///   on this provider with the same `bytes`.
    /// - Nothing may access the region afterwards.
    unsafe fn release_pages(&mut self, region: NonNull<u8>, bytes: usize)
    -> Result<(), PageError>;
}

impl<P: PageProvider + ?Sized> PageProvider for &mut P {
    fn acquire_pages(&mut self, bytes: usize) -> Result<NonNull<u8>, PageError> {
        (**self).acquire_pages(bytes)
    }

    unsafe fn release_pages(
        &mut self,
        region: NonNull<u8>,
        bytes: usize,
    ) -> Result<(), PageError> {
        unsafe { (**self).release_pages(region, bytes) }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("zero-sized page request")]
    ZeroSized,
    #[error("page request of {requested} bytes overflows when rounded to pages")]
    Overflow { requested: usize },
    #[error("arena exhausted: requested {requested} bytes, {remaining} remaining")]
    Exhausted { requested: usize, remaining: usize },
    #[error("system allocator could not supply {requested} bytes")]
    OutOfMemory { requested: usize },
    #[error("provider does not take pages back")]
    Unsupported,
}

/// Round `bytes` up to the next multiple of [`PAGE_SIZE`].
///
/// Returns `None` if the rounded value does not fit in `usize`.
///
/// ```rust
/// # use heap_pages::{page_align_up, PAGE_SIZE};
/// assert_eq!(page_align_up(0), Some(0));
/// assert_eq!(page_align_up(1), Some(PAGE_SIZE));
/// assert_eq!(page_align_up(PAGE_SIZE), Some(PAGE_SIZE));
/// assert_eq!(page_align_up(PAGE_SIZE + 8), Some(2 * PAGE_SIZE));
/// assert_eq!(page_align_up(usize::MAX), None);
/// ```
#[inline]
#[must_use]
pub const fn page_align_up(bytes: usize) -> Option<usize> {
    match bytes.checked_add(PAGE_SIZE - 1) {
        Some(v) => Some(v & !(PAGE_SIZE - 1)),
        None => None,
    }
}

/// Validate and round a page request.
fn rounded_request(bytes: usize) -> Result<usize, PageError> {
    if bytes == 0 {
        return Err(PageError::ZeroSized);
    }
    page_align_up(bytes).ok_or(PageError::Overflow { requested: bytes })
}
