//! Page provider backed by the system allocator.

use crate::{PAGE_SIZE, PageError, PageProvider, rounded_request};
use core::ptr::NonNull;
use std::alloc::{GlobalAlloc, Layout, System};

/// Page-aligned regions straight from [`System`].
///
/// Goes through [`System`] rather than the global allocator so that a heap
/// built on this provider can be installed as `#[global_allocator]` without
/// recursing into itself.
#[derive(Debug, Default)]
pub struct SystemPages {
    regions: usize,
    bytes: usize,
}

impl SystemPages {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: 0,
            bytes: 0,
        }
    }

    /// Number of regions currently held by callers.
    #[must_use]
    pub const fn regions(&self) -> usize {
        self.regions
    }

    /// Bytes currently held by callers.
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.bytes
    }

    fn layout(bytes: usize) -> Result<Layout, PageError> {
        let bytes = rounded_request(bytes)?;
        Layout::from_size_align(bytes, PAGE_SIZE)
            .map_err(|_| PageError::Overflow { requested: bytes })
    }
}

impl PageProvider for SystemPages {
    fn acquire_pages(&mut self, bytes: usize) -> Result<NonNull<u8>, PageError> {
        let layout = Self::layout(bytes)?;
        // Safety: layout has non-zero size.
        let region = unsafe { System.alloc(layout) };
        let region = NonNull::new(region).ok_or(PageError::OutOfMemory {
            requested: layout.size(),
        })?;
        self.regions += 1;
        self.bytes += layout.size();
        log::trace!("system: {} bytes at {region:p}", layout.size());
        Ok(region)
    }

    unsafe fn release_pages(
        &mut self,
        region: NonNull<u8>,
        bytes: usize,
    ) -> Result<(), PageError> {
        let layout = Self::layout(bytes)?;
        // Safety: caller guarantees the region came from acquire_pages(bytes),
        // which used this exact layout.
        unsafe { System.dealloc(region.as_ptr(), layout) };
        self.regions -= 1;
        self.bytes -= layout.size();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_round_trip() {
        let mut pages = SystemPages::new();
        let region = pages.acquire_pages(100).unwrap();
        assert_eq!(region.as_ptr() as usize % PAGE_SIZE, 0);
        assert_eq!(pages.regions(), 1);
        assert_eq!(pages.bytes(), PAGE_SIZE);

        // the whole rounded page is writable
        unsafe { core::ptr::write_bytes(region.as_ptr(), 0xAB, PAGE_SIZE) };

        unsafe { pages.release_pages(region, 100).unwrap() };
        assert_eq!(pages.regions(), 0);
        assert_eq!(pages.bytes(), 0);
    }

    #[test]
    fn zero_sized_requests_are_rejected() {
        let mut pages = SystemPages::new();
        assert_eq!(pages.acquire_pages(0), Err(PageError::ZeroSized));
    }
}
