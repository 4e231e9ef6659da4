//! Bump page provider over a borrowed buffer.

use crate::{PAGE_SIZE, PageError, PageProvider, rounded_request};
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Hands out consecutive page-aligned regions from a caller-owned buffer.
///
/// The buffer is trimmed to whole pages on construction: leading bytes before
/// the first page boundary and the trailing partial page are never used.
/// Regions are never taken back.
pub struct ArenaPages<'a> {
    /// First page boundary inside the buffer.
    base: NonNull<u8>,
    /// Usable length in bytes (a multiple of [`PAGE_SIZE`]).
    len: usize,
    /// Offset of the next free page.
    next: usize,
    _pool: PhantomData<&'a mut [u8]>,
}

// Safety: the arena has exclusive access to its buffer for 'a.
unsafe impl Send for ArenaPages<'_> {}

impl<'a> ArenaPages<'a> {
    /// Manage the page-aligned part of `pool`.
    #[must_use]
    pub fn new(pool: &'a mut [u8]) -> Self {
        let skip = pool.as_mut_ptr().align_offset(PAGE_SIZE).min(pool.len());
        let usable = (pool.len() - skip) & !(PAGE_SIZE - 1);
        let base = NonNull::from(&mut pool[skip..]).cast::<u8>();
        Self {
            base,
            len: usable,
            next: 0,
            _pool: PhantomData,
        }
    }

    /// Total capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.len
    }

    /// Bytes handed out so far.
    #[must_use]
    pub const fn acquired(&self) -> usize {
        self.next
    }

    /// Bytes still available.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.len - self.next
    }

    /// Whether `addr` lies inside the managed pages.
    #[must_use]
    pub fn contains(&self, addr: usize) -> bool {
        let start = self.base.as_ptr() as usize;
        (start..start + self.len).contains(&addr)
    }
}

impl PageProvider for ArenaPages<'_> {
    fn acquire_pages(&mut self, bytes: usize) -> Result<NonNull<u8>, PageError> {
        let bytes = rounded_request(bytes)?;
        if bytes > self.remaining() {
            return Err(PageError::Exhausted {
                requested: bytes,
                remaining: self.remaining(),
            });
        }
        // Safety: next + bytes <= len, so the result stays inside the buffer.
        let region = unsafe { self.base.add(self.next) };
        self.next += bytes;
        log::trace!("arena: {bytes} bytes at {region:p}, {} left", self.remaining());
        Ok(region)
    }

    unsafe fn release_pages(
        &mut self,
        _region: NonNull<u8>,
        _bytes: usize,
    ) -> Result<(), PageError> {
        Err(PageError::Unsupported)
    }
}
