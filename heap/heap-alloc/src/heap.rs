use crate::block::{BlockHeader, HEADER_SIZE};
use crate::error::{HeapError, IntegrityError};
use crate::free_list::FreeList;
use crate::ALIGNMENT;
use core::ptr::NonNull;
use heap_pages::{PAGE_SIZE, PageProvider, page_align_up};
use log::{debug, trace};

/// Snapshot of a heap's bookkeeping.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Regions acquired from the page provider this session.
    pub regions: usize,
    /// Total bytes of those regions.
    pub region_bytes: usize,
    /// Blocks handed out and not yet freed.
    pub live_blocks: usize,
    /// Blocks on the free-list.
    pub free_blocks: usize,
    /// Sum of the free blocks' payload sizes.
    pub free_bytes: usize,
}

/// A block on the free-list, as seen by [`Heap::free_blocks`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FreeBlock {
    /// Address of the block's header.
    pub addr: usize,
    /// Payload bytes.
    pub size: usize,
}

/// Best-fit, split-and-coalesce heap over regions from a [`PageProvider`].
///
/// All metadata lives in the managed memory: one [`BlockHeader`] before each
/// block, and free blocks linked through those headers. The heap value itself
/// only holds the list sentinel, the provider and counters.
///
/// Not thread-safe; wrap it in a [`HeapLock`](crate::HeapLock) to share it.
pub struct Heap<P> {
    free: FreeList,
    pages: P,
    regions: usize,
    region_bytes: usize,
    live_blocks: usize,
}

// Safety: every block reachable from the heap is owned by it exclusively, so
// moving the heap to another thread moves that ownership along.
unsafe impl<P: Send> Send for Heap<P> {}

impl<P: PageProvider> Heap<P> {
    /// A heap with an empty free-list. No pages are acquired until the first
    /// allocation.
    #[must_use]
    pub const fn new(pages: P) -> Self {
        Self {
            free: FreeList::new(),
            pages,
            regions: 0,
            region_bytes: 0,
            live_blocks: 0,
        }
    }

    /// Start a session: the free-list becomes empty.
    ///
    /// Calling this again abandons every region acquired so far; they are
    /// not handed back to the provider.
    pub fn initialize(&mut self) {
        if self.regions > 0 {
            debug!(
                "heap: reinitializing, abandoning {} region(s) / {} bytes",
                self.regions, self.region_bytes
            );
        }
        self.free.reset();
        self.regions = 0;
        self.region_bytes = 0;
        self.live_blocks = 0;
    }

    /// End a session. Nothing is reclaimed.
    pub fn finalize(&self) {
        debug!("heap: finalize {:?}", self.stats());
    }

    /// The page provider backing this heap.
    #[must_use]
    pub const fn pages(&self) -> &P {
        &self.pages
    }

    /// Allocate `size` bytes, 8-byte aligned and uninitialized.
    ///
    /// `size` must be a positive multiple of [`ALIGNMENT`].
    ///
    /// # Panics
    /// If the page provider cannot supply a region. Running out of pages is
    /// fatal for this heap; use [`try_allocate`](Self::try_allocate) to observe it.
    #[must_use]
    pub fn allocate(&mut self, size: usize) -> NonNull<u8> {
        match self.try_allocate(size) {
            Ok(ptr) => ptr,
            Err(err) => panic!("heap: {err}"),
        }
    }

    /// Like [`allocate`](Self::allocate), but reports exhaustion.
    ///
    /// # Errors
    /// [`HeapError`] if no region large enough could be acquired.
    pub fn try_allocate(&mut self, size: usize) -> Result<NonNull<u8>, HeapError> {
        debug_assert!(
            size > 0 && size % ALIGNMENT == 0,
            "allocation size {size} is not a positive multiple of {ALIGNMENT}"
        );

        let mut block = match self.best_fit(size) {
            Some(block) => block,
            // Nothing on the list fits, so the fresh region is exactly what a
            // second search would find.
            None => self.grow(size)?,
        };

        // Safety: `block` came from the list and is a live header.
        unsafe { self.free.remove(block) };
        let payload = BlockHeader::payload(block);
        let header = unsafe { block.as_mut() };
        let leftover = header.size - size;

        // A remainder that cannot hold a header stays with the allocation.
        if leftover > HEADER_SIZE {
            header.size = size;
            // Safety: the remainder lies inside the chosen block.
            unsafe {
                let tail = BlockHeader::carve(payload.add(size), leftover - HEADER_SIZE);
                self.free.insert(tail);
            }
            trace!("heap: split {:p}, {} bytes left over", block, leftover - HEADER_SIZE);
        }

        self.live_blocks += 1;
        Ok(payload)
    }

    /// Return a block to the heap, merging it with free neighbours.
    ///
    /// # Safety
    /// `ptr` must come from [`allocate`](Self::allocate) or
    /// [`try_allocate`](Self::try_allocate) on this heap and must not have been
    /// freed since. Nothing may access the block afterwards.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let mut block = unsafe { BlockHeader::from_payload(ptr) };
        let (start, end) = {
            let header = unsafe { block.as_ref() };
            (header.start(), header.end())
        };

        let right = self.free.iter().find(|b| b.as_ptr() as usize == end);
        // Safety (here and below): list members are live headers.
        let left = self.free.iter().find(|b| unsafe { b.as_ref() }.end() == start);

        self.live_blocks = self.live_blocks.saturating_sub(1);

        unsafe {
            match (left, right) {
                (Some(mut left), Some(right)) => {
                    self.free.remove(left);
                    self.free.remove(right);
                    left.as_mut().size +=
                        HEADER_SIZE + block.as_ref().size + HEADER_SIZE + right.as_ref().size;
                    self.free.insert(left);
                    trace!("heap: merged {left:p} <- {block:p} <- {right:p}");
                }
                (None, Some(right)) => {
                    self.free.remove(right);
                    block.as_mut().size += HEADER_SIZE + right.as_ref().size;
                    self.free.insert(block);
                    trace!("heap: merged {block:p} <- {right:p}");
                }
                (Some(mut left), None) => {
                    self.free.remove(left);
                    left.as_mut().size += HEADER_SIZE + block.as_ref().size;
                    self.free.insert(left);
                    trace!("heap: merged {left:p} <- {block:p}");
                }
                (None, None) => self.free.insert(block),
            }
        }
    }

    /// Current bookkeeping. Free figures are computed by walking the list.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let (free_blocks, free_bytes) = self
            .free
            .iter()
            .fold((0, 0), |(n, bytes), b| (n + 1, bytes + unsafe { b.as_ref() }.size));
        HeapStats {
            regions: self.regions,
            region_bytes: self.region_bytes,
            live_blocks: self.live_blocks,
            free_blocks,
            free_bytes,
        }
    }

    /// Free blocks in list order (most recently inserted first).
    pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
        self.free.iter().map(|b| {
            let header = unsafe { b.as_ref() };
            FreeBlock {
                addr: header.start(),
                size: header.size,
            }
        })
    }

    /// Walk the free-list and check its structural invariants.
    ///
    /// Runs in O(n²) in the number of free blocks.
    ///
    /// # Errors
    /// The first [`IntegrityError`] found.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        if self.free.sentinel_prev().is_some() {
            return Err(IntegrityError::SentinelHasPrev);
        }

        let mut prev: Option<NonNull<BlockHeader>> = None;
        for block in self.free.iter() {
            let header = unsafe { block.as_ref() };
            match (prev, header.prev) {
                // The first member points at the sentinel; that link is
                // refreshed on the next mutation, so only its presence counts.
                (None, Some(_)) => {}
                (Some(expected), Some(found)) if expected == found => {}
                (expected, found) => {
                    let expected =
                        expected.map_or(self.free.sentinel_addr(), |p| p.as_ptr() as usize);
                    return Err(IntegrityError::BrokenBackLink {
                        block: header.start(),
                        expected,
                        found: found.map_or(0, |p| p.as_ptr() as usize),
                    });
                }
            }
            if header.size % ALIGNMENT != 0 {
                return Err(IntegrityError::MisalignedSize {
                    block: header.start(),
                    size: header.size,
                });
            }
            prev = Some(block);
        }

        for (i, a) in self.free.iter().enumerate() {
            let a = unsafe { a.as_ref() };
            for b in self.free.iter().skip(i + 1) {
                let b = unsafe { b.as_ref() };
                if a.start() < b.end() && b.start() < a.end() {
                    return Err(IntegrityError::Overlap {
                        first: a.start(),
                        second: b.start(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tightest-fitting free block for `size`, if any.
    fn best_fit(&self, size: usize) -> Option<NonNull<BlockHeader>> {
        let mut best: Option<(NonNull<BlockHeader>, usize)> = None;
        for block in self.free.iter() {
            let Some(slack) = unsafe { block.as_ref() }.size.checked_sub(size) else {
                continue;
            };
            if best.is_none_or(|(_, best_slack)| slack < best_slack) {
                best = Some((block, slack));
                if slack == 0 {
                    break;
                }
            }
        }
        best.map(|(block, _)| block)
    }

    /// Acquire a region for at least `size` payload bytes and put it on the list.
    fn grow(&mut self, size: usize) -> Result<NonNull<BlockHeader>, HeapError> {
        let bytes = size
            .checked_add(HEADER_SIZE)
            .and_then(page_align_up)
            .ok_or(HeapError::RequestTooLarge { requested: size })?
            .max(PAGE_SIZE);
        let region = self
            .pages
            .acquire_pages(bytes)
            .map_err(|source| HeapError::OutOfPages {
                requested: bytes,
                source,
            })?;

        self.regions += 1;
        self.region_bytes += bytes;
        debug!("heap: region #{} of {bytes} bytes at {region:p}", self.regions);

        // Safety: the provider handed us `bytes` writable, page-aligned bytes.
        unsafe {
            let block = BlockHeader::carve(region, bytes - HEADER_SIZE);
            self.free.insert(block);
            Ok(block)
        }
    }
}
