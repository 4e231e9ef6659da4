use core::ptr::NonNull;

/// Free-list link. `None` marks the end of the list, or an allocated block.
pub(crate) type Link = Option<NonNull<BlockHeader>>;

/// Header stored immediately before every block's usable memory.
///
/// ```text
/// +----------------------+-------------------------+----------------
/// | BlockHeader          |   payload (size bytes)  | next header ...
/// +----------------------+-------------------------+----------------
/// ^ header               ^ header + HEADER_SIZE    ^ header + HEADER_SIZE + size
/// ```
///
/// - `size` counts payload bytes only and is always a multiple of 8.
/// - `next`/`prev` are set only while the block sits on the free-list.
#[repr(C)]
#[derive(Debug)]
pub struct BlockHeader {
    pub(crate) size: usize,
    pub(crate) next: Link,
    pub(crate) prev: Link,
}

/// Bytes occupied by a [`BlockHeader`].
pub const HEADER_SIZE: usize = size_of::<BlockHeader>();

impl BlockHeader {
    /// An unlinked header with `size` payload bytes.
    pub(crate) const fn new(size: usize) -> Self {
        Self {
            size,
            next: None,
            prev: None,
        }
    }

    /// Address of the header itself.
    pub(crate) fn start(&self) -> usize {
        core::ptr::from_ref(self) as usize
    }

    /// First address past this block's payload.
    pub(crate) fn end(&self) -> usize {
        self.start() + HEADER_SIZE + self.size
    }

    /// Write an unlinked header with `size` payload bytes at `at`.
    ///
    /// # Safety
    /// - `[at, at + HEADER_SIZE + size)` must be writable memory owned by the heap.
    /// - `at` must be 8-byte aligned.
    #[allow(clippy::cast_ptr_alignment)]
    pub(crate) unsafe fn carve(at: NonNull<u8>, size: usize) -> NonNull<Self> {
        let block = at.cast::<Self>();
        unsafe { block.write(Self::new(size)) };
        block
    }

    /// Usable memory of `block`.
    pub(crate) fn payload(block: NonNull<Self>) -> NonNull<u8> {
        // Safety: every header is followed by its payload in the same region.
        unsafe { block.cast::<u8>().add(HEADER_SIZE) }
    }

    /// Recover the header of a payload pointer.
    ///
    /// This is the only place that steps backwards from user memory into
    /// metadata.
    ///
    /// # Safety
    /// `ptr` must have been produced by [`payload`](Self::payload), i.e. handed
    /// out by `Heap::allocate` and not freed since.
    #[allow(clippy::cast_ptr_alignment)]
    pub(crate) unsafe fn from_payload(ptr: NonNull<u8>) -> NonNull<Self> {
        unsafe { ptr.sub(HEADER_SIZE).cast::<Self>() }
    }
}
