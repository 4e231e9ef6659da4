use heap_pages::PageError;

/// Why the heap could not produce a block.
///
/// The heap treats both cases as fatal; [`Heap::allocate`](crate::Heap::allocate)
/// panics with this error's message. The value exists so that callers which
/// must not panic (the `GlobalAlloc` adapter) can report failure instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("page provider could not supply a {requested}-byte region")]
    OutOfPages {
        requested: usize,
        #[source]
        source: PageError,
    },
    #[error("request of {requested} bytes is too large to back with a region")]
    RequestTooLarge { requested: usize },
}

/// A broken free-list invariant found by [`Heap::verify`](crate::Heap::verify).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("free-list sentinel has a back-link")]
    SentinelHasPrev,
    #[error("block {block:#x} links back to {found:#x}, expected {expected:#x}")]
    BrokenBackLink {
        block: usize,
        expected: usize,
        found: usize,
    },
    #[error("block {block:#x} has size {size}, not a multiple of the alignment")]
    MisalignedSize { block: usize, size: usize },
    #[error("free blocks {first:#x} and {second:#x} overlap")]
    Overlap { first: usize, second: usize },
}
