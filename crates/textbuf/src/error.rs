use thiserror::Error;

/// Everything that can go wrong while growing, addressing or writing a
/// buffer.
///
/// None of these leave a partially applied mutation behind: an operation that
/// returns an error has not touched the destination content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The allocator refused a request of `requested` bytes.
    #[error("allocation of {requested} bytes failed")]
    AllocationFailure {
        /// Size of the allocation that was refused.
        requested: usize,
    },
    /// A size computation (offset plus length, or capacity doubling)
    /// overflowed `usize`.
    #[error("requested capacity overflows usize")]
    CapacityOverflow,
    /// `insert` was asked to splice past the end of the view's content.
    #[error("index {index} out of range for view of length {length}")]
    IndexOutOfRange {
        /// Local offset the caller asked for.
        index: usize,
        /// Content length of the view at the time of the call.
        length: usize,
    },
    /// A view was requested over bytes the buffer has not allocated.
    #[error("view {start}+{length} exceeds buffer capacity {capacity}")]
    ViewOutOfBounds {
        /// Requested start offset.
        start: usize,
        /// Requested content length.
        length: usize,
        /// Capacity of the buffer at the time of the call.
        capacity: usize,
    },
    /// The handle refers to a buffer that has since been released.
    #[error("stale handle: buffer slot {index} generation {generation} was released")]
    StaleView {
        /// Slot index carried by the handle.
        index: u32,
        /// Generation carried by the handle.
        generation: u32,
    },
    /// A `Display` implementation failed while formatting into a view.
    #[error("formatter returned an error")]
    Format,
    /// The view's content is not followed by a zero byte.
    #[error("view content is not zero-terminated")]
    NotTerminated,
    /// Formatted frame text does not fit into its fixed-capacity scratch.
    #[error("formatted text needs {needed} bytes but scratch holds {capacity}")]
    ScratchOverflow {
        /// Bytes required, terminator included.
        needed: usize,
        /// Fixed capacity of the scratch buffer.
        capacity: usize,
    },
}
