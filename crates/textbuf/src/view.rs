//! Views and the byte-level mutation primitives behind `set`, `append` and
//! `insert`.
//!
//! The primitives work on one [`Buffer`] and a source byte slice. Resolving
//! handles, and copying a source out of the destination buffer when the two
//! alias, is the pool's job.

use crate::{buffer::Buffer, error::BufferError};

/// Logical handle to a buffer owned by a [`BufferPool`](crate::BufferPool).
///
/// The generation changes whenever the slot's buffer is released, so a handle
/// kept past a release is detected instead of reading someone else's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl BufferId {
    /// Slot index inside the pool.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot this handle was issued for.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A visible sub-range of a buffer: `length` bytes starting at `start`.
///
/// Views are plain offsets. They stay meaningful when their buffer grows,
/// because growth keeps every byte at its offset; the pool re-resolves the
/// storage on each access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct View {
    pub(crate) buffer: BufferId,
    pub(crate) start: usize,
    pub(crate) length: usize,
}

impl View {
    /// The buffer this view looks into.
    #[must_use]
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Offset of the first content byte.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of content bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the view has no content bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Offset one past the last content byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Replaces the content of `dest` with `src` and writes the terminator.
/// An empty `src` leaves `dest` untouched.
pub(crate) fn set(buffer: &mut Buffer, dest: &mut View, src: &[u8]) -> Result<usize, BufferError> {
    if src.is_empty() {
        return Ok(dest.length);
    }

    let end = checked_add(dest.start, src.len())?;
    let bytes = buffer.make_writable(checked_add(end, 1)?)?;
    bytes[dest.start..end].copy_from_slice(src);
    bytes[end] = 0;
    dest.length = src.len();
    Ok(dest.length)
}

pub(crate) fn append(
    buffer: &mut Buffer,
    dest: &mut View,
    src: &[u8],
    terminate: bool,
) -> Result<usize, BufferError> {
    insert(buffer, dest, dest.length, src, terminate)
}

/// Splices `src` into `dest` at local offset `index`, shifting the tail right.
pub(crate) fn insert(
    buffer: &mut Buffer,
    dest: &mut View,
    index: usize,
    src: &[u8],
    terminate: bool,
) -> Result<usize, BufferError> {
    if index > dest.length {
        return Err(BufferError::IndexOutOfRange {
            index,
            length: dest.length,
        });
    }
    if src.is_empty() {
        return Ok(dest.length);
    }

    let content_end = checked_add(dest.start, dest.length)?;
    let new_end = checked_add(content_end, src.len())?;
    let requested = if terminate {
        checked_add(new_end, 1)?
    } else {
        new_end
    };

    let bytes = buffer.make_writable(requested)?;
    let at = dest.start + index;
    bytes.copy_within(at..content_end, at + src.len());
    bytes[at..at + src.len()].copy_from_slice(src);
    if terminate {
        bytes[new_end] = 0;
    }

    dest.length += src.len();
    Ok(dest.length)
}

fn checked_add(a: usize, b: usize) -> Result<usize, BufferError> {
    a.checked_add(b).ok_or(BufferError::CapacityOverflow)
}
