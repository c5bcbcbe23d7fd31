//! Fixed-capacity text rewritten once per frame.
//!
//! Status and frame-rate labels read a view whose buffer never moves; each
//! frame formats new text into it. Output that does not fit is rejected
//! rather than growing the buffer or writing past it.

use core::fmt;

use crate::{BufferError, BufferPool, View};

/// Capacity of the frame-rate label text.
pub const FPS_TEXT_CAPACITY: usize = 16;

/// Capacity of the status line text.
pub const STATUS_TEXT_CAPACITY: usize = 256;

/// An owned, fixed-capacity text buffer that is overwritten by formatting.
#[derive(Debug)]
pub struct ScratchText {
    view: View,
    capacity: usize,
}

impl ScratchText {
    /// Allocates `capacity` zeroed bytes in `pool`. The text starts empty.
    ///
    /// # Errors
    ///
    /// [`BufferError::AllocationFailure`] if the bytes cannot be allocated.
    pub fn new(pool: &mut BufferPool, capacity: usize) -> Result<Self, BufferError> {
        let view = pool.with_capacity(capacity)?;
        Ok(Self { view, capacity })
    }

    /// The view a label should read.
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Fixed capacity, terminator included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replaces the text with `args` formatted, followed by a zero byte, and
    /// returns the new length. Empty output clears the text.
    ///
    /// ```rust
    /// use textbuf::{BufferPool, STATUS_TEXT_CAPACITY, ScratchText};
    ///
    /// let mut pool = BufferPool::default();
    /// let mut status = ScratchText::new(&mut pool, STATUS_TEXT_CAPACITY)?;
    /// status.format(&mut pool, format_args!("h: {}, a: {}", 2, -1))?;
    /// assert_eq!(pool.as_bstr(&status.view())?, "h: 2, a: -1");
    /// # Ok::<(), textbuf::BufferError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`BufferError::ScratchOverflow`] if the text plus terminator exceeds
    /// the capacity; the previous text is left as it was.
    /// [`BufferError::Format`] if a `Display` implementation failed.
    pub fn format(&mut self, pool: &mut BufferPool, args: fmt::Arguments<'_>) -> Result<usize, BufferError> {
        let mut counter = Counter(0);
        fmt::write(&mut counter, args).map_err(|_| BufferError::Format)?;
        let length = counter.0;
        let needed = length.saturating_add(1);
        if needed > self.capacity {
            return Err(BufferError::ScratchOverflow {
                needed,
                capacity: self.capacity,
            });
        }

        let bytes = pool.writable(self.view.buffer, self.capacity)?;
        let mut out = SliceWriter {
            bytes: &mut bytes[..length],
            written: 0,
        };
        if fmt::write(&mut out, args).is_err() || out.written != length {
            // The arguments rendered differently the second time.
            return Err(BufferError::Format);
        }
        bytes[length] = 0;

        self.view.length = length;
        Ok(length)
    }

    /// Releases the underlying buffer.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] if it was already released.
    pub fn release(self, pool: &mut BufferPool) -> Result<(), BufferError> {
        pool.release(self.view.buffer)
    }
}

struct Counter(usize);

impl fmt::Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

struct SliceWriter<'a> {
    bytes: &'a mut [u8],
    written: usize,
}

impl fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.written + s.len();
        let dst = self.bytes.get_mut(self.written..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.written = end;
        Ok(())
    }
}
