//! Formatted appends to a view through [`core::fmt::Write`].

use core::fmt;

use crate::{BufferError, BufferPool, View};

/// [`fmt::Write`] adapter that appends to a view.
///
/// `fmt::Error` carries no payload, so the buffer error that stopped a write
/// is kept here and handed back by [`BufferPool::append_fmt`].
#[derive(Debug)]
pub struct ViewWriter<'a> {
    pool: &'a mut BufferPool,
    view: &'a mut View,
    error: Option<BufferError>,
}

impl<'a> ViewWriter<'a> {
    pub(crate) fn new(pool: &'a mut BufferPool, view: &'a mut View) -> Self {
        Self {
            pool,
            view,
            error: None,
        }
    }

    /// The error that interrupted the last failed write, if any.
    #[must_use]
    pub fn take_error(&mut self) -> Option<BufferError> {
        self.error.take()
    }
}

impl fmt::Write for ViewWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.pool.append_bytes(self.view, s.as_bytes()) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.error = Some(err);
                Err(fmt::Error)
            }
        }
    }
}

impl BufferPool {
    /// Borrows `view` as a [`fmt::Write`] sink; every write appends.
    pub fn writer<'a>(&'a mut self, view: &'a mut View) -> ViewWriter<'a> {
        ViewWriter::new(self, view)
    }

    /// Appends formatted text to `dest` and returns the new length.
    ///
    /// ```rust
    /// use textbuf::BufferPool;
    ///
    /// let mut pool = BufferPool::default();
    /// let mut url = pool.literal_str("http://localhost")?;
    /// pool.append_fmt(&mut url, format_args!(":{}/index.js", 8080))?;
    /// assert_eq!(pool.as_bstr(&url)?, "http://localhost:8080/index.js");
    /// # Ok::<(), textbuf::BufferError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// The first error of the underlying appends, or
    /// [`BufferError::Format`] if a `Display` implementation failed. Pieces
    /// written before the failure stay appended.
    pub fn append_fmt(&mut self, dest: &mut View, args: fmt::Arguments<'_>) -> Result<usize, BufferError> {
        let mut writer = ViewWriter::new(self, dest);
        if fmt::write(&mut writer, args).is_err() {
            return Err(writer.take_error().unwrap_or(BufferError::Format));
        }
        Ok(dest.len())
    }
}
