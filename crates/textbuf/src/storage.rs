use alloc::vec::Vec;

/// Backing bytes of a [`Buffer`](crate::Buffer).
///
/// `Borrowed` carries no destructor obligation and is never handed out
/// mutably; `Owned` frees its allocation when dropped. An owned vector's
/// length is the buffer's capacity: every allocated byte is initialized.
#[derive(Debug)]
pub(crate) enum Storage {
    Borrowed(&'static [u8]),
    Owned(Vec<u8>),
}

impl Storage {
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Borrowed(bytes) => *bytes,
            Storage::Owned(bytes) => bytes.as_slice(),
        }
    }

    /// Only owned storage is writable.
    pub(crate) fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            Storage::Borrowed(_) => None,
            Storage::Owned(bytes) => Some(bytes.as_mut_slice()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub(crate) fn is_owned(&self) -> bool {
        matches!(self, Storage::Owned(_))
    }
}
