//! The buffer growth engine.
//!
//! A [`Buffer`] starts out either absent (nothing allocated yet) or wrapping a
//! borrowed literal. [`Buffer::ensure_capacity`] is the only way storage ever
//! changes: it materializes absent storage at exactly the requested size, and
//! otherwise grows by doubling from a floor so that `n` single-byte growths
//! copy O(n) bytes in total.
//!
//! Growth copies the *whole* previous allocation, not just some content
//! length. The buffer does not know which bytes are in use; that is tracked by
//! the views aliasing it, and any of them may live anywhere below the old
//! capacity.

use alloc::vec::Vec;

use log::trace;

use crate::{error::BufferError, options::DEFAULT_GROWTH_FLOOR, storage::Storage};

/// An allocation holder: borrowed literal bytes or an owned, growable heap
/// allocation.
#[derive(Debug)]
pub struct Buffer {
    storage: Option<Storage>,
    terminated: bool,
    growth_floor: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    /// Creates a buffer with no storage. Nothing is allocated until the first
    /// growth request.
    #[must_use]
    pub fn new() -> Self {
        Self::with_growth_floor(DEFAULT_GROWTH_FLOOR)
    }

    /// Creates a buffer with no storage whose growth path starts from
    /// `growth_floor` bytes instead of the default.
    #[must_use]
    pub fn with_growth_floor(growth_floor: usize) -> Self {
        Self {
            storage: None,
            terminated: false,
            growth_floor: growth_floor.max(1),
        }
    }

    /// Wraps a literal without copying it. The bytes are never written to and
    /// never freed by this buffer.
    #[must_use]
    pub fn borrowed(bytes: &'static [u8]) -> Self {
        Self {
            storage: Some(Storage::Borrowed(bytes)),
            ..Self::new()
        }
    }

    /// Takes ownership of `bytes`; the capacity is the vector's length.
    #[must_use]
    pub fn owned(bytes: Vec<u8>) -> Self {
        Self {
            storage: Some(Storage::Owned(bytes)),
            ..Self::new()
        }
    }

    /// Records that a zero byte already follows the content, for storage
    /// handed over with a terminator appended.
    pub(crate) fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    pub(crate) fn set_growth_floor(&mut self, growth_floor: usize) {
        self.growth_floor = growth_floor.max(1);
    }

    /// Bytes currently allocated. Zero while storage is absent.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().map_or(0, Storage::len)
    }

    /// Whether this buffer frees its storage when dropped or regrown.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.storage.as_ref().is_some_and(Storage::is_owned)
    }

    /// Whether storage has been allocated or borrowed yet.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.storage.is_some()
    }

    /// Whether the trailing zero byte convention is honored. Set once the
    /// growth engine has materialized the storage.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The whole allocation, `capacity()` bytes long.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_ref().map_or(&[] as &[u8], Storage::as_slice)
    }

    /// Guarantees that at least `requested` bytes are allocated from offset 0
    /// and returns `requested`.
    ///
    /// - `requested == 0` is a no-op.
    /// - Absent storage is allocated at exactly `requested` bytes.
    /// - A request that already fits performs no allocation, so calling this
    ///   twice with the same size yields the same capacity as calling it once.
    /// - Otherwise capacity becomes `max(capacity * 2, floor)`, doubled until
    ///   the request fits; the previous allocation is copied in full and
    ///   released if owned. Borrowed bytes are left untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::AllocationFailure`] if the allocator refuses the new
    /// storage, [`BufferError::CapacityOverflow`] if doubling overflows. The
    /// buffer is unchanged in both cases.
    pub fn ensure_capacity(&mut self, requested: usize) -> Result<usize, BufferError> {
        if requested == 0 {
            return Ok(0);
        }

        let Some(storage) = &self.storage else {
            self.storage = Some(Storage::Owned(allocate(requested, &[])?));
            self.terminated = true;
            trace!("materialized buffer with {requested} bytes");
            return Ok(requested);
        };

        let capacity = storage.len();
        if requested <= capacity {
            return Ok(requested);
        }

        let new_capacity = grown_capacity(capacity, requested, self.growth_floor)?;
        let grown = allocate(new_capacity, storage.as_slice())?;
        // Owned storage is freed here; a borrowed slice is only forgotten.
        self.storage = Some(Storage::Owned(grown));
        self.terminated = true;
        trace!("grew buffer from {capacity} to {new_capacity} bytes for a request of {requested}");
        Ok(requested)
    }

    /// Like [`ensure_capacity`](Self::ensure_capacity), but also guarantees
    /// that the storage is owned, and hands it out for writing.
    ///
    /// A borrowed literal that was already large enough is copied into a fresh
    /// owned allocation of the same capacity instead of being written in
    /// place.
    pub(crate) fn make_writable(&mut self, requested: usize) -> Result<&mut [u8], BufferError> {
        self.ensure_capacity(requested)?;

        if let Some(Storage::Borrowed(bytes)) = self.storage {
            self.storage = Some(Storage::Owned(allocate(bytes.len(), bytes)?));
            self.terminated = true;
            trace!("promoted borrowed buffer of {} bytes to owned", bytes.len());
        }

        match self.storage.as_mut().and_then(Storage::as_mut_slice) {
            Some(bytes) => Ok(bytes),
            // Only reachable for `requested == 0` on an absent buffer.
            None => Ok(Default::default()),
        }
    }
}

fn grown_capacity(capacity: usize, requested: usize, floor: usize) -> Result<usize, BufferError> {
    let mut new_capacity = capacity
        .checked_mul(2)
        .ok_or(BufferError::CapacityOverflow)?
        .max(floor);
    while new_capacity < requested {
        new_capacity = new_capacity
            .checked_mul(2)
            .ok_or(BufferError::CapacityOverflow)?;
    }
    Ok(new_capacity)
}

/// Allocates `capacity` bytes, copies `prefix` to the front and zero-fills the
/// rest.
fn allocate(capacity: usize, prefix: &[u8]) -> Result<Vec<u8>, BufferError> {
    debug_assert!(prefix.len() <= capacity);
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(capacity)
        .map_err(|_| BufferError::AllocationFailure {
            requested: capacity,
        })?;
    bytes.extend_from_slice(prefix);
    bytes.resize(capacity, 0);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Buffer, grown_capacity};
    use crate::BufferError;

    #[test]
    fn absent_buffer_materializes_exactly() {
        let mut buf = Buffer::new();
        assert!(!buf.is_materialized());
        assert_eq!(buf.ensure_capacity(10).unwrap(), 10);
        assert_eq!(buf.capacity(), 10);
        assert!(buf.is_owned());
        assert!(buf.is_terminated());
    }

    #[test]
    fn growth_doubles_from_the_floor() {
        let mut buf = Buffer::new();
        buf.ensure_capacity(10).unwrap();
        assert_eq!(buf.ensure_capacity(100).unwrap(), 100);
        assert_eq!(buf.capacity(), 128);
    }

    #[test]
    fn zero_request_is_a_no_op() {
        let mut buf = Buffer::new();
        assert_eq!(buf.ensure_capacity(0).unwrap(), 0);
        assert!(!buf.is_materialized());
        assert_eq!(buf.capacity(), 0);
    }

    #[rstest]
    #[case(1)]
    #[case(10)]
    #[case(64)]
    #[case(65)]
    #[case(1000)]
    fn ensure_capacity_is_idempotent(#[case] n: usize) {
        let mut buf = Buffer::borrowed(b"hello");
        buf.ensure_capacity(n).unwrap();
        let once = buf.capacity();
        buf.ensure_capacity(n).unwrap();
        assert_eq!(buf.capacity(), once);
        assert!(once >= n);
    }

    #[rstest]
    #[case(0, 1, 64)]
    #[case(10, 11, 64)]
    #[case(10, 100, 128)]
    #[case(40, 41, 80)]
    #[case(64, 65, 128)]
    #[case(100, 1000, 1600)]
    fn grown_capacity_cases(#[case] capacity: usize, #[case] requested: usize, #[case] expected: usize) {
        assert_eq!(grown_capacity(capacity, requested, 64).unwrap(), expected);
    }

    #[test]
    fn grown_capacity_reports_overflow() {
        assert_eq!(
            grown_capacity(usize::MAX / 2 + 1, usize::MAX, 64),
            Err(BufferError::CapacityOverflow)
        );
    }

    #[test]
    fn growth_preserves_the_whole_previous_allocation() {
        let mut buf = Buffer::borrowed(b"abc\0def");
        buf.ensure_capacity(8).unwrap();
        assert_eq!(buf.capacity(), 64);
        assert_eq!(&buf.as_bytes()[..7], b"abc\0def");
        assert!(buf.as_bytes()[7..].iter().all(|b| *b == 0));
    }

    #[test]
    fn borrowed_buffer_becomes_owned_only_on_growth() {
        let mut buf = Buffer::borrowed(b"hello");
        assert!(!buf.is_owned());
        assert!(!buf.is_terminated());
        buf.ensure_capacity(3).unwrap();
        assert!(!buf.is_owned());
        buf.ensure_capacity(6).unwrap();
        assert!(buf.is_owned());
        assert!(buf.is_terminated());
    }

    #[test]
    fn make_writable_promotes_borrowed_storage_in_place_size() {
        static LITERAL: &[u8] = b"hello";
        let mut buf = Buffer::borrowed(LITERAL);
        let bytes = buf.make_writable(3).unwrap();
        bytes[0] = b'j';
        assert_eq!(buf.capacity(), 5);
        assert!(buf.is_owned());
        assert_eq!(buf.as_bytes(), b"jello");
        assert_eq!(LITERAL, b"hello");
    }

    #[test]
    fn allocation_failure_leaves_buffer_unchanged() {
        let mut buf = Buffer::borrowed(b"abc");
        let err = buf.ensure_capacity(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, BufferError::AllocationFailure { .. }));
        assert_eq!(buf.as_bytes(), b"abc");
        assert!(!buf.is_owned());
    }

    #[test]
    fn custom_floor_is_respected() {
        let mut buf = Buffer::with_growth_floor(16);
        buf.ensure_capacity(4).unwrap();
        buf.ensure_capacity(5).unwrap();
        assert_eq!(buf.capacity(), 16);
    }
}
