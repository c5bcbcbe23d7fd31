//! The buffer pool: the single owner of every [`Buffer`], addressed through
//! generation-checked [`BufferId`] handles.
//!
//! Every access re-resolves a view's handle against its slot, so a buffer that
//! grew is simply read at its new address, and a buffer that was released
//! reports [`BufferError::StaleView`] instead of handing out freed memory.

use alloc::vec::Vec;
use core::ffi::CStr;

use bstr::BStr;
use log::debug;

use crate::{
    buffer::Buffer,
    error::BufferError,
    options::{PoolOptions, TerminatorPolicy},
    view::{self, BufferId, View},
};

#[derive(Debug)]
struct Slot {
    generation: u32,
    buffer: Option<Buffer>,
}

/// Owns a set of buffers and performs every view mutation.
///
/// # Examples
///
/// ```rust
/// use textbuf::BufferPool;
///
/// let mut pool = BufferPool::default();
/// let mut label = pool.literal_str("foobar")?;
/// let src = pool.literal_str("XYZ")?;
/// pool.insert(&mut label, 3, &src)?;
/// assert_eq!(pool.bytes(&label)?, b"fooXYZbar");
/// # Ok::<(), textbuf::BufferError>(())
/// ```
#[derive(Debug, Default)]
pub struct BufferPool {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    options: PoolOptions,
}

#[derive(Debug, Clone, Copy)]
enum Splice {
    Set,
    Append,
    Insert(usize),
}

impl Splice {
    fn apply(
        self,
        buffer: &mut Buffer,
        dest: &mut View,
        src: &[u8],
        policy: TerminatorPolicy,
    ) -> Result<usize, BufferError> {
        let terminate = policy.terminates_splice();
        match self {
            Splice::Set => view::set(buffer, dest, src),
            Splice::Append => view::append(buffer, dest, src, terminate),
            Splice::Insert(index) => view::insert(buffer, dest, index, src, terminate),
        }
    }
}

impl BufferPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(options: PoolOptions) -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            options,
        }
    }

    /// The options this pool was created with.
    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Number of live buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Whether the pool holds no live buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` still refers to a live buffer.
    #[must_use]
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffer(id).is_ok()
    }

    // ── construction ──────────────────────────────────────────────────────

    /// Wraps a literal in a borrowed buffer and returns a view over all of it.
    ///
    /// The literal is copied into owned storage the first time anything is
    /// written through a view of it.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityOverflow`] if the pool has run out of slot
    /// indices.
    pub fn literal(&mut self, bytes: &'static [u8]) -> Result<View, BufferError> {
        let buffer = self.insert_buffer(Buffer::borrowed(bytes))?;
        Ok(View {
            buffer,
            start: 0,
            length: bytes.len(),
        })
    }

    /// [`literal`](Self::literal) for string literals.
    ///
    /// # Errors
    ///
    /// See [`literal`](Self::literal).
    pub fn literal_str(&mut self, text: &'static str) -> Result<View, BufferError> {
        self.literal(text.as_bytes())
    }

    /// Creates an empty view whose buffer has room for `hint` bytes.
    ///
    /// A zero hint allocates nothing; the buffer materializes on the first
    /// write.
    ///
    /// # Errors
    ///
    /// [`BufferError::AllocationFailure`] if `hint` bytes cannot be allocated.
    pub fn with_capacity(&mut self, hint: usize) -> Result<View, BufferError> {
        let mut buffer = Buffer::with_growth_floor(self.options.growth_floor);
        buffer.ensure_capacity(hint)?;
        let buffer = self.insert_buffer(buffer)?;
        Ok(View {
            buffer,
            start: 0,
            length: 0,
        })
    }

    /// Takes ownership of bytes produced elsewhere (a file read, an HTTP body)
    /// and returns a view over them. A zero terminator is appended after the
    /// content.
    ///
    /// # Errors
    ///
    /// [`BufferError::AllocationFailure`] if the terminator does not fit.
    pub fn from_bytes(&mut self, mut bytes: Vec<u8>) -> Result<View, BufferError> {
        let length = bytes.len();
        bytes
            .try_reserve_exact(1)
            .map_err(|_| BufferError::AllocationFailure {
                requested: length.saturating_add(1),
            })?;
        bytes.push(0);

        let mut buffer = Buffer::owned(bytes);
        buffer.mark_terminated();
        let buffer = self.insert_buffer(buffer)?;
        Ok(View {
            buffer,
            start: 0,
            length,
        })
    }

    /// Derives a view of `length` bytes at `start` in buffer `id`.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] if `id` was released,
    /// [`BufferError::ViewOutOfBounds`] if the range is not allocated.
    pub fn view(&self, id: BufferId, start: usize, length: usize) -> Result<View, BufferError> {
        let capacity = self.buffer(id)?.capacity();
        match start.checked_add(length) {
            Some(end) if end <= capacity => Ok(View {
                buffer: id,
                start,
                length,
            }),
            _ => Err(BufferError::ViewOutOfBounds {
                start,
                length,
                capacity,
            }),
        }
    }

    /// Derives a view starting `offset` bytes into `view`, aliasing the same
    /// buffer.
    ///
    /// # Errors
    ///
    /// See [`view`](Self::view).
    pub fn subview(&self, view: &View, offset: usize, length: usize) -> Result<View, BufferError> {
        let start = view
            .start
            .checked_add(offset)
            .ok_or(BufferError::CapacityOverflow)?;
        self.view(view.buffer, start, length)
    }

    /// Releases a buffer. Owned storage is freed; a borrowed literal is only
    /// forgotten. Every handle to it becomes stale.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] if `id` was already released.
    pub fn release(&mut self, id: BufferId) -> Result<(), BufferError> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .ok_or_else(|| stale(id))?;
        let buffer = slot.buffer.take().ok_or_else(|| stale(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(id.index);

        debug!(
            "released buffer slot {} ({} bytes, owned: {})",
            id.index,
            buffer.capacity(),
            buffer.is_owned()
        );
        Ok(())
    }

    // ── access ────────────────────────────────────────────────────────────

    /// The buffer behind `id`.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] if `id` was released.
    pub fn buffer(&self, id: BufferId) -> Result<&Buffer, BufferError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.buffer.as_ref())
            .ok_or_else(|| stale(id))
    }

    fn buffer_mut(&mut self, id: BufferId) -> Result<&mut Buffer, BufferError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.buffer.as_mut())
            .ok_or_else(|| stale(id))
    }

    /// The content bytes of `view`.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] if the view's buffer was released.
    pub fn bytes(&self, view: &View) -> Result<&[u8], BufferError> {
        content(self.buffer(view.buffer)?, view)
    }

    /// The content of `view` as a byte string, for display and debugging.
    ///
    /// # Errors
    ///
    /// See [`bytes`](Self::bytes).
    pub fn as_bstr(&self, view: &View) -> Result<&BStr, BufferError> {
        self.bytes(view).map(BStr::new)
    }

    /// The content of `view` as a C string, for consumers that expect a zero
    /// byte after the text. Stops early at an interior zero byte.
    ///
    /// # Errors
    ///
    /// [`BufferError::NotTerminated`] if no zero byte follows the content.
    pub fn c_str(&self, view: &View) -> Result<&CStr, BufferError> {
        let bytes = self.buffer(view.buffer)?.as_bytes();
        let end = view.end();
        if bytes.get(end) != Some(&0) {
            return Err(BufferError::NotTerminated);
        }
        CStr::from_bytes_until_nul(&bytes[view.start..=end]).map_err(|_| BufferError::NotTerminated)
    }

    // ── growth and mutation ───────────────────────────────────────────────

    /// Runs the growth engine on buffer `id`. See
    /// [`Buffer::ensure_capacity`].
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] for a released buffer, otherwise the
    /// growth engine's errors.
    pub fn ensure_capacity(&mut self, id: BufferId, requested: usize) -> Result<usize, BufferError> {
        self.buffer_mut(id)?.ensure_capacity(requested)
    }

    pub(crate) fn writable(&mut self, id: BufferId, requested: usize) -> Result<&mut [u8], BufferError> {
        self.buffer_mut(id)?.make_writable(requested)
    }

    /// Replaces the content of `dest` with a copy of `src` and writes a zero
    /// byte after it. Returns the new length.
    ///
    /// An empty `src` is a no-op: `dest` keeps its previous content.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleView`] if either view's buffer was released,
    /// otherwise the growth engine's errors. `dest` is unchanged on error.
    pub fn set(&mut self, dest: &mut View, src: &View) -> Result<usize, BufferError> {
        self.splice_view(dest, src, Splice::Set)
    }

    /// Copies `src` right after the content of `dest`. Returns the new length.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn append(&mut self, dest: &mut View, src: &View) -> Result<usize, BufferError> {
        self.splice_view(dest, src, Splice::Append)
    }

    /// Splices `src` into `dest` at local offset `index`, so the content
    /// becomes `content[..index] ++ src ++ content[index..]`. Returns the new
    /// length.
    ///
    /// # Errors
    ///
    /// [`BufferError::IndexOutOfRange`] if `index > dest.len()`, checked
    /// before anything else is touched. Otherwise see [`set`](Self::set).
    pub fn insert(&mut self, dest: &mut View, index: usize, src: &View) -> Result<usize, BufferError> {
        self.splice_view(dest, src, Splice::Insert(index))
    }

    /// [`set`](Self::set) from a byte slice.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_bytes(&mut self, dest: &mut View, src: &[u8]) -> Result<usize, BufferError> {
        self.splice_bytes(dest, src, Splice::Set)
    }

    /// [`append`](Self::append) from a byte slice.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn append_bytes(&mut self, dest: &mut View, src: &[u8]) -> Result<usize, BufferError> {
        self.splice_bytes(dest, src, Splice::Append)
    }

    /// [`insert`](Self::insert) from a byte slice.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn insert_bytes(&mut self, dest: &mut View, index: usize, src: &[u8]) -> Result<usize, BufferError> {
        self.splice_bytes(dest, src, Splice::Insert(index))
    }

    fn splice_bytes(&mut self, dest: &mut View, src: &[u8], splice: Splice) -> Result<usize, BufferError> {
        let policy = self.options.terminator;
        splice.apply(self.buffer_mut(dest.buffer)?, dest, src, policy)
    }

    fn splice_view(&mut self, dest: &mut View, src: &View, splice: Splice) -> Result<usize, BufferError> {
        let policy = self.options.terminator;

        if dest.buffer.index == src.buffer.index {
            // The source lives in the buffer about to be written; copy it out
            // first so growth and tail moves cannot disturb it.
            let bytes = self.bytes(src)?;
            let mut copy = Vec::new();
            copy.try_reserve_exact(bytes.len())
                .map_err(|_| BufferError::AllocationFailure {
                    requested: bytes.len(),
                })?;
            copy.extend_from_slice(bytes);
            return splice.apply(self.buffer_mut(dest.buffer)?, dest, &copy, policy);
        }

        let (target, source) = self.pair_mut(dest.buffer, src.buffer)?;
        splice.apply(target, dest, content(source, src)?, policy)
    }

    /// Borrows two distinct buffers, one mutably.
    fn pair_mut(&mut self, target: BufferId, source: BufferId) -> Result<(&mut Buffer, &Buffer), BufferError> {
        self.buffer(target)?;
        self.buffer(source)?;

        let (t, s) = (target.index as usize, source.index as usize);
        let (target_slot, source_slot) = if t < s {
            let (low, high) = self.slots.split_at_mut(s);
            (&mut low[t], &high[0])
        } else {
            let (low, high) = self.slots.split_at_mut(t);
            (&mut high[0], &low[s])
        };

        match (target_slot.buffer.as_mut(), source_slot.buffer.as_ref()) {
            (Some(target_buffer), Some(source_buffer)) => Ok((target_buffer, source_buffer)),
            (None, _) => Err(stale(target)),
            (_, None) => Err(stale(source)),
        }
    }

    /// Asserts the slot bookkeeping: vacant slots hold no buffer, every
    /// other slot does, and the vacant list has no duplicates.
    #[cfg(any(test, feature = "fuzzing"))]
    pub fn assert_consistent(&self) {
        for (index, slot) in self.slots.iter().enumerate() {
            let vacancies = self
                .vacant
                .iter()
                .filter(|v| **v as usize == index)
                .count();
            assert!(vacancies <= 1, "slot {index} is listed vacant {vacancies} times");
            assert_eq!(
                slot.buffer.is_none(),
                vacancies == 1,
                "slot {index} occupancy disagrees with the vacant list"
            );
        }
    }

    fn insert_buffer(&mut self, mut buffer: Buffer) -> Result<BufferId, BufferError> {
        buffer.set_growth_floor(self.options.growth_floor);

        if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            slot.buffer = Some(buffer);
            return Ok(BufferId {
                index,
                generation: slot.generation,
            });
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| BufferError::CapacityOverflow)?;
        self.slots.push(Slot {
            generation: 0,
            buffer: Some(buffer),
        });
        Ok(BufferId {
            index,
            generation: 0,
        })
    }
}

fn content<'a>(buffer: &'a Buffer, view: &View) -> Result<&'a [u8], BufferError> {
    let capacity = buffer.capacity();
    view.start
        .checked_add(view.length)
        .and_then(|end| buffer.as_bytes().get(view.start..end))
        .ok_or(BufferError::ViewOutOfBounds {
            start: view.start,
            length: view.length,
            capacity,
        })
}

fn stale(id: BufferId) -> BufferError {
    BufferError::StaleView {
        index: id.index,
        generation: id.generation,
    }
}
