//! Growable text buffers and the views that alias them.
//!
//! A [`Buffer`] holds either a borrowed literal or an owned heap allocation
//! that grows by doubling. A [`View`] is a `start + length` window into a
//! buffer; several views may share one buffer. All buffers live in a
//! [`BufferPool`] and are addressed by generation-checked [`BufferId`]s, so a
//! view can outlive neither a reallocation nor a release of its buffer without
//! that being noticed.
//!
//! ```rust
//! use textbuf::BufferPool;
//!
//! let mut pool = BufferPool::default();
//! let mut text = pool.literal_str("foo")?;
//! let bar = pool.literal_str("bar")?;
//! pool.append(&mut text, &bar)?;
//! assert_eq!(pool.bytes(&text)?, b"foobar");
//! assert_eq!(pool.c_str(&text)?.to_bytes(), b"foobar");
//! # Ok::<(), textbuf::BufferError>(())
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod buffer;
mod error;
mod options;
mod pool;
mod scratch;
mod storage;
mod view;
mod writer;

#[cfg(test)]
mod tests;

pub use buffer::Buffer;
pub use error::BufferError;
pub use options::{DEFAULT_GROWTH_FLOOR, PoolOptions, TerminatorPolicy};
pub use pool::BufferPool;
pub use scratch::{FPS_TEXT_CAPACITY, STATUS_TEXT_CAPACITY, ScratchText};
pub use view::{BufferId, View};
pub use writer::ViewWriter;
