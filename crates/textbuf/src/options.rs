/// Smallest capacity the growth path will allocate once a buffer outgrows its
/// first materialization.
pub const DEFAULT_GROWTH_FLOOR: usize = 64;

/// Where the zero terminator byte is written after a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminatorPolicy {
    /// `set`, `append` and `insert` all leave a zero byte right after the
    /// content, so any view that was last written can be read as a C string.
    ///
    /// The zero byte overwrites whatever followed the content, even when that
    /// byte belongs to another view of the same buffer.
    #[default]
    Always,
    /// Only `set` writes the terminator. `append` and `insert` leave whatever
    /// byte happened to follow the content.
    SetOnly,
}

impl TerminatorPolicy {
    pub(crate) fn terminates_splice(self) -> bool {
        matches!(self, TerminatorPolicy::Always)
    }
}

/// Configuration for a [`BufferPool`](crate::BufferPool).
///
/// # Examples
///
/// ```rust
/// use textbuf::{BufferPool, PoolOptions, TerminatorPolicy};
///
/// let pool = BufferPool::new(PoolOptions {
///     terminator: TerminatorPolicy::SetOnly,
///     ..Default::default()
/// });
/// assert_eq!(pool.options().growth_floor, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolOptions {
    /// Baseline capacity for the doubling growth path.
    ///
    /// When a buffer must grow, its new capacity starts at
    /// `max(capacity * 2, growth_floor)` and keeps doubling until the request
    /// fits. Values below 1 are treated as 1.
    ///
    /// # Default
    ///
    /// `64`
    pub growth_floor: usize,

    /// Which mutations write the trailing zero byte.
    ///
    /// # Default
    ///
    /// [`TerminatorPolicy::Always`]
    pub terminator: TerminatorPolicy,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            growth_floor: DEFAULT_GROWTH_FLOOR,
            terminator: TerminatorPolicy::default(),
        }
    }
}
