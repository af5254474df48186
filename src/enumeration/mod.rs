//! Lazy Batch-Pull Enumeration Engine
//!
//! Core iteration system for the crate: a small family of composable
//! enumerators that wrap an underlying source and expose a shared
//! batch-pull protocol. A consumer repeatedly asks the outermost enumerator
//! for the next batch of elements; each enumerator pulls from the one it
//! wraps, applies its own stage of computation, and stages results in a
//! private fixed-capacity scratch buffer.
//!
//! Key properties of the protocol:
//!
//! - A batch never exceeds [`SCRATCH_CAPACITY`] elements.
//! - A returned batch borrows the enumerator's scratch buffer and is valid
//!   only until the next [`PullEnumerator::pull_batch`] call; the borrow
//!   checker enforces this at compile time.
//! - An empty batch means the enumerator is exhausted, and exhaustion is
//!   terminal: every subsequent pull also returns an empty batch.
//! - Chains are single-pass. Re-iterating a pipeline means building a fresh
//!   chain from the original source.

mod filter;
mod flat_map;
mod source;
mod transform;

pub use filter::FilterEnumeration;
pub use flat_map::FlatMapEnumeration;
pub use source::SourceEnumeration;
pub use transform::TransformEnumeration;

use thiserror::Error;

/// Number of scratch-buffer slots owned by each enumerator.
///
/// No single pull can expose more elements than this.
pub const SCRATCH_CAPACITY: usize = 16;

/// Errors surfaced by the batch-pull protocol.
///
/// There is no retry or resume contract: after an error escapes
/// `pull_batch`, the chain is undefined for further use and should be
/// discarded.
#[derive(Debug, Error)]
pub enum EnumerationError {
    /// A user-supplied transform, predicate, or expansion function failed
    /// while processing an element. Elements already processed before the
    /// failing one are not re-delivered (at-most-once evaluation).
    #[error("user function failed: {reason}")]
    UserFunction { reason: String },

    /// The batch-pull contract was violated, e.g. an upstream handed over
    /// a batch larger than the scratch capacity. This is a defect in an
    /// enumerator implementation, not a recoverable condition.
    #[error("enumeration protocol violated: {reason}")]
    Protocol { reason: String },
}

impl EnumerationError {
    /// Creates a [`EnumerationError::UserFunction`] with the given reason.
    pub fn user_function(reason: impl Into<String>) -> Self {
        EnumerationError::UserFunction { reason: reason.into() }
    }

    /// Creates a [`EnumerationError::Protocol`] with the given reason.
    pub fn protocol(reason: impl Into<String>) -> Self {
        EnumerationError::Protocol { reason: reason.into() }
    }
}

/// The batch-pull iteration contract shared by all enumerators.
///
/// Implementations are stateful, single-pass walks over exactly one
/// upstream sequence established at construction. They are not safe for
/// concurrent pulls from multiple threads on the same instance; independent
/// readers need independent chains.
pub trait PullEnumerator {
    /// Element type exposed by this enumerator.
    type Item;

    /// Pulls the next batch of elements.
    ///
    /// The returned slice borrows this enumerator's scratch buffer and
    /// remains valid only until the next call; copy elements out to retain
    /// them. An empty slice signals exhaustion, and repeated calls after
    /// exhaustion keep returning an empty slice.
    ///
    /// # Errors
    ///
    /// Propagates [`EnumerationError::UserFunction`] from user-supplied
    /// functions and [`EnumerationError::Protocol`] on contract violations.
    fn pull_batch(&mut self) -> Result<&[Self::Item], EnumerationError>;

    /// Whether this enumerator has reached its terminal exhausted state.
    fn is_exhausted(&self) -> bool;
}

impl<E: PullEnumerator + ?Sized> PullEnumerator for Box<E> {
    type Item = E::Item;

    fn pull_batch(&mut self) -> Result<&[Self::Item], EnumerationError> {
        (**self).pull_batch()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Refill loop shared by the staged enumerators.
///
/// Pulls upstream batches and feeds each through `stage` until the stage
/// produces at least one element into `scratch` or the upstream is truly
/// exhausted. Returns `false` on upstream exhaustion. A stage that yields
/// nothing for a given batch (a filter with no matches) therefore never
/// reads as false exhaustion to the consumer.
pub(crate) fn drive_stage<E, T, S>(
    upstream: &mut E,
    scratch: &mut Vec<T>,
    mut stage: S,
) -> Result<bool, EnumerationError>
where
    E: PullEnumerator,
    S: FnMut(&[E::Item], &mut Vec<T>) -> Result<(), EnumerationError>,
{
    loop {
        let batch = upstream.pull_batch()?;
        if batch.is_empty() {
            return Ok(false);
        }
        if batch.len() > SCRATCH_CAPACITY {
            return Err(EnumerationError::protocol(format!(
                "upstream batch of {} elements exceeds the scratch capacity of {}",
                batch.len(),
                SCRATCH_CAPACITY
            )));
        }
        stage(batch, scratch)?;
        if !scratch.is_empty() {
            return Ok(true);
        }
    }
}
