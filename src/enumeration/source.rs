//! Base enumerator over an arbitrary source sequence.

use super::{EnumerationError, PullEnumerator, SCRATCH_CAPACITY};

/// Adapts any [`Iterator`] to the batch-pull protocol.
///
/// This is the base of every chain: it stages up to [`SCRATCH_CAPACITY`]
/// elements per pull in its own scratch buffer. The source is consumed by
/// this enumerator alone; wrapping the same collection twice requires two
/// independent iterators.
pub struct SourceEnumeration<I: Iterator> {
    source: I,
    scratch: Vec<I::Item>,
    exhausted: bool,
}

impl<I: Iterator> SourceEnumeration<I> {
    /// Wraps a source iterator.
    pub fn new(source: I) -> Self {
        Self {
            source,
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
            exhausted: false,
        }
    }
}

impl<I: Iterator> PullEnumerator for SourceEnumeration<I> {
    type Item = I::Item;

    fn pull_batch(&mut self) -> Result<&[I::Item], EnumerationError> {
        if self.exhausted {
            return Ok(&[]);
        }
        self.scratch.clear();
        while self.scratch.len() < SCRATCH_CAPACITY {
            match self.source.next() {
                Some(element) => self.scratch.push(element),
                None => break,
            }
        }
        if self.scratch.is_empty() {
            self.exhausted = true;
        }
        Ok(&self.scratch)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_are_capped_at_scratch_capacity() {
        let mut e = SourceEnumeration::new(0..40u32);

        let first: Vec<u32> = e.pull_batch().unwrap().to_vec();
        assert_eq!(first, (0..16).collect::<Vec<_>>());

        let second: Vec<u32> = e.pull_batch().unwrap().to_vec();
        assert_eq!(second, (16..32).collect::<Vec<_>>());

        let third: Vec<u32> = e.pull_batch().unwrap().to_vec();
        assert_eq!(third, (32..40).collect::<Vec<_>>());
    }

    #[test]
    fn exhaustion_is_terminal_and_idempotent() {
        let mut e = SourceEnumeration::new(0..3u32);
        assert_eq!(e.pull_batch().unwrap().len(), 3);
        assert!(e.pull_batch().unwrap().is_empty());
        assert!(e.is_exhausted());
        assert!(e.pull_batch().unwrap().is_empty());
        assert!(e.pull_batch().unwrap().is_empty());
    }

    #[test]
    fn empty_source_is_exhausted_on_first_pull() {
        let mut e = SourceEnumeration::new(std::iter::empty::<String>());
        assert!(e.pull_batch().unwrap().is_empty());
        assert!(e.is_exhausted());
    }
}
