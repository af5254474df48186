//! 1-to-many expansion stage.

use std::collections::VecDeque;

use super::{EnumerationError, PullEnumerator, SCRATCH_CAPACITY};

/// Expands each upstream element into an inner sequence and flattens the
/// result into a single enumeration.
///
/// The enumerator is a two-state machine. In the *Outer* state no inner
/// sequence is active; advancing pulls the next outer element (buffering
/// upstream batches in a pending queue, since the upstream's scratch is
/// only valid for one pull) and opens an inner sequence over its expansion.
/// In the *Inner* state the active inner sequence is drained into the
/// scratch buffer; each exposed batch is drawn from a single inner
/// sequence. The inner cursor is cleared the moment the inner iterator
/// ends, so it is present exactly while a partially-consumed inner
/// sequence exists.
///
/// An outer element whose expansion is empty contributes nothing to the
/// output: the machine silently advances to the next outer element rather
/// than exposing an empty batch, which would read as false exhaustion.
pub struct FlatMapEnumeration<E, F, S>
where
    E: PullEnumerator,
    E::Item: Clone,
    F: FnMut(&E::Item) -> Result<S, EnumerationError>,
    S: IntoIterator,
{
    upstream: E,
    expand: F,
    pending: VecDeque<E::Item>,
    inner: Option<S::IntoIter>,
    scratch: Vec<S::Item>,
    exhausted: bool,
}

impl<E, F, S> FlatMapEnumeration<E, F, S>
where
    E: PullEnumerator,
    E::Item: Clone,
    F: FnMut(&E::Item) -> Result<S, EnumerationError>,
    S: IntoIterator,
{
    /// Wraps `upstream` with an expansion stage.
    pub fn new(upstream: E, expand: F) -> Self {
        Self {
            upstream,
            expand,
            pending: VecDeque::new(),
            inner: None,
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
            exhausted: false,
        }
    }
}

impl<E, F, S> PullEnumerator for FlatMapEnumeration<E, F, S>
where
    E: PullEnumerator,
    E::Item: Clone,
    F: FnMut(&E::Item) -> Result<S, EnumerationError>,
    S: IntoIterator,
{
    type Item = S::Item;

    fn pull_batch(&mut self) -> Result<&[S::Item], EnumerationError> {
        if self.exhausted {
            return Ok(&[]);
        }
        self.scratch.clear();
        loop {
            // Inner: drain the active inner sequence into the scratch buffer.
            if let Some(inner) = self.inner.as_mut() {
                let mut inner_done = false;
                while self.scratch.len() < SCRATCH_CAPACITY {
                    match inner.next() {
                        Some(element) => self.scratch.push(element),
                        None => {
                            inner_done = true;
                            break;
                        }
                    }
                }
                if inner_done {
                    self.inner = None;
                }
                if !self.scratch.is_empty() {
                    return Ok(&self.scratch);
                }
                continue;
            }

            // Outer: open an inner sequence over the next outer element,
            // refilling the pending queue from upstream when it runs dry.
            if let Some(outer) = self.pending.pop_front() {
                self.inner = Some((self.expand)(&outer)?.into_iter());
                continue;
            }
            let batch = self.upstream.pull_batch()?;
            if batch.is_empty() {
                self.exhausted = true;
                return Ok(&self.scratch);
            }
            self.pending.extend(batch.iter().cloned());
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::super::SourceEnumeration;
    use super::*;

    fn drain<E: PullEnumerator>(mut e: E) -> Vec<E::Item>
    where
        E::Item: Clone,
    {
        let mut all = Vec::new();
        loop {
            let batch = e.pull_batch().unwrap();
            if batch.is_empty() {
                return all;
            }
            all.extend_from_slice(batch);
        }
    }

    #[test]
    fn flattens_in_outer_then_inner_order() {
        let source = SourceEnumeration::new(vec![1u32, 2, 3].into_iter());
        let expanded = FlatMapEnumeration::new(source, |x| Ok(vec![*x, x * 10]));
        assert_eq!(drain(expanded), vec![1, 10, 2, 20, 3, 30]);
    }

    #[test]
    fn empty_expansions_contribute_nothing() {
        let source = SourceEnumeration::new(vec!["a", "b"].into_iter());
        let expanded = FlatMapEnumeration::new(source, |s| {
            Ok(if *s == "a" { vec![1u32, 2] } else { vec![] })
        });
        assert_eq!(drain(expanded), vec![1, 2]);
    }

    #[test]
    fn all_empty_expansions_exhaust_without_false_batches() {
        let source = SourceEnumeration::new(0..50u32);
        let mut e = FlatMapEnumeration::new(source, |_| Ok(Vec::<u32>::new()));
        assert!(e.pull_batch().unwrap().is_empty());
        assert!(e.is_exhausted());
        assert!(e.pull_batch().unwrap().is_empty());
    }

    #[test]
    fn long_inner_sequences_span_multiple_batches() {
        let source = SourceEnumeration::new(0..2u32);
        let mut e = FlatMapEnumeration::new(source, |x| Ok((0..40).map(|i| x * 100 + i).collect::<Vec<_>>()));

        let mut all = Vec::new();
        loop {
            let batch = e.pull_batch().unwrap();
            if batch.is_empty() {
                break;
            }
            assert!(batch.len() <= SCRATCH_CAPACITY);
            all.extend_from_slice(batch);
        }
        let expected: Vec<u32> = (0..2).flat_map(|x| (0..40).map(move |i| x * 100 + i)).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn each_batch_is_drawn_from_a_single_inner_sequence() {
        // Inners of length 5 with capacity 16: every non-empty batch must
        // hold exactly one inner sequence's worth of elements.
        let source = SourceEnumeration::new(0..4u32);
        let mut e = FlatMapEnumeration::new(source, |x| Ok(vec![*x; 5]));
        loop {
            let batch = e.pull_batch().unwrap();
            if batch.is_empty() {
                break;
            }
            assert_eq!(batch.len(), 5);
            assert!(batch.iter().all(|v| *v == batch[0]));
        }
    }

    #[test]
    fn expansion_failure_propagates() {
        let source = SourceEnumeration::new(0..5u32);
        let mut e = FlatMapEnumeration::new(source, |x| {
            if *x == 2 {
                Err(EnumerationError::user_function("cannot expand"))
            } else {
                Ok(vec![*x])
            }
        });
        // Each pull exposes one inner sequence's batch.
        assert_eq!(e.pull_batch().unwrap(), &[0]);
        assert_eq!(e.pull_batch().unwrap(), &[1]);
        assert!(matches!(
            e.pull_batch(),
            Err(EnumerationError::UserFunction { .. })
        ));
    }
}
