//! Predicate filter stage.

use super::{drive_stage, EnumerationError, PullEnumerator, SCRATCH_CAPACITY};

/// Keeps only the upstream elements matching a predicate.
///
/// Matches are compacted into this enumerator's own scratch buffer, so a
/// batch may carry fewer elements than the upstream batch it was drawn
/// from. When an upstream batch yields no matches at all, the shared refill
/// loop pulls further upstream batches instead of reporting a false
/// exhaustion; the consumer only sees an empty batch once the upstream
/// itself is exhausted.
///
/// One consequence: a single `pull_batch` call on a filter whose predicate
/// never matches traverses the entire remaining upstream inside that call.
/// That is the documented trade-off for exact exhaustion reporting.
pub struct FilterEnumeration<E, F>
where
    E: PullEnumerator,
    E::Item: Clone,
    F: FnMut(&E::Item) -> Result<bool, EnumerationError>,
{
    upstream: E,
    predicate: F,
    negate: bool,
    scratch: Vec<E::Item>,
    exhausted: bool,
}

impl<E, F> FilterEnumeration<E, F>
where
    E: PullEnumerator,
    E::Item: Clone,
    F: FnMut(&E::Item) -> Result<bool, EnumerationError>,
{
    /// Wraps `upstream`, keeping elements for which `predicate` is true.
    pub fn new(upstream: E, predicate: F) -> Self {
        Self::with_negation(upstream, predicate, false)
    }

    /// Wraps `upstream`, keeping elements for which `predicate` is false.
    ///
    /// This is the complement filter; it shares the exact mechanism of
    /// [`FilterEnumeration::new`] with the predicate logically negated.
    pub fn negated(upstream: E, predicate: F) -> Self {
        Self::with_negation(upstream, predicate, true)
    }

    fn with_negation(upstream: E, predicate: F, negate: bool) -> Self {
        Self {
            upstream,
            predicate,
            negate,
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
            exhausted: false,
        }
    }
}

impl<E, F> PullEnumerator for FilterEnumeration<E, F>
where
    E: PullEnumerator,
    E::Item: Clone,
    F: FnMut(&E::Item) -> Result<bool, EnumerationError>,
{
    type Item = E::Item;

    fn pull_batch(&mut self) -> Result<&[E::Item], EnumerationError> {
        if self.exhausted {
            return Ok(&[]);
        }
        self.scratch.clear();
        let negate = self.negate;
        let predicate = &mut self.predicate;
        let produced = drive_stage(&mut self.upstream, &mut self.scratch, |batch, out| {
            for element in batch {
                if predicate(element)? != negate {
                    out.push(element.clone());
                }
            }
            Ok(())
        })?;
        if !produced {
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
    fn keeps_exactly_the_matching_elements() {
        let source = SourceEnumeration::new(0..20u32);
        let evens = FilterEnumeration::new(source, |x| Ok(x % 2 == 0));
        assert_eq!(drain(evens), (0..20).filter(|x| x % 2 == 0).collect::<Vec<_>>());
    }

    #[test]
    fn negated_filter_is_the_exact_complement() {
        let kept = drain(FilterEnumeration::new(
            SourceEnumeration::new(0..20u32),
            |x| Ok(x % 3 == 0),
        ));
        let dropped = drain(FilterEnumeration::negated(
            SourceEnumeration::new(0..20u32),
            |x| Ok(x % 3 == 0),
        ));
        let mut merged = [kept, dropped].concat();
        merged.sort_unstable();
        assert_eq!(merged, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn refill_loop_crosses_match_free_upstream_batches() {
        // Only one element in 100 matches; finding it requires the filter
        // to consume several full upstream batches within a single pull.
        let source = SourceEnumeration::new(0..100u32);
        let mut e = FilterEnumeration::new(source, |x| Ok(*x == 95));
        let batch = e.pull_batch().unwrap();
        assert_eq!(batch, &[95]);
        assert!(e.pull_batch().unwrap().is_empty());
    }

    #[test]
    fn never_matching_predicate_reports_plain_exhaustion() {
        let source = SourceEnumeration::new(0..1000u32);
        let mut e = FilterEnumeration::new(source, |_| Ok(false));
        assert!(e.pull_batch().unwrap().is_empty());
        assert!(e.is_exhausted());
        assert!(e.pull_batch().unwrap().is_empty());
    }

    #[test]
    fn predicate_failure_propagates() {
        let source = SourceEnumeration::new(0..10u32);
        let mut e = FilterEnumeration::new(source, |x| {
            if *x == 4 {
                Err(EnumerationError::user_function("predicate blew up"))
            } else {
                Ok(true)
            }
        });
        assert!(matches!(
            e.pull_batch(),
            Err(EnumerationError::UserFunction { .. })
        ));
    }
}
