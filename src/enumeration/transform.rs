//! 1-to-1 transform stage.

use super::{drive_stage, EnumerationError, PullEnumerator, SCRATCH_CAPACITY};

/// Applies a transform function to each element pulled from upstream.
///
/// The output batch has the same length and relative order as the upstream
/// batch; results are staged in this enumerator's own scratch buffer, never
/// the upstream's. A failing transform aborts the whole pull: elements
/// transformed before the failing one are dropped and are not re-delivered
/// on a later pull, since the upstream cursor has already advanced.
pub struct TransformEnumeration<E, F, U>
where
    E: PullEnumerator,
    F: FnMut(&E::Item) -> Result<U, EnumerationError>,
{
    upstream: E,
    transform: F,
    scratch: Vec<U>,
    exhausted: bool,
}

impl<E, F, U> TransformEnumeration<E, F, U>
where
    E: PullEnumerator,
    F: FnMut(&E::Item) -> Result<U, EnumerationError>,
{
    /// Wraps `upstream` with a transform stage.
    pub fn new(upstream: E, transform: F) -> Self {
        Self {
            upstream,
            transform,
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
            exhausted: false,
        }
    }
}

impl<E, F, U> PullEnumerator for TransformEnumeration<E, F, U>
where
    E: PullEnumerator,
    F: FnMut(&E::Item) -> Result<U, EnumerationError>,
{
    type Item = U;

    fn pull_batch(&mut self) -> Result<&[U], EnumerationError> {
        if self.exhausted {
            return Ok(&[]);
        }
        self.scratch.clear();
        let transform = &mut self.transform;
        let produced = drive_stage(&mut self.upstream, &mut self.scratch, |batch, out| {
            for element in batch {
                out.push(transform(element)?);
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
    fn preserves_order_and_count() {
        let source = SourceEnumeration::new(1..=40u32);
        let doubled = TransformEnumeration::new(source, |x| Ok(x * 2));
        assert_eq!(drain(doubled), (1..=40).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn failure_aborts_the_pull_atomically() {
        let source = SourceEnumeration::new(0..5u32);
        let mut e = TransformEnumeration::new(source, |x| {
            if *x == 3 {
                Err(EnumerationError::user_function("element rejected"))
            } else {
                Ok(x * 10)
            }
        });
        assert!(matches!(
            e.pull_batch(),
            Err(EnumerationError::UserFunction { .. })
        ));
    }

    #[test]
    fn transform_runs_at_most_once_per_element() {
        let source = SourceEnumeration::new(0..50u32);
        let mut calls = 0u32;
        let counted = TransformEnumeration::new(source, move |x| {
            calls += 1;
            assert_eq!(calls - 1, *x, "each element transformed exactly once, in order");
            Ok(*x)
        });
        assert_eq!(drain(counted).len(), 50);
    }
}
