//! Functional Collection Facade
//!
//! Public surface of the crate: [`Coll`] snapshots a source collection into
//! an immutable, cheaply-shared backing store, and [`Pipeline`] chains lazy
//! transformations over it. Intermediate operations (map, filter, flatMap,
//! slice) only assemble enumerators; nothing is computed until a terminal
//! operation (reduce, group_by, to_vec, find, …) pulls the chain, and
//! short-circuiting terminals stop pulling as soon as their answer is
//! known.
//!
//! Pipelines are single-pass: every intermediate and terminal operation
//! consumes the pipeline. The snapshot behind a [`Coll`] is reusable, so
//! starting another pipeline from the same `Coll` is cheap and sees the
//! same elements.
//!
//! ```
//! use funcoll::coll;
//!
//! let result = coll([1, 2, 3, 4, 5])
//!     .filter(|x| x % 2 == 0)
//!     .map(|x| x * 10)
//!     .flat_map(|x| [*x, x + 1])
//!     .to_vec()
//!     .unwrap();
//! assert_eq!(result, vec![20, 21, 40, 41]);
//! ```

mod keyed;

pub use keyed::KeyLookup;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::ops::Range;

use im::Vector;
use itertools::Itertools;
use thiserror::Error;

use crate::builder::{
    BuilderRegistry, CollectionBuilder, Materialized, RegistryError, SetBuilder, TargetShape,
    VecBuilder,
};
use crate::enumeration::{
    EnumerationError, FilterEnumeration, FlatMapEnumeration, PullEnumerator, SourceEnumeration,
    TransformEnumeration, SCRATCH_CAPACITY,
};

/// Errors that can occur while materializing a pipeline through the
/// builder registry.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The enumeration chain failed while being drained.
    #[error("enumeration failed during materialization: {0}")]
    Enumeration(#[from] EnumerationError),
    /// The registry could not supply a builder for the requested shape.
    #[error("builder lookup failed: {0}")]
    Registry(#[from] RegistryError),
}

/// An immutable snapshot of a source collection, with functional
/// operations.
///
/// Construction copies the source into a structurally-shared backing
/// store, so the snapshot is unaffected by later changes to the source and
/// can serve any number of independent iteration passes. The snapshot also
/// records the source's [`TargetShape`] so that registry-driven
/// materialization can reproduce it: a pipeline started from a `Vec`
/// materializes array-like, one started from a `HashSet` materializes
/// set-like.
#[derive(Clone)]
pub struct Coll<T> {
    items: Vector<T>,
    shape: TargetShape,
}

impl<T: Clone + fmt::Debug> fmt::Debug for Coll<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coll")
            .field("shape", &self.shape)
            .field("items", &self.items)
            .finish()
    }
}

/// Snapshots any iterable into an ordered [`Coll`].
pub fn coll<T: Clone>(items: impl IntoIterator<Item = T>) -> Coll<T> {
    Coll::from_iter(items)
}

impl<T: Clone> Coll<T> {
    fn from_parts(items: Vector<T>, shape: TargetShape) -> Self {
        Self { items, shape }
    }

    /// Number of elements in the snapshot.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The shape recorded at construction.
    pub fn shape(&self) -> TargetShape {
        self.shape
    }

    /// The first element of an ordered snapshot, or an arbitrary element
    /// of an unordered one. `None` when empty.
    pub fn first(&self) -> Option<T> {
        self.items.front().cloned()
    }

    /// Iterates the snapshot, invoking `f` with each element and a stop
    /// flag. Setting the flag to `true` ends the iteration early.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&T, &mut bool),
    {
        let mut stop = false;
        for element in self.items.iter() {
            f(element, &mut stop);
            if stop {
                break;
            }
        }
    }
}

impl<T: Clone + 'static> Coll<T> {
    /// Starts a fresh lazy pipeline over this snapshot.
    ///
    /// Each call builds an independent enumerator chain; pipelines from
    /// the same snapshot never share iteration state.
    pub fn pipeline(&self) -> Pipeline<T> {
        Pipeline {
            chain: Box::new(SourceEnumeration::new(self.items.clone().into_iter())),
            shape: self.shape,
        }
    }

    /// Lazily transforms every element. See [`Pipeline::map`].
    pub fn map<U, F>(&self, transform: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        F: FnMut(&T) -> U + 'static,
    {
        self.pipeline().map(transform)
    }

    /// Fallible variant of [`Coll::map`].
    pub fn try_map<U, F>(&self, transform: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        F: FnMut(&T) -> Result<U, EnumerationError> + 'static,
    {
        self.pipeline().try_map(transform)
    }

    /// Lazily keeps elements matching the predicate. See
    /// [`Pipeline::filter`].
    pub fn filter<F>(&self, predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.pipeline().filter(predicate)
    }

    /// Fallible variant of [`Coll::filter`].
    pub fn try_filter<F>(&self, predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> Result<bool, EnumerationError> + 'static,
    {
        self.pipeline().try_filter(predicate)
    }

    /// Lazily drops elements matching the predicate. See
    /// [`Pipeline::filter_not`].
    pub fn filter_not<F>(&self, predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.pipeline().filter_not(predicate)
    }

    /// Fallible variant of [`Coll::filter_not`].
    pub fn try_filter_not<F>(&self, predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> Result<bool, EnumerationError> + 'static,
    {
        self.pipeline().try_filter_not(predicate)
    }

    /// Lazily expands every element into a sequence and flattens the
    /// result. See [`Pipeline::flat_map`].
    pub fn flat_map<U, S, F>(&self, expand: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        S: IntoIterator<Item = U> + 'static,
        S::IntoIter: 'static,
        F: FnMut(&T) -> S + 'static,
    {
        self.pipeline().flat_map(expand)
    }

    /// Fallible variant of [`Coll::flat_map`].
    pub fn try_flat_map<U, S, F>(&self, expand: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        S: IntoIterator<Item = U> + 'static,
        S::IntoIter: 'static,
        F: FnMut(&T) -> Result<S, EnumerationError> + 'static,
    {
        self.pipeline().try_flat_map(expand)
    }

    /// Lazily restricts the pipeline to the index range
    /// `start..until`. See [`Pipeline::slice`].
    pub fn slice(&self, start: usize, until: usize) -> Pipeline<T> {
        self.pipeline().slice(start, until)
    }

    /// Folds the snapshot into a single value. See [`Pipeline::reduce`].
    pub fn reduce<A, F>(&self, start: A, op: F) -> Result<A, EnumerationError>
    where
        F: FnMut(A, &T) -> A,
    {
        self.pipeline().reduce(start, op)
    }

    /// Groups elements by a key function. See [`Pipeline::group_by`].
    pub fn group_by<K, F>(&self, key: F) -> Result<HashMap<K, Vec<T>>, EnumerationError>
    where
        K: Eq + Hash,
        F: FnMut(&T) -> K,
    {
        self.pipeline().group_by(key)
    }

    /// First element matching the predicate. See [`Pipeline::find`].
    pub fn find<F>(&self, predicate: F) -> Result<Option<T>, EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        self.pipeline().find(predicate)
    }

    /// Whether any element matches the predicate. See
    /// [`Pipeline::exists`].
    pub fn exists<F>(&self, predicate: F) -> Result<bool, EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        self.pipeline().exists(predicate)
    }

    /// Whether every element matches the predicate. See
    /// [`Pipeline::every`].
    pub fn every<F>(&self, predicate: F) -> Result<bool, EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        self.pipeline().every(predicate)
    }

    /// Splits the snapshot by a predicate. See [`Pipeline::partition`].
    pub fn partition<F>(&self, predicate: F) -> Result<(Vec<T>, Vec<T>), EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        self.pipeline().partition(predicate)
    }

    /// All elements as a `Vec`. See [`Pipeline::to_vec`].
    pub fn to_vec(&self) -> Result<Vec<T>, EnumerationError> {
        self.pipeline().to_vec()
    }

    /// All elements as a `HashSet`. See [`Pipeline::to_set`].
    pub fn to_set(&self) -> Result<HashSet<T>, EnumerationError>
    where
        T: Eq + Hash,
    {
        self.pipeline().to_set()
    }

    /// Joins the elements' display forms with a separator. See
    /// [`Pipeline::join`].
    pub fn join(&self, separator: &str) -> Result<String, EnumerationError>
    where
        T: fmt::Display,
    {
        self.pipeline().join(separator)
    }
}

impl<T: Clone> FromIterator<T> for Coll<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Coll::from_parts(iter.into_iter().collect(), TargetShape::Ordered)
    }
}

impl<T: Clone> From<Vec<T>> for Coll<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for Coll<T> {
    fn from(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

impl<T: Clone + Eq + Hash> From<HashSet<T>> for Coll<T> {
    /// Snapshots a set. The snapshot's traversal order is whatever order
    /// the set yields, fixed at this point and repeatable across passes.
    fn from(items: HashSet<T>) -> Self {
        Coll::from_parts(items.into_iter().collect(), TargetShape::Unique)
    }
}

/// A lazy, single-pass pipeline of transformations over a snapshot.
///
/// Holds the outermost enumerator of the chain plus the target shape
/// carried over from the originating [`Coll`]. Dropping a pipeline without
/// running a terminal operation simply abandons the chain; no cleanup is
/// required.
pub struct Pipeline<T> {
    chain: Box<dyn PullEnumerator<Item = T>>,
    shape: TargetShape,
}

impl<T: Clone + 'static> Pipeline<T> {
    /// Transforms every element with `transform`, preserving order and
    /// count.
    pub fn map<U, F>(self, mut transform: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        F: FnMut(&T) -> U + 'static,
    {
        self.try_map(move |element| Ok(transform(element)))
    }

    /// Like [`Pipeline::map`], with a transform that can fail. The first
    /// failure aborts the terminal operation that drives this pipeline.
    pub fn try_map<U, F>(self, transform: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        F: FnMut(&T) -> Result<U, EnumerationError> + 'static,
    {
        Pipeline {
            chain: Box::new(TransformEnumeration::new(self.chain, transform)),
            shape: self.shape,
        }
    }

    /// Keeps only the elements for which `predicate` returns true.
    pub fn filter<F>(self, mut predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.try_filter(move |element| Ok(predicate(element)))
    }

    /// Like [`Pipeline::filter`], with a predicate that can fail.
    pub fn try_filter<F>(self, predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> Result<bool, EnumerationError> + 'static,
    {
        Pipeline {
            chain: Box::new(FilterEnumeration::new(self.chain, predicate)),
            shape: self.shape,
        }
    }

    /// Keeps only the elements for which `predicate` returns false.
    pub fn filter_not<F>(self, mut predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.try_filter_not(move |element| Ok(predicate(element)))
    }

    /// Like [`Pipeline::filter_not`], with a predicate that can fail.
    pub fn try_filter_not<F>(self, predicate: F) -> Pipeline<T>
    where
        F: FnMut(&T) -> Result<bool, EnumerationError> + 'static,
    {
        Pipeline {
            chain: Box::new(FilterEnumeration::negated(self.chain, predicate)),
            shape: self.shape,
        }
    }

    /// Expands every element into a sequence and flattens the results into
    /// a single pipeline. Elements expanding to an empty sequence
    /// contribute nothing.
    pub fn flat_map<U, S, F>(self, mut expand: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        S: IntoIterator<Item = U> + 'static,
        S::IntoIter: 'static,
        F: FnMut(&T) -> S + 'static,
    {
        self.try_flat_map(move |element| Ok(expand(element)))
    }

    /// Like [`Pipeline::flat_map`], with an expansion that can fail.
    pub fn try_flat_map<U, S, F>(self, expand: F) -> Pipeline<U>
    where
        U: Clone + 'static,
        S: IntoIterator<Item = U> + 'static,
        S::IntoIter: 'static,
        F: FnMut(&T) -> Result<S, EnumerationError> + 'static,
    {
        Pipeline {
            chain: Box::new(FlatMapEnumeration::new(self.chain, expand)),
            shape: self.shape,
        }
    }

    /// Restricts the pipeline to elements with indices in
    /// `start..until`.
    ///
    /// Bounds falling outside the pipeline are clamped rather than being
    /// an error: a start past the end, or `until <= start`, yields an
    /// empty pipeline.
    pub fn slice(self, start: usize, until: usize) -> Pipeline<T> {
        Pipeline {
            chain: Box::new(SliceEnumeration {
                upstream: self.chain,
                scratch: Vec::with_capacity(SCRATCH_CAPACITY),
                skip: start,
                remaining: until.saturating_sub(start),
                exhausted: false,
            }),
            shape: self.shape,
        }
    }

    /// Range form of [`Pipeline::slice`].
    pub fn slice_range(self, range: Range<usize>) -> Pipeline<T> {
        self.slice(range.start, range.end)
    }

    /// Folds the pipeline into a single value, applying `op` to the
    /// accumulator and each element in order.
    pub fn reduce<A, F>(self, start: A, mut op: F) -> Result<A, EnumerationError>
    where
        F: FnMut(A, &T) -> A,
    {
        self.try_reduce(start, move |acc, element| Ok(op(acc, element)))
    }

    /// Like [`Pipeline::reduce`], with an operator that can fail.
    pub fn try_reduce<A, F>(mut self, start: A, mut op: F) -> Result<A, EnumerationError>
    where
        F: FnMut(A, &T) -> Result<A, EnumerationError>,
    {
        let mut acc = start;
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok(acc);
            }
            for element in batch {
                acc = op(acc, element)?;
            }
        }
    }

    /// Groups the elements into a map from key to the elements that
    /// produced that key, preserving encounter order within each group.
    pub fn group_by<K, F>(self, mut key: F) -> Result<HashMap<K, Vec<T>>, EnumerationError>
    where
        K: Eq + Hash,
        F: FnMut(&T) -> K,
    {
        self.try_group_by(move |element| Ok(key(element)))
    }

    /// Like [`Pipeline::group_by`], with a key function that can fail.
    pub fn try_group_by<K, F>(mut self, mut key: F) -> Result<HashMap<K, Vec<T>>, EnumerationError>
    where
        K: Eq + Hash,
        F: FnMut(&T) -> Result<K, EnumerationError>,
    {
        let mut pairs = Vec::new();
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                break;
            }
            for element in batch {
                pairs.push((key(element)?, element.clone()));
            }
        }
        Ok(pairs.into_iter().into_group_map())
    }

    /// Returns the first element matching `predicate`, pulling no further
    /// batches once a match is found.
    pub fn find<F>(mut self, mut predicate: F) -> Result<Option<T>, EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok(None);
            }
            if let Some(element) = batch.iter().find(|&element| predicate(element)) {
                return Ok(Some(element.clone()));
            }
        }
    }

    /// Whether any element matches `predicate`. False on an empty
    /// pipeline.
    pub fn exists<F>(self, predicate: F) -> Result<bool, EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        Ok(self.find(predicate)?.is_some())
    }

    /// Whether every element matches `predicate`. Vacuously true on an
    /// empty pipeline; stops pulling at the first counterexample.
    pub fn every<F>(mut self, mut predicate: F) -> Result<bool, EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok(true);
            }
            if !batch.iter().all(&mut predicate) {
                return Ok(false);
            }
        }
    }

    /// The first element of the pipeline, if any.
    pub fn first(mut self) -> Result<Option<T>, EnumerationError> {
        let batch = self.chain.pull_batch()?;
        Ok(batch.first().cloned())
    }

    /// Counts the elements by draining the pipeline.
    pub fn count(mut self) -> Result<usize, EnumerationError> {
        let mut total = 0;
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok(total);
            }
            total += batch.len();
        }
    }

    /// Splits the pipeline into the elements matching the predicate and
    /// those that do not, preserving relative order in both halves.
    pub fn partition<F>(mut self, mut predicate: F) -> Result<(Vec<T>, Vec<T>), EnumerationError>
    where
        F: FnMut(&T) -> bool,
    {
        let mut matching = Vec::new();
        let mut rest = Vec::new();
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok((matching, rest));
            }
            for element in batch {
                if predicate(element) {
                    matching.push(element.clone());
                } else {
                    rest.push(element.clone());
                }
            }
        }
    }

    /// Joins the elements' display forms with `separator`. Empty pipeline
    /// yields the empty string.
    pub fn join(self, separator: &str) -> Result<String, EnumerationError>
    where
        T: fmt::Display,
    {
        let items = self.to_vec()?;
        Ok(items.iter().join(separator))
    }

    /// Drains the pipeline into a container produced by `builder`.
    pub fn collect_with<B>(mut self, builder: &B) -> Result<B::Container, EnumerationError>
    where
        B: CollectionBuilder<T>,
    {
        let mut container = builder.new_container();
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok(container);
            }
            for element in batch {
                builder.append(&mut container, element.clone());
            }
        }
    }

    /// Drains the pipeline into a `Vec`, preserving order.
    pub fn to_vec(self) -> Result<Vec<T>, EnumerationError> {
        self.collect_with(&VecBuilder)
    }

    /// Drains the pipeline into a `HashSet`, collapsing duplicates.
    pub fn to_set(self) -> Result<HashSet<T>, EnumerationError>
    where
        T: Eq + Hash,
    {
        self.collect_with(&SetBuilder)
    }

    /// Drains the pipeline through the registry builder matching the
    /// carried shape, reproducing the source collection's shape.
    pub fn materialize_with(
        mut self,
        registry: &BuilderRegistry<T>,
    ) -> Result<Materialized<T>, MaterializeError>
    where
        T: Eq + Hash,
    {
        let builder = registry.lookup(self.shape)?;
        let mut container = builder.new_container();
        loop {
            let batch = self.chain.pull_batch()?;
            if batch.is_empty() {
                return Ok(container);
            }
            for element in batch {
                builder.append(&mut container, element.clone());
            }
        }
    }

    /// The shape this pipeline will materialize to through the registry.
    pub fn shape(&self) -> TargetShape {
        self.shape
    }
}

/// Facade-level adapter restricting a chain to an index range.
///
/// Counts elements flowing past, dropping the first `skip` and cutting the
/// chain off after `remaining` have been exposed; once the range is
/// satisfied no further upstream batches are pulled.
struct SliceEnumeration<T> {
    upstream: Box<dyn PullEnumerator<Item = T>>,
    scratch: Vec<T>,
    skip: usize,
    remaining: usize,
    exhausted: bool,
}

impl<T: Clone> PullEnumerator for SliceEnumeration<T> {
    type Item = T;

    fn pull_batch(&mut self) -> Result<&[T], EnumerationError> {
        if self.exhausted {
            return Ok(&[]);
        }
        self.scratch.clear();
        while self.scratch.is_empty() && self.remaining > 0 {
            let batch = self.upstream.pull_batch()?;
            if batch.is_empty() {
                break;
            }
            for element in batch {
                if self.skip > 0 {
                    self.skip -= 1;
                    continue;
                }
                if self.remaining == 0 {
                    break;
                }
                self.scratch.push(element.clone());
                self.remaining -= 1;
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
