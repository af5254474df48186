//! Key-based convenience variants.
//!
//! Structured elements often make a pipeline's transform or predicate a
//! plain property access. [`KeyLookup`] names that capability explicitly,
//! and the `*_by_key` operations build the corresponding pipelines without
//! the caller writing the closures out.

use std::collections::HashMap;
use std::hash::Hash;

use crate::enumeration::EnumerationError;

use super::{Coll, Pipeline};

/// Capability trait for elements that expose named values.
///
/// Returning `None` signals that the value is absent (or false-y, for
/// flag-like properties); [`Pipeline::filter_by_key`] drops such elements,
/// while [`Pipeline::map_by_key`] and [`Pipeline::group_by_key`] treat
/// them as a user-function failure.
pub trait KeyLookup {
    /// The type of the values this element exposes.
    type Value;

    /// Looks up the value for `key` on this element.
    fn value_for_key(&self, key: &str) -> Option<Self::Value>;
}

fn missing_key(key: &str) -> EnumerationError {
    EnumerationError::user_function(format!("no value for key '{key}'"))
}

impl<T> Pipeline<T>
where
    T: KeyLookup + Clone + 'static,
{
    /// Maps every element to its value for `key`. An element without a
    /// value for the key fails the pipeline.
    pub fn map_by_key(self, key: impl Into<String>) -> Pipeline<T::Value>
    where
        T::Value: Clone + 'static,
    {
        let key = key.into();
        self.try_map(move |element| element.value_for_key(&key).ok_or_else(|| missing_key(&key)))
    }

    /// Keeps only the elements that have a value for `key`.
    pub fn filter_by_key(self, key: impl Into<String>) -> Pipeline<T> {
        let key = key.into();
        self.filter(move |element| element.value_for_key(&key).is_some())
    }

    /// Groups elements by their value for `key`. An element without a
    /// value for the key fails the grouping.
    pub fn group_by_key(
        self,
        key: impl Into<String>,
    ) -> Result<HashMap<T::Value, Vec<T>>, EnumerationError>
    where
        T::Value: Eq + Hash,
    {
        let key = key.into();
        self.try_group_by(move |element| element.value_for_key(&key).ok_or_else(|| missing_key(&key)))
    }
}

impl<T> Coll<T>
where
    T: KeyLookup + Clone + 'static,
{
    /// See [`Pipeline::map_by_key`].
    pub fn map_by_key(&self, key: impl Into<String>) -> Pipeline<T::Value>
    where
        T::Value: Clone + 'static,
    {
        self.pipeline().map_by_key(key)
    }

    /// See [`Pipeline::filter_by_key`].
    pub fn filter_by_key(&self, key: impl Into<String>) -> Pipeline<T> {
        self.pipeline().filter_by_key(key)
    }

    /// See [`Pipeline::group_by_key`].
    pub fn group_by_key(
        &self,
        key: impl Into<String>,
    ) -> Result<HashMap<T::Value, Vec<T>>, EnumerationError>
    where
        T::Value: Eq + Hash,
    {
        self.pipeline().group_by_key(key)
    }
}
