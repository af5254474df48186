//! Prelude for the functional collection API.
//!
//! Re-exports the commonly used types from the enumeration engine, the
//! builder layer, and the collection facade so call sites need a single
//! import.

pub use crate::builder::{
    BuilderRegistry, CollectionBuilder, Materialized, RegistryError, SetBuilder,
    SharedBuilderRegistry, ShapedBuilder, TargetShape, VecBuilder,
};
pub use crate::collection::{coll, Coll, KeyLookup, MaterializeError, Pipeline};
pub use crate::enumeration::{
    EnumerationError, FilterEnumeration, FlatMapEnumeration, PullEnumerator, SourceEnumeration,
    TransformEnumeration, SCRATCH_CAPACITY,
};
