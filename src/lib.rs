//! # funcoll
//!
//! Lazy functional operations — map, filter, flatMap, reduce, grouping,
//! predicates — over arbitrary enumerable collections. A pipeline of
//! transformations executes in a single pass over the original source,
//! producing intermediate results on demand instead of allocating a new
//! collection at every stage.
//!
//! The crate is organized in three layers:
//!
//! - [`enumeration`] — the core engine: composable enumerators sharing a
//!   batch-pull protocol, each staging computed elements in a private
//!   fixed-capacity scratch buffer.
//! - [`builder`] — constructs concrete result containers from a drained
//!   chain, including a shape-keyed [`builder::BuilderRegistry`].
//! - [`collection`] — the public facade: [`Coll`] snapshots plus the
//!   fluent [`Pipeline`] API, and key-based convenience variants for
//!   elements implementing [`collection::KeyLookup`].
//!
//! ```
//! use funcoll::coll;
//!
//! let sum = coll(vec![1, 2, 3, 4])
//!     .filter(|x| x % 2 == 0)
//!     .reduce(0, |acc, x| acc + x)
//!     .unwrap();
//! assert_eq!(sum, 6);
//! ```

pub mod builder;
pub mod collection;
pub mod enumeration;
pub mod prelude;

pub use collection::{coll, Coll, Pipeline};
pub use enumeration::EnumerationError;
