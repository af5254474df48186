//! Collection Builders and the Builder Registry
//!
//! Builders decouple the lazy enumeration engine from the concrete result
//! containers it can be drained into. The engine only ever sees the two
//! operations of [`CollectionBuilder`] — create a fresh mutable container,
//! append one element — and never inspects the container itself.
//!
//! Two builder flavours exist:
//!
//! - Statically-typed builders ([`VecBuilder`], [`SetBuilder`]) for call
//!   sites that know the target container at compile time.
//! - Shape-keyed builders behind [`BuilderRegistry`], for call sites that
//!   carry the requested [`TargetShape`] as a runtime value (the facade
//!   uses this to reproduce the shape of the source collection). The
//!   registry is an explicit object with no process-global state; share it
//!   via [`BuilderRegistry::shared`] where several components need the
//!   same configuration.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// The requested shape of a materialized result container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetShape {
    /// Array-like: preserves element order and duplicates.
    Ordered,
    /// Set-like: unordered, duplicates collapse.
    Unique,
}

/// Errors that can occur while registering or looking up builders.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A builder is already registered for the shape; use
    /// [`BuilderRegistry::replace`] to override it.
    #[error("a builder is already registered for shape {0:?}")]
    DuplicateShape(TargetShape),

    /// No builder has been registered for the shape.
    #[error("no builder registered for shape {0:?}")]
    UnknownShape(TargetShape),

    /// The registry lock was poisoned by a panic in another thread.
    #[error("builder registry lock was poisoned")]
    LockPoisoned,
}

/// Builds a concrete mutable container from a stream of elements.
///
/// The consumer drives the pair of operations in a loop: one container per
/// materialization, one `append` per produced element.
pub trait CollectionBuilder<T> {
    /// The container this builder produces.
    type Container;

    /// Creates a fresh, empty mutable container.
    fn new_container(&self) -> Self::Container;

    /// Appends one element to a container created by this builder.
    fn append(&self, container: &mut Self::Container, element: T);
}

/// Builder for array-like results.
#[derive(Debug, Clone, Copy, Default)]
pub struct VecBuilder;

impl<T> CollectionBuilder<T> for VecBuilder {
    type Container = Vec<T>;

    fn new_container(&self) -> Vec<T> {
        Vec::new()
    }

    fn append(&self, container: &mut Vec<T>, element: T) {
        container.push(element);
    }
}

/// Builder for set-like results.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetBuilder;

impl<T: Eq + Hash> CollectionBuilder<T> for SetBuilder {
    type Container = std::collections::HashSet<T>;

    fn new_container(&self) -> std::collections::HashSet<T> {
        std::collections::HashSet::new()
    }

    fn append(&self, container: &mut std::collections::HashSet<T>, element: T) {
        container.insert(element);
    }
}

/// A shape-erased materialized container.
///
/// Produced by registry-driven materialization, where the target shape is
/// a runtime value rather than a compile-time type.
#[derive(Debug, Clone)]
pub enum Materialized<T> {
    /// Order-preserving result.
    Ordered(Vec<T>),
    /// Duplicate-collapsing result.
    Unique(std::collections::HashSet<T>),
}

impl<T> Materialized<T> {
    /// The shape of this container.
    pub fn shape(&self) -> TargetShape {
        match self {
            Materialized::Ordered(_) => TargetShape::Ordered,
            Materialized::Unique(_) => TargetShape::Unique,
        }
    }

    /// Number of contained elements.
    pub fn len(&self) -> usize {
        match self {
            Materialized::Ordered(v) => v.len(),
            Materialized::Unique(s) => s.len(),
        }
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwraps into a `Vec`. For a `Unique` container the element order is
    /// arbitrary.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Materialized::Ordered(v) => v,
            Materialized::Unique(s) => s.into_iter().collect(),
        }
    }

    /// Unwraps into a `HashSet`, collapsing duplicates from an `Ordered`
    /// container.
    pub fn into_set(self) -> std::collections::HashSet<T>
    where
        T: Eq + Hash,
    {
        match self {
            Materialized::Ordered(v) => v.into_iter().collect(),
            Materialized::Unique(s) => s,
        }
    }
}

/// Dyn-safe builder used by the registry: produces and fills the
/// shape-erased [`Materialized`] container.
pub trait ShapedBuilder<T>: Send + Sync {
    /// Creates a fresh container of this builder's shape.
    fn new_container(&self) -> Materialized<T>;

    /// Appends one element to a container created by this builder.
    fn append(&self, container: &mut Materialized<T>, element: T);
}

/// Default registry builder for [`TargetShape::Ordered`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedShapeBuilder;

impl<T: Eq + Hash + Send + Sync> ShapedBuilder<T> for OrderedShapeBuilder {
    fn new_container(&self) -> Materialized<T> {
        Materialized::Ordered(Vec::new())
    }

    fn append(&self, container: &mut Materialized<T>, element: T) {
        match container {
            Materialized::Ordered(v) => v.push(element),
            Materialized::Unique(s) => {
                s.insert(element);
            }
        }
    }
}

/// Default registry builder for [`TargetShape::Unique`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueShapeBuilder;

impl<T: Eq + Hash + Send + Sync> ShapedBuilder<T> for UniqueShapeBuilder {
    fn new_container(&self) -> Materialized<T> {
        Materialized::Unique(std::collections::HashSet::new())
    }

    fn append(&self, container: &mut Materialized<T>, element: T) {
        match container {
            Materialized::Ordered(v) => v.push(element),
            Materialized::Unique(s) => {
                s.insert(element);
            }
        }
    }
}

/// A thread-safe registry shared behind an `Arc`.
pub type SharedBuilderRegistry<T> = Arc<BuilderRegistry<T>>;

/// Maps target shapes to the builders that realize them.
///
/// Owned by whichever facade or application component needs it; there is
/// deliberately no global default instance.
pub struct BuilderRegistry<T> {
    builders: RwLock<HashMap<TargetShape, Arc<dyn ShapedBuilder<T>>>>,
}

impl<T> BuilderRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { builders: RwLock::new(HashMap::new()) }
    }

    /// Registers a builder for a shape.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateShape`] if the shape already has a
    /// builder, or [`RegistryError::LockPoisoned`] if the registry lock was
    /// poisoned.
    pub fn register<B>(&self, shape: TargetShape, builder: B) -> Result<(), RegistryError>
    where
        B: ShapedBuilder<T> + 'static,
    {
        let mut map = match self.builders.write() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("builder registry lock was poisoned, rejecting registration");
                return Err(RegistryError::LockPoisoned);
            }
        };
        if map.contains_key(&shape) {
            return Err(RegistryError::DuplicateShape(shape));
        }
        map.insert(shape, Arc::new(builder));
        Ok(())
    }

    /// Registers a builder for a shape, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] if the registry lock was
    /// poisoned.
    pub fn replace<B>(&self, shape: TargetShape, builder: B) -> Result<(), RegistryError>
    where
        B: ShapedBuilder<T> + 'static,
    {
        let mut map = match self.builders.write() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("builder registry lock was poisoned, rejecting registration");
                return Err(RegistryError::LockPoisoned);
            }
        };
        map.insert(shape, Arc::new(builder));
        Ok(())
    }

    /// Looks up the builder registered for a shape.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownShape`] if no builder is registered
    /// for the shape, or [`RegistryError::LockPoisoned`] if the registry
    /// lock was poisoned.
    pub fn lookup(&self, shape: TargetShape) -> Result<Arc<dyn ShapedBuilder<T>>, RegistryError> {
        let map = match self.builders.read() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("builder registry lock was poisoned, rejecting lookup");
                return Err(RegistryError::LockPoisoned);
            }
        };
        map.get(&shape).cloned().ok_or(RegistryError::UnknownShape(shape))
    }
}

impl<T: Eq + Hash + Send + Sync + 'static> BuilderRegistry<T> {
    /// Creates a registry pre-populated with the default builders for both
    /// shapes.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        // A fresh registry cannot hold duplicates or a poisoned lock.
        let _ = registry.register(TargetShape::Ordered, OrderedShapeBuilder);
        let _ = registry.register(TargetShape::Unique, UniqueShapeBuilder);
        registry
    }

    /// Creates a pre-populated registry wrapped in an `Arc` for sharing.
    pub fn shared() -> SharedBuilderRegistry<T> {
        Arc::new(Self::with_defaults())
    }
}

impl<T> Default for BuilderRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
