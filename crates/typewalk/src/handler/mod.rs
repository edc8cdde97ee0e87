// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled per-type handlers and the cache that owns them.
//!
//! A [`TypeHandler<T>`] is the constructor/describer pair for one concrete
//! type. Handlers are built once through [`Inspect::build_handler`], published
//! into a [`HandlerCache`] and reused for the lifetime of that cache. All
//! per-element decisions (which visitor to call for an element type, whether
//! a `u8` array takes the bulk path) are taken at build time and baked into
//! the handler closures.

pub mod cache;
pub mod visitor;

pub use cache::{CacheStats, HandlerCache};
pub use visitor::FieldVisitor;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{BuildError, InspectError};
use crate::inspector::{Inspector, ScalarKind};

/// Schema version threaded unchanged through every nested call.
pub type SchemaVersion = u32;

/// Constructor: build a fresh value purely from the inspector.
pub type CreateFn<T> = Box<
    dyn Fn(&mut dyn Inspector, SchemaVersion, bool) -> Result<T, InspectError> + Send + Sync,
>;

/// Describer: exchange an existing value with the inspector, mutating it in place.
pub type DescribeFn<T> = Box<
    dyn Fn(&mut dyn Inspector, &mut T, SchemaVersion) -> Result<(), InspectError> + Send + Sync,
>;

/// Describer for a value held behind an untyped slot.
pub type BoxedDescribeFn = Arc<
    dyn Fn(&mut dyn Inspector, &mut Box<dyn Any + Send + Sync>, SchemaVersion) -> Result<(), InspectError>
        + Send
        + Sync,
>;

/// Constructor producing a value behind an untyped slot.
pub type BoxedCreateFn = Arc<
    dyn Fn(&mut dyn Inspector, SchemaVersion, bool) -> Result<Box<dyn Any + Send + Sync>, InspectError>
        + Send
        + Sync,
>;

/// Direct scalar exchange, bypassing handler indirection.
pub type ScalarVisitFn<T> = fn(&mut dyn Inspector, &mut T) -> Result<(), InspectError>;

/// Shape category used to pick a builder and a visitor strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Primitive exchanged in a single inspector call.
    Scalar(ScalarKind),
    /// Open enum projected through its underlying integral type.
    Enum(ScalarKind),
    /// Rectangular array of the given rank (nullable).
    Array { rank: usize },
    /// Index-addressable growable sequence.
    List,
    /// Non-indexable collection; `read_only` containers cannot be described.
    Collection { read_only: bool },
    /// Struct with named fields.
    Record,
    /// Untyped slot resolved through the boxed registry by type tag.
    Dynamic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "scalar<{}>", kind),
            Self::Enum(kind) => write!(f, "enum<{}>", kind),
            Self::Array { rank } => write!(f, "array[rank {}]", rank),
            Self::List => f.write_str("list"),
            Self::Collection { read_only: false } => f.write_str("collection"),
            Self::Collection { read_only: true } => f.write_str("collection(read-only)"),
            Self::Record => f.write_str("record"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// A type the engine can compile a handler for.
///
/// Implemented by the crate for scalars, arrays, lists and collections;
/// records use `#[derive(Inspect)]`, enums use [`inspect_enum!`](crate::inspect_enum).
pub trait Inspect: Default + Send + Sync + 'static {
    /// Shape category of this type.
    const CATEGORY: Category;

    /// Compile the constructor/describer pair.
    ///
    /// Called at most once per cache in the absence of first-use races;
    /// nested element handlers must be resolved through `cache`.
    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError>;

    /// Direct exchange function for scalar types.
    #[doc(hidden)]
    fn scalar_visitor() -> Option<ScalarVisitFn<Self>> {
        None
    }
}

/// Immutable constructor/describer pair for one concrete type.
pub struct TypeHandler<T> {
    type_name: &'static str,
    category: Category,
    create: CreateFn<T>,
    describe: DescribeFn<T>,
    describe_boxed: Option<BoxedDescribeFn>,
}

impl<T: 'static> TypeHandler<T> {
    /// Assemble a handler from compiled closures.
    #[must_use]
    pub fn new(category: Category, create: CreateFn<T>, describe: DescribeFn<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            category,
            create,
            describe,
            describe_boxed: None,
        }
    }

    /// Attach a specialised describer for values held in a [`Dynamic`](crate::Dynamic) slot.
    #[must_use]
    pub fn with_boxed_describer(mut self, describe_boxed: BoxedDescribeFn) -> Self {
        self.describe_boxed = Some(describe_boxed);
        self
    }

    /// Build a fresh value purely from the inspector.
    pub fn create(
        &self,
        inspector: &mut dyn Inspector,
        version: SchemaVersion,
        is_latest: bool,
    ) -> Result<T, InspectError> {
        (self.create)(inspector, version, is_latest)
    }

    /// Exchange `value` with the inspector, mutating it to match the authoritative result.
    pub fn describe(
        &self,
        inspector: &mut dyn Inspector,
        value: &mut T,
        version: SchemaVersion,
    ) -> Result<(), InspectError> {
        (self.describe)(inspector, value, version)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    pub(crate) fn boxed_describer(&self) -> Option<BoxedDescribeFn> {
        self.describe_boxed.clone()
    }
}

impl<T> fmt::Debug for TypeHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandler")
            .field("type_name", &self.type_name)
            .field("category", &self.category)
            .field("boxed", &self.describe_boxed.is_some())
            .finish()
    }
}
