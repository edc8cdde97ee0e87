// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record handlers.
//!
//! A record is a struct with named fields. [`RecordBuilder`] compiles an
//! ordered field table once per record type: every field resolves its
//! element visitor at build time and is reached through a plain accessor
//! function. `#[derive(Inspect)]` generates the builder calls.
//!
//! ```
//! use typewalk::{BuildError, Category, HandlerCache, Inspect, RecordBuilder, TypeHandler};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//!     label: String,
//! }
//!
//! impl Inspect for Point {
//!     const CATEGORY: Category = Category::Record;
//!
//!     fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
//!         RecordBuilder::new(cache)
//!             .field("x", |p: &mut Point| &mut p.x)
//!             .field("y", |p: &mut Point| &mut p.y)
//!             .field_since("label", 2, |p: &mut Point| &mut p.label)
//!             .build()
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::{BuildError, InspectError};
use crate::handler::{
    Category, CreateFn, DescribeFn, HandlerCache, Inspect, SchemaVersion, TypeHandler,
};
use crate::inspector::Inspector;

/// Projection from a record to one of its fields.
pub type FieldAccessor<T, F> = fn(&mut T) -> &mut F;

type FieldDescribeFn<T> =
    Box<dyn Fn(&mut dyn Inspector, &mut T, SchemaVersion) -> Result<(), InspectError> + Send + Sync>;

type FieldCreateFn<T> = Box<
    dyn Fn(&mut dyn Inspector, &mut T, SchemaVersion, bool) -> Result<(), InspectError>
        + Send
        + Sync,
>;

struct FieldSlot<T> {
    name: &'static str,
    since: SchemaVersion,
    describe: FieldDescribeFn<T>,
    create: FieldCreateFn<T>,
}

impl<T> FieldSlot<T> {
    fn present_in(&self, version: SchemaVersion) -> bool {
        version >= self.since
    }
}

/// Ordered field table compiled into a record handler.
///
/// Errors (duplicate names, failed field builds) are latched and reported
/// by [`RecordBuilder::build`].
#[must_use]
pub struct RecordBuilder<'c, T> {
    cache: &'c HandlerCache,
    fields: Vec<FieldSlot<T>>,
    error: Option<BuildError>,
}

impl<'c, T: Inspect> RecordBuilder<'c, T> {
    pub fn new(cache: &'c HandlerCache) -> Self {
        Self {
            cache,
            fields: Vec::new(),
            error: None,
        }
    }

    /// Field present in every schema version.
    pub fn field<F: Inspect>(self, name: &'static str, accessor: FieldAccessor<T, F>) -> Self {
        self.field_since(name, 0, accessor)
    }

    /// Field present from schema version `since` onwards.
    ///
    /// At lower versions it is not traversed and keeps its current value
    /// (its default on construction).
    pub fn field_since<F: Inspect>(
        mut self,
        name: &'static str,
        since: SchemaVersion,
        accessor: FieldAccessor<T, F>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.fields.iter().any(|slot| slot.name == name) {
            self.error = Some(BuildError::InvalidRecord {
                type_name: std::any::type_name::<T>(),
                reason: format!("duplicate field `{}`", name),
            });
            return self;
        }

        let visitor = match self.cache.resolve_visitor::<F>() {
            Ok(visitor) => Arc::new(visitor),
            Err(e) => {
                self.error = Some(e);
                return self;
            }
        };

        let create_visitor = Arc::clone(&visitor);
        self.fields.push(FieldSlot {
            name,
            since,
            describe: Box::new(
                move |inspector: &mut dyn Inspector, record: &mut T, version: SchemaVersion| {
                    visitor.visit(inspector, accessor(record), version)
                },
            ),
            create: Box::new(
                move |inspector: &mut dyn Inspector,
                      record: &mut T,
                      version: SchemaVersion,
                      is_latest: bool| {
                    *accessor(record) = create_visitor.create(inspector, version, is_latest)?;
                    Ok(())
                },
            ),
        });
        self
    }

    /// Compile the field table into a handler.
    pub fn build(self) -> Result<TypeHandler<T>, BuildError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        log::debug!(
            "[RecordBuilder] {} compiled with {} fields",
            std::any::type_name::<T>(),
            self.fields.len()
        );

        let fields: Arc<[FieldSlot<T>]> = self.fields.into();
        let create_fields = Arc::clone(&fields);

        let create: CreateFn<T> = Box::new(
            move |inspector: &mut dyn Inspector, version: SchemaVersion, is_latest: bool| {
                let mut record = T::default();
                for slot in create_fields.iter().filter(|slot| slot.present_in(version)) {
                    inspector.enter_field(slot.name)?;
                    (slot.create)(inspector, &mut record, version, is_latest)?;
                    inspector.leave_field(slot.name)?;
                }
                Ok(record)
            },
        );

        let describe: DescribeFn<T> = Box::new(
            move |inspector: &mut dyn Inspector, record: &mut T, version: SchemaVersion| {
                for slot in fields.iter().filter(|slot| slot.present_in(version)) {
                    inspector.enter_field(slot.name)?;
                    (slot.describe)(inspector, record, version)?;
                    inspector.leave_field(slot.name)?;
                }
                Ok(())
            },
        );

        Ok(TypeHandler::new(Category::Record, create, describe))
    }
}
