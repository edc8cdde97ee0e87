// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Build-time resolution of the visit entry point for an element type.
//!
//! Container builders resolve one [`FieldVisitor`] per element type while
//! compiling and capture it in their closures; traversal never looks a
//! handler up per element.

use std::sync::{Arc, OnceLock};

use super::cache::{HandlerCache, WeakCache};
use super::{Category, Inspect, ScalarVisitFn, SchemaVersion, TypeHandler};
use crate::error::{BuildError, InspectError};
use crate::inspector::Inspector;

/// Specialised visit entry point for one element type.
pub enum FieldVisitor<E> {
    /// Scalars exchange directly with the inspector.
    Scalar(ScalarVisitFn<E>),
    /// Compiled handler of the element type.
    Compiled(Arc<TypeHandler<E>>),
    /// Element type is still being compiled further up the call stack
    /// (recursive type); resolved from the cache on first use.
    Deferred(DeferredHandler<E>),
}

/// Lazily resolved handler for recursive element types.
pub struct DeferredHandler<E> {
    cache: WeakCache,
    resolved: OnceLock<Arc<TypeHandler<E>>>,
}

impl<E: Inspect> DeferredHandler<E> {
    fn new(cache: WeakCache) -> Self {
        Self {
            cache,
            resolved: OnceLock::new(),
        }
    }

    fn handler(&self) -> Result<Arc<TypeHandler<E>>, InspectError> {
        if let Some(handler) = self.resolved.get() {
            return Ok(Arc::clone(handler));
        }
        let handler = self.cache.upgrade()?.get_or_build::<E>()?;
        // A racing thread may have set it first; both are equivalent.
        let _ = self.resolved.set(Arc::clone(&handler));
        Ok(handler)
    }
}

impl<E: Inspect> FieldVisitor<E> {
    /// Describe one element in place.
    #[inline]
    pub fn visit(
        &self,
        inspector: &mut dyn Inspector,
        value: &mut E,
        version: SchemaVersion,
    ) -> Result<(), InspectError> {
        match self {
            Self::Scalar(exchange) => exchange(inspector, value),
            Self::Compiled(handler) => handler.describe(inspector, value, version),
            Self::Deferred(deferred) => deferred.handler()?.describe(inspector, value, version),
        }
    }

    /// Construct one element purely from the inspector.
    pub fn create(
        &self,
        inspector: &mut dyn Inspector,
        version: SchemaVersion,
        is_latest: bool,
    ) -> Result<E, InspectError> {
        match self {
            Self::Scalar(exchange) => {
                let mut value = E::default();
                exchange(inspector, &mut value)?;
                Ok(value)
            }
            Self::Compiled(handler) => handler.create(inspector, version, is_latest),
            Self::Deferred(deferred) => deferred.handler()?.create(inspector, version, is_latest),
        }
    }

    /// Short label of the resolved strategy (diagnostics).
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Compiled(_) => "compiled",
            Self::Deferred(_) => "deferred",
        }
    }
}

impl HandlerCache {
    /// Resolve the visit entry point for element type `E`.
    ///
    /// Build-time only: the result is meant to be captured by the handler
    /// being compiled, not looked up per element.
    pub fn resolve_visitor<E: Inspect>(&self) -> Result<FieldVisitor<E>, BuildError> {
        if let Category::Scalar(_) = E::CATEGORY {
            if let Some(exchange) = E::scalar_visitor() {
                return Ok(FieldVisitor::Scalar(exchange));
            }
        }

        if self.is_building::<E>() {
            log::debug!(
                "[HandlerCache] deferring recursive handler for {}",
                std::any::type_name::<E>()
            );
            return Ok(FieldVisitor::Deferred(DeferredHandler::new(self.downgrade())));
        }

        self.get_or_build::<E>().map(FieldVisitor::Compiled)
    }
}
