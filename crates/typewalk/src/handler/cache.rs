// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent cache of compiled type handlers.
//!
//! The HandlerCache ensures that handler compilation happens only once per
//! concrete type. Lookups are lock-free reads into a `DashMap` keyed by
//! `TypeId`. Builds run outside any map lock and are published afterwards,
//! so a concurrent first use may compile the same handler twice; the last
//! publisher wins and both handlers are functionally identical.
//!
//! Handlers compiled while another build is in progress on the same thread
//! (element types, field types) are staged and published together with the
//! outermost handler once it succeeds. A failed build publishes nothing.
//!
//! A second map holds a type-erased constructor and describer per published
//! type, keyed by `TypeId` and by type tag, used for values held in a
//! [`Dynamic`](crate::Dynamic) slot.

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;

use super::{BoxedCreateFn, BoxedDescribeFn, Inspect, SchemaVersion, TypeHandler};
use crate::config::{Limits, WalkConfig};
use crate::error::{BuildError, InspectError};
use crate::inspector::Inspector;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub last_build_ns: u64,
}

/// Type-erased entry points for one published type.
#[derive(Clone)]
pub(crate) struct BoxedEntry {
    /// Stable name exchanged in front of a `Dynamic` slot's content.
    pub tag: &'static str,
    pub create: BoxedCreateFn,
    pub describe: BoxedDescribeFn,
}

/// Finished handler waiting for its outermost build to succeed.
struct Staged {
    key: TypeId,
    handler: Arc<dyn Any + Send + Sync>,
    boxed: BoxedEntry,
}

/// Builds in progress on one thread.
#[derive(Default)]
struct BuildFrame {
    stack: Vec<TypeId>,
    staged: Vec<Staged>,
}

pub(crate) struct CacheInner {
    handlers: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    boxed: DashMap<TypeId, BoxedEntry>,
    tags: DashMap<&'static str, TypeId>,
    building: Mutex<HashMap<ThreadId, BuildFrame>>,
    limits: Limits,
    stats: RwLock<CacheStats>,
}

/// Keyed-by-type store of compiled handlers.
///
/// Cloning is cheap and yields a handle on the same store.
#[derive(Clone)]
pub struct HandlerCache {
    inner: Arc<CacheInner>,
}

/// Non-owning cache handle captured by handlers that resolve lazily.
#[derive(Clone)]
pub(crate) struct WeakCache(Weak<CacheInner>);

impl WeakCache {
    pub(crate) fn upgrade(&self) -> Result<HandlerCache, InspectError> {
        self.0
            .upgrade()
            .map(|inner| HandlerCache { inner })
            .ok_or(InspectError::CacheReleased)
    }
}

/// Marks `key` as being built on the current thread until committed or dropped.
///
/// Dropping without commit discards everything staged since entry.
struct BuildGuard<'a> {
    inner: &'a CacheInner,
    thread: ThreadId,
    mark: usize,
    committed: bool,
}

impl<'a> BuildGuard<'a> {
    fn enter(inner: &'a CacheInner, key: TypeId) -> Self {
        let thread = thread::current().id();
        let mut frames = inner.building.lock();
        let frame = frames.entry(thread).or_default();
        frame.stack.push(key);
        let mark = frame.staged.len();
        Self {
            inner,
            thread,
            mark,
            committed: false,
        }
    }

    /// Stage a finished handler. Returns the whole batch when this was the
    /// outermost build on the thread.
    fn commit(mut self, staged: Staged) -> Option<Vec<Staged>> {
        self.committed = true;
        let mut frames = self.inner.building.lock();
        let frame = frames.get_mut(&self.thread)?;
        frame.stack.pop();
        frame.staged.push(staged);
        if frame.stack.is_empty() {
            frames.remove(&self.thread).map(|frame| frame.staged)
        } else {
            None
        }
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut frames = self.inner.building.lock();
        let Some(frame) = frames.get_mut(&self.thread) else {
            return;
        };
        frame.stack.pop();
        frame.staged.truncate(self.mark);
        if frame.stack.is_empty() {
            frames.remove(&self.thread);
        }
    }
}

impl Default for HandlerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerCache {
    /// Empty cache with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WalkConfig::default())
    }

    #[must_use]
    pub fn with_config(config: WalkConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                handlers: DashMap::new(),
                boxed: DashMap::new(),
                tags: DashMap::new(),
                building: Mutex::new(HashMap::new()),
                limits: Limits::new(config),
                stats: RwLock::new(CacheStats::default()),
            }),
        }
    }

    /// Process-wide cache, configured from the environment on first use.
    pub fn global() -> &'static HandlerCache {
        static GLOBAL: OnceLock<HandlerCache> = OnceLock::new();
        GLOBAL.get_or_init(|| HandlerCache::with_config(WalkConfig::from_env()))
    }

    /// Return the handler for `T`, compiling and publishing it on first use.
    ///
    /// Handlers compiled for nested types become visible to other callers
    /// only once the outermost build succeeds.
    pub fn get_or_build<T: Inspect>(&self) -> Result<Arc<TypeHandler<T>>, BuildError> {
        let key = TypeId::of::<T>();

        if let Some(hit) = self.peek::<T>(key).or_else(|| self.peek_staged::<T>(key)) {
            self.record_hit();
            return Ok(hit);
        }

        let start = Instant::now();
        let guard = BuildGuard::enter(&self.inner, key);
        let built = Arc::new(T::build_handler(self)?);
        let elapsed_ns = self.record_miss(start);
        log::debug!(
            "[HandlerCache] built {} handler for {} in {} ns",
            built.category(),
            built.type_name(),
            elapsed_ns
        );

        if let Some(batch) = guard.commit(stage(&built)) {
            self.publish(batch);
        }
        Ok(built)
    }

    /// Compile the handler for `T` ahead of first use.
    ///
    /// Required before a value of type `T` can be described through a
    /// [`Dynamic`](crate::Dynamic) slot.
    pub fn register<T: Inspect>(&self) -> Result<(), BuildError> {
        self.get_or_build::<T>().map(|_| ())
    }

    #[must_use]
    pub fn contains<T: Inspect>(&self) -> bool {
        self.inner.handlers.contains_key(&TypeId::of::<T>())
    }

    /// Number of published handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.handlers.is_empty()
    }

    /// Build a fresh `T` purely from `inspector`.
    pub fn create<T: Inspect>(
        &self,
        inspector: &mut dyn Inspector,
        version: SchemaVersion,
        is_latest: bool,
    ) -> Result<T, InspectError> {
        self.get_or_build::<T>()?
            .create(inspector, version, is_latest)
    }

    /// Describe `value` against `inspector`, mutating it in place.
    pub fn describe<T: Inspect>(
        &self,
        inspector: &mut dyn Inspector,
        value: &mut T,
        version: SchemaVersion,
    ) -> Result<(), InspectError> {
        self.get_or_build::<T>()?.describe(inspector, value, version)
    }

    /// Shared configuration handle consulted by compiled handlers.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.inner.limits
    }

    #[must_use]
    pub fn config(&self) -> Arc<WalkConfig> {
        self.inner.limits.load()
    }

    /// Swap configuration; already compiled handlers observe it on their next call.
    pub fn set_config(&self, config: WalkConfig) {
        self.inner.limits.store(config);
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.inner.stats.read()
    }

    pub(crate) fn boxed_describer(&self, type_id: TypeId) -> Option<BoxedDescribeFn> {
        self.boxed_entry(type_id).map(|entry| entry.describe)
    }

    pub(crate) fn boxed_entry(&self, type_id: TypeId) -> Option<BoxedEntry> {
        self.inner
            .boxed
            .get(&type_id)
            .map(|entry| entry.value().clone())
    }

    pub(crate) fn boxed_entry_by_tag(&self, tag: &str) -> Option<BoxedEntry> {
        let type_id = *self.inner.tags.get(tag)?.value();
        self.boxed_entry(type_id)
    }

    pub(crate) fn downgrade(&self) -> WeakCache {
        WeakCache(Arc::downgrade(&self.inner))
    }

    pub(crate) fn is_building<T: 'static>(&self) -> bool {
        let key = TypeId::of::<T>();
        self.inner
            .building
            .lock()
            .get(&thread::current().id())
            .is_some_and(|frame| frame.stack.contains(&key))
    }

    fn peek<T: Inspect>(&self, key: TypeId) -> Option<Arc<TypeHandler<T>>> {
        // Clone out of the shard guard before downcasting.
        let erased = self
            .inner
            .handlers
            .get(&key)
            .map(|entry| Arc::clone(entry.value()))?;
        erased.downcast::<TypeHandler<T>>().ok()
    }

    /// Handler compiled earlier in the build running on this thread.
    fn peek_staged<T: Inspect>(&self, key: TypeId) -> Option<Arc<TypeHandler<T>>> {
        let erased = {
            let frames = self.inner.building.lock();
            let frame = frames.get(&thread::current().id())?;
            let staged = frame.staged.iter().find(|staged| staged.key == key)?;
            Arc::clone(&staged.handler)
        };
        erased.downcast::<TypeHandler<T>>().ok()
    }

    fn publish(&self, batch: Vec<Staged>) {
        for staged in batch {
            let tag = staged.boxed.tag;
            self.inner.tags.insert(tag, staged.key);
            self.inner.boxed.insert(staged.key, staged.boxed);
            if self.inner.handlers.insert(staged.key, staged.handler).is_some() {
                log::debug!(
                    "[HandlerCache] concurrent build of {} replaced an equivalent handler",
                    tag
                );
            }
        }
    }

    fn record_hit(&self) {
        let mut stats = self.inner.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self, start: Instant) -> u64 {
        let elapsed_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let mut stats = self.inner.stats.write();
        stats.misses = stats.misses.saturating_add(1);
        stats.last_build_ns = elapsed_ns;
        elapsed_ns
    }
}

fn stage<T: Inspect>(handler: &Arc<TypeHandler<T>>) -> Staged {
    let describe = handler
        .boxed_describer()
        .unwrap_or_else(|| in_place_boxed_describer(Arc::clone(handler)));
    Staged {
        key: TypeId::of::<T>(),
        handler: Arc::clone(handler) as Arc<dyn Any + Send + Sync>,
        boxed: BoxedEntry {
            tag: handler.type_name(),
            create: boxed_constructor(Arc::clone(handler)),
            describe,
        },
    }
}

/// Boxed describer that downcasts and describes in place.
fn in_place_boxed_describer<T: Inspect>(handler: Arc<TypeHandler<T>>) -> BoxedDescribeFn {
    Arc::new(
        move |inspector: &mut dyn Inspector,
              slot: &mut Box<dyn Any + Send + Sync>,
              version: SchemaVersion| {
            let value = (**slot)
                .downcast_mut::<T>()
                .ok_or(InspectError::TypeMismatch {
                    expected: handler.type_name(),
                    found: "boxed value of another type",
                })?;
            handler.describe(inspector, value, version)
        },
    )
}

fn boxed_constructor<T: Inspect>(handler: Arc<TypeHandler<T>>) -> BoxedCreateFn {
    Arc::new(
        move |inspector: &mut dyn Inspector, version: SchemaVersion, is_latest: bool| {
            let value = handler.create(inspector, version, is_latest)?;
            Ok(Box::new(value) as Box<dyn Any + Send + Sync>)
        },
    )
}

impl std::fmt::Debug for HandlerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCache")
            .field("handlers", &self.inner.handlers.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests;
