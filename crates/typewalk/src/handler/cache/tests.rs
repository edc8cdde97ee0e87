// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for HandlerCache.

use super::*;
use crate::builders::{NdArray, RecordBuilder};
use crate::handler::Category;
use crate::inspector::ScalarValue;
use crate::testing::Probe;
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;

static COUNTED_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
struct Counted {
    value: u32,
}

impl Inspect for Counted {
    const CATEGORY: Category = Category::Record;

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        COUNTED_BUILDS.fetch_add(1, Ordering::SeqCst);
        RecordBuilder::new(cache)
            .field("value", |c: &mut Counted| &mut c.value)
            .build()
    }
}

#[test]
fn cache_hit_and_miss_paths() {
    let cache = HandlerCache::new();

    let first = cache.get_or_build::<Vec<u32>>().expect("build");
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 0);

    let second = cache.get_or_build::<Vec<u32>>().expect("hit");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn builds_once_per_type() {
    let cache = HandlerCache::new();
    let before = COUNTED_BUILDS.load(Ordering::SeqCst);

    for _ in 0..5 {
        cache.register::<Counted>().expect("register");
    }

    assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst) - before, 1);
    assert!(cache.contains::<Counted>());
}

#[test]
fn nested_handlers_are_published() {
    let cache = HandlerCache::new();
    cache
        .register::<Vec<Option<NdArray<i64, 2>>>>()
        .expect("register");

    assert!(cache.contains::<Vec<Option<NdArray<i64, 2>>>>());
    assert!(cache.contains::<Option<NdArray<i64, 2>>>());
    // Scalars are visited directly and never compiled.
    assert!(!cache.contains::<i64>());
    assert_eq!(cache.len(), 2);
}

#[test]
fn failed_build_publishes_nothing() {
    let cache = HandlerCache::new();

    let result = cache.get_or_build::<Vec<Arc<BTreeSet<u8>>>>();

    assert!(matches!(result, Err(BuildError::ReadOnlyCollection { .. })));
    assert!(cache.is_empty());
    assert!(!cache.is_building::<Vec<Arc<BTreeSet<u8>>>>());
}

#[derive(Debug, Default)]
struct Broken {
    children: Vec<Broken>,
    frozen: Arc<BTreeSet<u8>>,
}

impl Inspect for Broken {
    const CATEGORY: Category = Category::Record;

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        RecordBuilder::new(cache)
            .field("children", |b: &mut Broken| &mut b.children)
            .field("frozen", |b: &mut Broken| &mut b.frozen)
            .build()
    }
}

#[derive(Debug, Default)]
struct Pair {
    left: Vec<u32>,
    right: Vec<u32>,
}

impl Inspect for Pair {
    const CATEGORY: Category = Category::Record;

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        RecordBuilder::new(cache)
            .field("left", |p: &mut Pair| &mut p.left)
            .field("right", |p: &mut Pair| &mut p.right)
            .build()
    }
}

#[test]
fn failed_recursive_build_discards_nested_handlers() {
    let cache = HandlerCache::new();

    // Vec<Broken> compiles before the read-only field fails the record.
    let result = cache.get_or_build::<Broken>();

    assert!(matches!(result, Err(BuildError::ReadOnlyCollection { .. })));
    assert!(!cache.contains::<Vec<Broken>>());
    assert!(!cache.contains::<Broken>());
    assert!(cache.is_empty());
    assert!(cache.boxed_describer(TypeId::of::<Vec<Broken>>()).is_none());
    assert!(!cache.is_building::<Broken>());

    // Retrying fails the same way instead of finding a half-published graph.
    assert!(cache.get_or_build::<Vec<Broken>>().is_err());
    assert!(cache.is_empty());
}

#[test]
fn nested_handlers_publish_with_their_parent() {
    let cache = HandlerCache::new();
    cache.register::<Pair>().expect("register");

    // The second Vec<u32> field reuses the handler staged for the first.
    let stats = cache.stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 1);
    assert!(cache.contains::<Vec<u32>>());
    assert!(cache.contains::<Pair>());
    assert_eq!(cache.len(), 2);
    assert!(cache.boxed_entry_by_tag(std::any::type_name::<Pair>()).is_some());
}

#[test]
fn every_published_type_gets_a_boxed_describer() {
    let cache = HandlerCache::new();
    cache.register::<VecDeque<String>>().expect("register");

    let describe = cache
        .boxed_describer(TypeId::of::<VecDeque<String>>())
        .expect("in-place describer");
    let mut slot: Box<dyn Any + Send + Sync> = Box::new(VecDeque::from(vec![String::new()]));
    let mut probe = Probe::new().with_scalars([ScalarValue::String("x".into())]);
    describe(&mut probe, &mut slot, 1).expect("describe");

    assert_eq!(
        slot.downcast_ref::<VecDeque<String>>(),
        Some(&VecDeque::from(vec![String::from("x")]))
    );
    assert!(cache.boxed_describer(TypeId::of::<u8>()).is_none());
}

#[test]
fn config_swap_reaches_compiled_handlers() {
    let cache = HandlerCache::new();
    let handler = cache.get_or_build::<Vec<u8>>().expect("build");

    cache.set_config(WalkConfig::default().with_max_elements(2));
    assert_eq!(cache.config().max_elements, 2);

    let mut value = Vec::new();
    let mut probe = Probe::new().with_counts([3]);
    let result = handler.describe(&mut probe, &mut value, 1);
    assert!(matches!(result, Err(InspectError::LengthLimit { .. })));
}

#[test]
fn deferred_handler_reports_released_cache() {
    let cache = HandlerCache::new();
    let weak = cache.downgrade();
    assert!(weak.upgrade().is_ok());

    drop(cache);
    assert!(matches!(weak.upgrade(), Err(InspectError::CacheReleased)));
}

#[test]
fn global_cache_is_shared() {
    let a = HandlerCache::global();
    let b = HandlerCache::global();
    assert!(std::ptr::eq(a, b));

    a.register::<Vec<char>>().expect("register");
    assert!(b.contains::<Vec<char>>());
}

#[test]
fn concurrent_first_use_is_consistent() {
    let cache = HandlerCache::new();
    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let cache = cache.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..500 {
                let registered = match fastrand::usize(..4) {
                    0 => cache.register::<Vec<i32>>(),
                    1 => cache.register::<Option<NdArray<f32, 3>>>(),
                    2 => cache.register::<BTreeSet<String>>(),
                    _ => cache.register::<VecDeque<u16>>(),
                };
                registered.expect("build");
            }

            let mut list = vec![1, 2, 3];
            let mut probe = Probe::new().with_counts([2]);
            cache
                .describe(&mut probe, &mut list, 1)
                .expect("describe");
            list
        }));
    }

    for handle in handles {
        let list = handle.join().expect("thread should succeed");
        assert_eq!(list, vec![1, 2]);
    }

    let stats = cache.stats();
    assert!(stats.hits > stats.misses);
    assert_eq!(cache.len(), 4);
}
