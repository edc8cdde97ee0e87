// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! List and collection handlers.
//!
//! Both negotiate the element count through [`Inspector::array_begin`] and
//! commit the new size before any element is visited, so a failing element
//! visit never leaves the container at an intermediate size.
//!
//! - **Lists** (`Vec`, `VecDeque`): shrink by truncating the tail, grow by
//!   appending defaults, then visit every index in place.
//! - **Collections** (`BTreeSet`, `HashSet`, `LinkedList`): no stable index,
//!   so the content is drained into a snapshot cut to the authoritative
//!   count (excess elements are dropped) and padded with defaults; every
//!   element is then visited and re-added in snapshot order. Sets
//!   deduplicate on re-insertion, so the final size may be below the
//!   negotiated count.
//! - **Read-only collections** (`Arc<BTreeSet>`, `Arc<HashSet>`) cannot be
//!   mutated in place; building their handler fails.

use std::collections::{BTreeSet, HashSet, LinkedList, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::config::Limits;
use crate::error::{BuildError, InspectError};
use crate::handler::{
    Category, CreateFn, DescribeFn, FieldVisitor, HandlerCache, Inspect, SchemaVersion,
    TypeHandler,
};
use crate::inspector::Inspector;

/// Per-element callback handed to [`ListLike::try_for_each_mut`].
pub type ElementFn<'a, E> = dyn FnMut(&mut E) -> Result<(), InspectError> + 'a;

/// Index-addressable growable sequence.
pub trait ListLike: Inspect {
    type Item: Inspect;

    fn len(&self) -> usize;

    /// Truncate or extend with default elements to exactly `len` elements.
    fn resize_default(&mut self, len: usize);

    /// Visit every element in index order, stopping at the first error.
    fn try_for_each_mut(&mut self, f: &mut ElementFn<'_, Self::Item>) -> Result<(), InspectError>;

    fn from_elements(elements: Vec<Self::Item>) -> Self;
}

/// Mutable container without stable index access.
pub trait CollectionLike: Inspect {
    type Item: Inspect;

    fn len(&self) -> usize;

    /// Drain every element in iteration order, leaving the container empty.
    fn take_all(&mut self) -> Vec<Self::Item>;

    fn add(&mut self, value: Self::Item);
}

impl<E: Inspect> ListLike for Vec<E> {
    type Item = E;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn resize_default(&mut self, len: usize) {
        self.resize_with(len, E::default);
    }

    fn try_for_each_mut(&mut self, f: &mut ElementFn<'_, E>) -> Result<(), InspectError> {
        self.iter_mut().try_for_each(f)
    }

    fn from_elements(elements: Vec<E>) -> Self {
        elements
    }
}

impl<E: Inspect> ListLike for VecDeque<E> {
    type Item = E;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn resize_default(&mut self, len: usize) {
        self.resize_with(len, E::default);
    }

    fn try_for_each_mut(&mut self, f: &mut ElementFn<'_, E>) -> Result<(), InspectError> {
        self.iter_mut().try_for_each(f)
    }

    fn from_elements(elements: Vec<E>) -> Self {
        elements.into()
    }
}

impl<E: Inspect + Ord> CollectionLike for BTreeSet<E> {
    type Item = E;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn take_all(&mut self) -> Vec<E> {
        std::mem::take(self).into_iter().collect()
    }

    fn add(&mut self, value: E) {
        self.insert(value);
    }
}

impl<E, S> CollectionLike for HashSet<E, S>
where
    E: Inspect + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Item = E;

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn take_all(&mut self) -> Vec<E> {
        self.drain().collect()
    }

    fn add(&mut self, value: E) {
        self.insert(value);
    }
}

impl<E: Inspect> CollectionLike for LinkedList<E> {
    type Item = E;

    fn len(&self) -> usize {
        LinkedList::len(self)
    }

    fn take_all(&mut self) -> Vec<E> {
        std::mem::take(self).into_iter().collect()
    }

    fn add(&mut self, value: E) {
        self.push_back(value);
    }
}

impl<E: Inspect> Inspect for Vec<E> {
    const CATEGORY: Category = Category::List;

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        build_list(cache)
    }
}

impl<E: Inspect> Inspect for VecDeque<E> {
    const CATEGORY: Category = Category::List;

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        build_list(cache)
    }
}

impl<E: Inspect + Ord> Inspect for BTreeSet<E> {
    const CATEGORY: Category = Category::Collection { read_only: false };

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        build_collection(cache)
    }
}

impl<E, S> Inspect for HashSet<E, S>
where
    E: Inspect + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    const CATEGORY: Category = Category::Collection { read_only: false };

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        build_collection(cache)
    }
}

impl<E: Inspect> Inspect for LinkedList<E> {
    const CATEGORY: Category = Category::Collection { read_only: false };

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        build_collection(cache)
    }
}

impl<E: Inspect + Ord> Inspect for Arc<BTreeSet<E>> {
    const CATEGORY: Category = Category::Collection { read_only: true };

    fn build_handler(_cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        read_only::<Self>()
    }
}

impl<E, S> Inspect for Arc<HashSet<E, S>>
where
    E: Inspect + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    const CATEGORY: Category = Category::Collection { read_only: true };

    fn build_handler(_cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        read_only::<Self>()
    }
}

fn read_only<T: Inspect>() -> Result<TypeHandler<T>, BuildError> {
    log::warn!(
        "[CollectionBuilder] refusing read-only collection {}",
        std::any::type_name::<T>()
    );
    Err(BuildError::ReadOnlyCollection {
        type_name: std::any::type_name::<T>(),
    })
}

/// Compile the handler of an index-addressable list.
pub fn build_list<L: ListLike>(cache: &HandlerCache) -> Result<TypeHandler<L>, BuildError> {
    let visitor = Arc::new(cache.resolve_visitor::<L::Item>()?);
    let limits = cache.limits().clone();

    let create_visitor = Arc::clone(&visitor);
    let create_limits = limits.clone();
    let create: CreateFn<L> = Box::new(
        move |inspector: &mut dyn Inspector, version: SchemaVersion, is_latest: bool| {
            create_elements(inspector, &create_limits, &create_visitor, version, is_latest)
                .map(L::from_elements)
        },
    );

    let describe: DescribeFn<L> = Box::new(
        move |inspector: &mut dyn Inspector, list: &mut L, version: SchemaVersion| {
            describe_list(inspector, &limits, &visitor, list, version)
        },
    );

    Ok(TypeHandler::new(L::CATEGORY, create, describe))
}

fn describe_list<L: ListLike>(
    inspector: &mut dyn Inspector,
    limits: &Limits,
    visitor: &FieldVisitor<L::Item>,
    list: &mut L,
    version: SchemaVersion,
) -> Result<(), InspectError> {
    let old = list.len();
    let count = negotiate_count(inspector, limits, old)?;

    if count != old {
        if limits.trace_reallocations() {
            log::trace!(
                "[CollectionBuilder] resizing {} {} -> {}",
                std::any::type_name::<L>(),
                old,
                count
            );
        }
        list.resize_default(count);
    }

    list.try_for_each_mut(&mut |element: &mut L::Item| {
        visitor.visit(inspector, element, version)
    })
}

/// Compile the handler of a mutable non-indexable collection.
pub fn build_collection<C: CollectionLike>(
    cache: &HandlerCache,
) -> Result<TypeHandler<C>, BuildError> {
    let visitor = Arc::new(cache.resolve_visitor::<C::Item>()?);
    let limits = cache.limits().clone();

    let create_visitor = Arc::clone(&visitor);
    let create_limits = limits.clone();
    let create: CreateFn<C> = Box::new(
        move |inspector: &mut dyn Inspector, version: SchemaVersion, is_latest: bool| {
            let elements =
                create_elements(inspector, &create_limits, &create_visitor, version, is_latest)?;
            let mut collection = C::default();
            for element in elements {
                collection.add(element);
            }
            Ok(collection)
        },
    );

    let describe: DescribeFn<C> = Box::new(
        move |inspector: &mut dyn Inspector, collection: &mut C, version: SchemaVersion| {
            describe_collection(inspector, &limits, &visitor, collection, version)
        },
    );

    Ok(TypeHandler::new(C::CATEGORY, create, describe))
}

fn describe_collection<C: CollectionLike>(
    inspector: &mut dyn Inspector,
    limits: &Limits,
    visitor: &FieldVisitor<C::Item>,
    collection: &mut C,
    version: SchemaVersion,
) -> Result<(), InspectError> {
    let old = collection.len();
    let count = negotiate_count(inspector, limits, old)?;

    let mut elements = collection.take_all();
    if count < old {
        log::trace!(
            "[CollectionBuilder] dropping {} trailing elements of {}",
            old - count,
            std::any::type_name::<C>()
        );
    }
    elements.truncate(count);
    elements.resize_with(count, C::Item::default);

    // Re-add everything even on failure so the size stays committed.
    let visited = elements
        .iter_mut()
        .try_for_each(|element| visitor.visit(inspector, element, version));
    for element in elements {
        collection.add(element);
    }
    visited
}

/// Construct path shared by lists and collections: count negotiated from
/// zero, every element created from the inspector.
fn create_elements<E: Inspect>(
    inspector: &mut dyn Inspector,
    limits: &Limits,
    visitor: &FieldVisitor<E>,
    version: SchemaVersion,
    is_latest: bool,
) -> Result<Vec<E>, InspectError> {
    let count = negotiate_count(inspector, limits, 0)?;
    (0..count)
        .map(|_| visitor.create(inspector, version, is_latest))
        .collect()
}

fn negotiate_count(
    inspector: &mut dyn Inspector,
    limits: &Limits,
    old: usize,
) -> Result<usize, InspectError> {
    let mut count = old;
    inspector.array_begin(&mut count)?;
    limits.check_count(count)?;
    Ok(count)
}
