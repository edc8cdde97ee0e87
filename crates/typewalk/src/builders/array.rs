// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rank-generic array handlers.
//!
//! Arrays are rectangular [`NdArray<E, R>`] values held in a nullable slot
//! (`Option<NdArray<E, R>>`). Traversal runs in three steps:
//!
//! 1. **Negotiate**: current lengths (or `None` for a null slot) go to
//!    [`Inspector::array_lengths`], which answers with authoritative lengths.
//! 2. **Reallocate**: on any difference, or a null slot, a new array is
//!    allocated, announced through [`Inspector::on_new`] and bound to the
//!    slot in a single assignment.
//! 3. **Visit**: elements are visited in row-major order; every iteration of
//!    an outer dimension is bracketed by level markers, the innermost
//!    dimension is not.
//!
//! `u8` arrays of rank 1 skip step 3 and exchange the whole buffer through
//! [`Inspector::array_bytes`]. Construction runs the same steps from an
//! empty slot, so lengths are always negotiated as unknown and the new
//! instance is always announced with `previously_non_null = false`.

use std::any::{Any, TypeId};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::config::Limits;
use crate::error::{BuildError, InspectError};
use crate::handler::{
    Category, CreateFn, DescribeFn, FieldVisitor, HandlerCache, Inspect, SchemaVersion,
    TypeHandler,
};
use crate::inspector::{Inspector, NewInstance};

/// Rectangular array of rank `R`, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NdArray<E, const R: usize> {
    dims: [usize; R],
    data: Vec<E>,
}

/// Byte buffer exchanged in bulk.
pub type ByteArray = NdArray<u8, 1>;

impl<E: Default, const R: usize> NdArray<E, R> {
    /// Default-filled array with the given per-dimension lengths.
    #[must_use]
    pub fn new(dims: [usize; R]) -> Self {
        let len = dims.iter().product();
        Self {
            dims,
            data: std::iter::repeat_with(E::default).take(len).collect(),
        }
    }
}

impl<E, const R: usize> NdArray<E, R> {
    /// Wrap row-major `data`; `None` if its length does not match `dims`.
    #[must_use]
    pub fn from_vec(dims: [usize; R], data: Vec<E>) -> Option<Self> {
        let expected = dims
            .iter()
            .try_fold(1usize, |acc, &len| acc.checked_mul(len))?;
        (expected == data.len()).then_some(Self { dims, data })
    }

    /// Per-dimension lengths.
    #[must_use]
    pub fn dims(&self) -> [usize; R] {
        self.dims
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        R
    }

    /// Total element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [E] {
        &mut self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<E> {
        self.data
    }

    #[must_use]
    pub fn get(&self, index: [usize; R]) -> Option<&E> {
        self.offset(index).and_then(|at| self.data.get(at))
    }

    pub fn get_mut(&mut self, index: [usize; R]) -> Option<&mut E> {
        self.offset(index).and_then(|at| self.data.get_mut(at))
    }

    fn offset(&self, index: [usize; R]) -> Option<usize> {
        let mut offset = 0usize;
        for (&i, &len) in index.iter().zip(self.dims.iter()) {
            if i >= len {
                return None;
            }
            offset = offset * len + i;
        }
        Some(offset)
    }
}

impl<E> From<Vec<E>> for NdArray<E, 1> {
    fn from(data: Vec<E>) -> Self {
        Self {
            dims: [data.len()],
            data,
        }
    }
}

impl<E, const R: usize> Index<[usize; R]> for NdArray<E, R> {
    type Output = E;

    fn index(&self, index: [usize; R]) -> &E {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index {:?} out of bounds for shape {:?}", index, self.dims),
        }
    }
}

impl<E, const R: usize> IndexMut<[usize; R]> for NdArray<E, R> {
    fn index_mut(&mut self, index: [usize; R]) -> &mut E {
        let dims = self.dims;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index {:?} out of bounds for shape {:?}", index, dims),
        }
    }
}

impl<E: Inspect, const R: usize> Inspect for Option<NdArray<E, R>> {
    const CATEGORY: Category = Category::Array { rank: R };

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        build::<E, R>(cache)
    }
}

fn build<E: Inspect, const R: usize>(
    cache: &HandlerCache,
) -> Result<TypeHandler<Option<NdArray<E, R>>>, BuildError> {
    if R == 0 {
        return Err(BuildError::UnsupportedRank {
            type_name: std::any::type_name::<Option<NdArray<E, R>>>(),
            rank: R,
        });
    }

    let limits = cache.limits().clone();
    if R == 1 && TypeId::of::<E>() == TypeId::of::<u8>() {
        return Ok(build_bytes::<E, R>(limits));
    }

    let visitor = Arc::new(cache.resolve_visitor::<E>()?);
    log::trace!(
        "[ArrayBuilder] {} elements resolved to {} visitor",
        std::any::type_name::<E>(),
        visitor.strategy()
    );

    let create_limits = limits.clone();
    let create_visitor = Arc::clone(&visitor);
    let create: CreateFn<Option<NdArray<E, R>>> = Box::new(
        move |inspector: &mut dyn Inspector, version: SchemaVersion, _is_latest: bool| {
            let mut slot = None;
            negotiate(inspector, &create_limits, &mut slot)?;
            if let Some(array) = slot.as_mut() {
                let dims = array.dims;
                walk(inspector, &dims, 0, &mut array.data, &create_visitor, version)?;
            }
            Ok(slot)
        },
    );

    let describe: DescribeFn<Option<NdArray<E, R>>> = Box::new(
        move |inspector: &mut dyn Inspector,
              slot: &mut Option<NdArray<E, R>>,
              version: SchemaVersion| {
            negotiate(inspector, &limits, slot)?;
            if let Some(array) = slot.as_mut() {
                let dims = array.dims;
                walk(inspector, &dims, 0, &mut array.data, &visitor, version)?;
            }
            Ok(())
        },
    );

    Ok(TypeHandler::new(Category::Array { rank: R }, create, describe))
}

fn build_bytes<E: Inspect, const R: usize>(limits: Limits) -> TypeHandler<Option<NdArray<E, R>>> {
    let create_limits = limits.clone();
    let create: CreateFn<Option<NdArray<E, R>>> = Box::new(
        move |inspector: &mut dyn Inspector, _version: SchemaVersion, _is_latest: bool| {
            let mut slot = None;
            negotiate(inspector, &create_limits, &mut slot)?;
            if let Some(array) = slot.as_mut() {
                exchange_bytes(inspector, array)?;
            }
            Ok(slot)
        },
    );

    let describe: DescribeFn<Option<NdArray<E, R>>> = Box::new(
        move |inspector: &mut dyn Inspector,
              slot: &mut Option<NdArray<E, R>>,
              _version: SchemaVersion| {
            negotiate(inspector, &limits, slot)?;
            if let Some(array) = slot.as_mut() {
                exchange_bytes(inspector, array)?;
            }
            Ok(())
        },
    );

    TypeHandler::new(Category::Array { rank: R }, create, describe)
}

/// Steps 1 and 2: negotiate lengths, reallocate and rebind on change.
///
/// On return the slot is non-null and shaped to the authoritative lengths.
fn negotiate<E: Inspect, const R: usize>(
    inspector: &mut dyn Inspector,
    limits: &Limits,
    slot: &mut Option<NdArray<E, R>>,
) -> Result<(), InspectError> {
    let previous = slot.as_ref().map(NdArray::dims);
    let mut lengths = previous.map_or([None; R], |dims| dims.map(Some));

    inspector.array_lengths(&mut lengths)?;
    let dims = authoritative(&lengths)?;
    limits.check_shape(&dims)?;

    if previous == Some(dims) {
        return Ok(());
    }

    let mut fresh = NdArray::<E, R>::new(dims);
    if limits.trace_reallocations() {
        log::trace!(
            "[ArrayBuilder] reallocating {} {:?} -> {:?}",
            std::any::type_name::<E>(),
            previous,
            dims
        );
    }
    inspector.on_new(
        NewInstance {
            type_name: std::any::type_name::<NdArray<E, R>>(),
            lengths: &dims,
            value: &mut fresh,
        },
        previous.is_some(),
    )?;
    *slot = Some(fresh);
    Ok(())
}

fn authoritative<const R: usize>(lengths: &[Option<usize>; R]) -> Result<[usize; R], InspectError> {
    let mut dims = [0usize; R];
    for (dim, (out, len)) in dims.iter_mut().zip(lengths.iter()).enumerate() {
        *out = len.ok_or(InspectError::UnresolvedLength { dim })?;
    }
    Ok(dims)
}

/// Step 3: row-major traversal of `data` shaped by `dims[dim..]`.
fn walk<E: Inspect>(
    inspector: &mut dyn Inspector,
    dims: &[usize],
    dim: usize,
    data: &mut [E],
    visitor: &FieldVisitor<E>,
    version: SchemaVersion,
) -> Result<(), InspectError> {
    match &dims[dim..] {
        [] => Ok(()),
        [_] => {
            for element in data.iter_mut() {
                visitor.visit(inspector, element, version)?;
            }
            Ok(())
        }
        [outer, inner @ ..] => {
            let stride: usize = inner.iter().product();
            for row in 0..*outer {
                inspector.array_level_up(dim)?;
                let chunk = &mut data[row * stride..(row + 1) * stride];
                walk(inspector, dims, dim + 1, chunk, visitor, version)?;
                inspector.array_level_down(dim)?;
            }
            Ok(())
        }
    }
}

fn exchange_bytes<E: 'static, const R: usize>(
    inspector: &mut dyn Inspector,
    array: &mut NdArray<E, R>,
) -> Result<(), InspectError> {
    let bytes = (&mut array.data as &mut dyn Any)
        .downcast_mut::<Vec<u8>>()
        .ok_or(InspectError::TypeMismatch {
            expected: "u8",
            found: std::any::type_name::<E>(),
        })?;
    inspector.array_bytes(bytes.as_mut_slice())
}
