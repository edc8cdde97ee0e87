// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive handlers: a single [`Inspector::scalar`] exchange per value.

use crate::error::{BuildError, InspectError};
use crate::handler::{
    Category, CreateFn, DescribeFn, HandlerCache, Inspect, ScalarVisitFn, SchemaVersion,
    TypeHandler,
};
use crate::inspector::{Inspector, ScalarKind, ScalarMut};

/// Integral types an enum may use as its underlying representation.
pub trait IntegralRepr: Inspect + Copy + PartialEq + std::fmt::Debug {
    const KIND: ScalarKind;
}

fn build<T: Inspect>(exchange: ScalarVisitFn<T>) -> TypeHandler<T> {
    let create: CreateFn<T> = Box::new(
        move |inspector: &mut dyn Inspector, _version: SchemaVersion, _is_latest: bool| {
            let mut value = T::default();
            exchange(inspector, &mut value)?;
            Ok(value)
        },
    );
    let describe: DescribeFn<T> = Box::new(
        move |inspector: &mut dyn Inspector, value: &mut T, _version: SchemaVersion| {
            exchange(inspector, value)
        },
    );
    TypeHandler::new(T::CATEGORY, create, describe)
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl Inspect for $ty {
            const CATEGORY: Category = Category::Scalar(ScalarKind::$variant);

            fn build_handler(_cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
                Ok(build::<Self>(|inspector, value| {
                    inspector.scalar(ScalarMut::$variant(value))
                }))
            }

            fn scalar_visitor() -> Option<ScalarVisitFn<Self>> {
                fn exchange(inspector: &mut dyn Inspector, value: &mut $ty) -> Result<(), InspectError> {
                    inspector.scalar(ScalarMut::$variant(value))
                }
                Some(exchange)
            }
        }
    };
}

macro_rules! impl_integral {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl_scalar!($ty, $variant);

            impl IntegralRepr for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;
            }
        )*
    };
}

impl_integral!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

impl_scalar!(bool, Bool);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);
impl_scalar!(char, Char);
impl_scalar!(String, String);
