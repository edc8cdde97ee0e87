// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enum handlers.
//!
//! An enum is traversed purely as its underlying integral value. Enums are
//! open: a value received from the inspector is converted back without
//! checking it against the declared members.

use std::any::Any;
use std::sync::Arc;

use super::scalar::IntegralRepr;
use crate::error::{BuildError, InspectError};
use crate::handler::{
    BoxedDescribeFn, CreateFn, DescribeFn, HandlerCache, Inspect, SchemaVersion, TypeHandler,
};
use crate::inspector::Inspector;

/// Enum-like type projected through an integral representation.
///
/// Usually implemented through [`inspect_enum!`](crate::inspect_enum).
/// Hand-written impls must keep `from_repr` total.
pub trait InspectEnum: Copy + Default + Send + Sync + 'static {
    /// Underlying integral type.
    type Repr: IntegralRepr;

    fn to_repr(self) -> Self::Repr;

    fn from_repr(repr: Self::Repr) -> Self;
}

/// Compile the constructor, describer and boxed describer for enum `T`.
///
/// Called from the `Inspect` impl generated by [`inspect_enum!`](crate::inspect_enum).
pub fn build<T: InspectEnum + Inspect>(cache: &HandlerCache) -> Result<TypeHandler<T>, BuildError> {
    let visitor = Arc::new(cache.resolve_visitor::<T::Repr>()?);

    let create_visitor = Arc::clone(&visitor);
    let create: CreateFn<T> = Box::new(
        move |inspector: &mut dyn Inspector, version: SchemaVersion, _is_latest: bool| {
            let mut repr = T::Repr::default();
            create_visitor.visit(inspector, &mut repr, version)?;
            Ok(T::from_repr(repr))
        },
    );

    let describe_visitor = Arc::clone(&visitor);
    let describe: DescribeFn<T> = Box::new(
        move |inspector: &mut dyn Inspector, value: &mut T, version: SchemaVersion| {
            let mut repr = value.to_repr();
            describe_visitor.visit(inspector, &mut repr, version)?;
            *value = T::from_repr(repr);
            Ok(())
        },
    );

    let boxed: BoxedDescribeFn = Arc::new(
        move |inspector: &mut dyn Inspector,
              slot: &mut Box<dyn Any + Send + Sync>,
              version: SchemaVersion| {
            let current = *(**slot)
                .downcast_ref::<T>()
                .ok_or(InspectError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                    found: "boxed value of another type",
                })?;
            let mut repr = current.to_repr();
            visitor.visit(inspector, &mut repr, version)?;
            *slot = Box::new(T::from_repr(repr));
            Ok(())
        },
    );

    Ok(TypeHandler::new(T::CATEGORY, create, describe).with_boxed_describer(boxed))
}

/// Declare an open enum backed by an integral type.
///
/// ```
/// typewalk::inspect_enum! {
///     /// Signal colour.
///     pub struct Light(u8) {
///         RED = 0,
///         AMBER = 1,
///         GREEN = 2,
///     }
/// }
///
/// assert_eq!(Light::AMBER.name(), Some("AMBER"));
/// assert_eq!(Light(9).name(), None);
/// ```
#[macro_export]
macro_rules! inspect_enum {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($repr:ty) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        $vis struct $name(pub $repr);

        #[allow(dead_code)]
        impl $name {
            $(
                $(#[$vmeta])*
                pub const $variant: Self = Self($value);
            )*

            /// Declared member name, `None` for undeclared values.
            #[must_use]
            pub fn name(self) -> Option<&'static str> {
                $(
                    if self == Self::$variant {
                        return Some(stringify!($variant));
                    }
                )*
                None
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }

        impl $crate::InspectEnum for $name {
            type Repr = $repr;

            fn to_repr(self) -> $repr {
                self.0
            }

            fn from_repr(repr: $repr) -> Self {
                Self(repr)
            }
        }

        impl $crate::Inspect for $name {
            const CATEGORY: $crate::Category =
                $crate::Category::Enum(<$repr as $crate::IntegralRepr>::KIND);

            fn build_handler(
                cache: &$crate::HandlerCache,
            ) -> ::std::result::Result<$crate::TypeHandler<Self>, $crate::BuildError> {
                $crate::builders::enums::build::<Self>(cache)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Category;
    use crate::inspector::{ScalarKind, ScalarValue};
    use crate::testing::Probe;
    use std::any::TypeId;

    crate::inspect_enum! {
        struct Mode(i32) {
            IDLE = 0,
            RUN = 1,
            HALT = 2,
        }
    }

    #[test]
    fn test_enum_projects_through_underlying_type() {
        let cache = HandlerCache::new();
        let mut mode = Mode::HALT;
        let mut probe = Probe::new().with_scalars([ScalarValue::I32(5)]);

        cache.describe(&mut probe, &mut mode, 1).expect("describe");

        assert_eq!(probe.seen, vec![ScalarValue::I32(2)]);
        assert_eq!(mode, Mode(5));
        assert_eq!(mode.name(), None);
        assert_eq!(mode.to_string(), "Mode(5)");
    }

    #[test]
    fn test_enum_create_starts_from_zero() {
        let cache = HandlerCache::new();
        let mut probe = Probe::new().with_scalars([ScalarValue::I32(1)]);

        let mode: Mode = cache.create(&mut probe, 1, true).expect("create");

        assert_eq!(probe.seen, vec![ScalarValue::I32(0)]);
        assert_eq!(mode, Mode::RUN);
        assert_eq!(Mode::CATEGORY, Category::Enum(ScalarKind::I32));
    }

    #[test]
    fn test_boxed_describer_unboxes_and_reboxes() {
        let cache = HandlerCache::new();
        cache.register::<Mode>().expect("register");
        let describe = cache
            .boxed_describer(TypeId::of::<Mode>())
            .expect("boxed describer published");

        let mut slot: Box<dyn Any + Send + Sync> = Box::new(Mode::RUN);
        let mut probe = Probe::new().with_scalars([ScalarValue::I32(2)]);
        describe(&mut probe, &mut slot, 1).expect("describe boxed");

        assert_eq!(probe.seen, vec![ScalarValue::I32(1)]);
        assert_eq!(slot.downcast_ref::<Mode>(), Some(&Mode::HALT));
    }

    #[test]
    fn test_boxed_describer_rejects_foreign_content() {
        let cache = HandlerCache::new();
        cache.register::<Mode>().expect("register");
        let describe = cache
            .boxed_describer(TypeId::of::<Mode>())
            .expect("boxed describer published");

        let mut slot: Box<dyn Any + Send + Sync> = Box::new(7u64);
        let result = describe(&mut Probe::new(), &mut slot, 1);
        assert!(matches!(result, Err(InspectError::TypeMismatch { .. })));
    }
}
