// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The inspector capability: source/sink a compiled handler exchanges values with.
//!
//! Implementations decide the operating mode. A reader overwrites the
//! values it is handed, a writer leaves them untouched and records them, a
//! diff sink compares and logs. Handlers never know which one they talk to;
//! they only guarantee the call order documented on each method.

use std::any::Any;
use std::fmt;

use crate::error::InspectError;

/// Primitive kinds a scalar exchange can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
}

impl ScalarKind {
    /// Lowercase Rust spelling of the kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "string",
        }
    }

    /// True for the kinds an enum may project through.
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mutable borrow of a single scalar slot handed to [`Inspector::scalar`].
#[derive(Debug)]
pub enum ScalarMut<'a> {
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Char(&'a mut char),
    String(&'a mut String),
}

/// Owned copy of a scalar, used by sinks that store or compare values.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
}

impl ScalarValue {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Char(_) => ScalarKind::Char,
            Self::String(_) => ScalarKind::String,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::I8(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U8(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{}", v),
            Self::Char(v) => write!(f, "{:?}", v),
            Self::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl ScalarMut<'_> {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Char(_) => ScalarKind::Char,
            Self::String(_) => ScalarKind::String,
        }
    }

    /// Copy the current slot value out.
    #[must_use]
    pub fn get(&self) -> ScalarValue {
        match self {
            Self::Bool(v) => ScalarValue::Bool(**v),
            Self::I8(v) => ScalarValue::I8(**v),
            Self::I16(v) => ScalarValue::I16(**v),
            Self::I32(v) => ScalarValue::I32(**v),
            Self::I64(v) => ScalarValue::I64(**v),
            Self::U8(v) => ScalarValue::U8(**v),
            Self::U16(v) => ScalarValue::U16(**v),
            Self::U32(v) => ScalarValue::U32(**v),
            Self::U64(v) => ScalarValue::U64(**v),
            Self::F32(v) => ScalarValue::F32(**v),
            Self::F64(v) => ScalarValue::F64(**v),
            Self::Char(v) => ScalarValue::Char(**v),
            Self::String(v) => ScalarValue::String((**v).clone()),
        }
    }

    /// Overwrite the slot, returning whether the stored value changed.
    ///
    /// Kinds must match exactly; no numeric widening is performed.
    pub fn set(&mut self, value: ScalarValue) -> Result<bool, InspectError> {
        fn put<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }

        let changed = match (self, value) {
            (Self::Bool(slot), ScalarValue::Bool(v)) => put(&mut **slot, v),
            (Self::I8(slot), ScalarValue::I8(v)) => put(&mut **slot, v),
            (Self::I16(slot), ScalarValue::I16(v)) => put(&mut **slot, v),
            (Self::I32(slot), ScalarValue::I32(v)) => put(&mut **slot, v),
            (Self::I64(slot), ScalarValue::I64(v)) => put(&mut **slot, v),
            (Self::U8(slot), ScalarValue::U8(v)) => put(&mut **slot, v),
            (Self::U16(slot), ScalarValue::U16(v)) => put(&mut **slot, v),
            (Self::U32(slot), ScalarValue::U32(v)) => put(&mut **slot, v),
            (Self::U64(slot), ScalarValue::U64(v)) => put(&mut **slot, v),
            (Self::F32(slot), ScalarValue::F32(v)) => put(&mut **slot, v),
            (Self::F64(slot), ScalarValue::F64(v)) => put(&mut **slot, v),
            (Self::Char(slot), ScalarValue::Char(v)) => put(&mut **slot, v),
            (Self::String(slot), ScalarValue::String(v)) => put(&mut **slot, v),
            (slot, value) => {
                return Err(InspectError::TypeMismatch {
                    expected: slot.kind().name(),
                    found: value.kind().name(),
                })
            }
        };
        Ok(changed)
    }
}

/// A freshly allocated container announced through [`Inspector::on_new`].
pub struct NewInstance<'a> {
    /// `std::any::type_name` of the container.
    pub type_name: &'static str,
    /// Authoritative per-dimension lengths the container was allocated with.
    pub lengths: &'a [usize],
    /// The new container, before it is bound to its slot.
    pub value: &'a mut dyn Any,
}

impl fmt::Debug for NewInstance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewInstance")
            .field("type_name", &self.type_name)
            .field("lengths", &self.lengths)
            .finish_non_exhaustive()
    }
}

/// Source/sink a compiled handler exchanges values with.
///
/// All calls happen on the caller's thread, in deterministic order: row-major
/// for arrays, container order for lists and collections, declaration order
/// for record fields. Construct and describe paths issue the same sequence
/// for the same shape, which keeps a writer and a reader in lock-step.
///
/// Every method may fail; the error is propagated to the traversal caller
/// unchanged.
pub trait Inspector {
    /// Exchange one scalar value.
    fn scalar(&mut self, value: ScalarMut<'_>) -> Result<(), InspectError>;

    /// A container was allocated to replace the previous one (or a null).
    fn on_new(
        &mut self,
        instance: NewInstance<'_>,
        previously_non_null: bool,
    ) -> Result<(), InspectError>;

    /// Negotiate per-dimension array lengths.
    ///
    /// On entry each slot holds the current length, or `None` when the
    /// array is null or being constructed. On return every slot must hold
    /// the authoritative length.
    fn array_lengths(&mut self, lengths: &mut [Option<usize>]) -> Result<(), InspectError>;

    /// Bulk exchange of a byte array; `buffer.len()` is the definitive length.
    fn array_bytes(&mut self, buffer: &mut [u8]) -> Result<(), InspectError>;

    /// Negotiate a list or collection element count (in: current, out: authoritative).
    fn array_begin(&mut self, count: &mut usize) -> Result<(), InspectError>;

    /// Entering one iteration of an outer array dimension.
    fn array_level_up(&mut self, _dim: usize) -> Result<(), InspectError> {
        Ok(())
    }

    /// Leaving one iteration of an outer array dimension.
    fn array_level_down(&mut self, _dim: usize) -> Result<(), InspectError> {
        Ok(())
    }

    /// Entering a named record field.
    fn enter_field(&mut self, _name: &'static str) -> Result<(), InspectError> {
        Ok(())
    }

    /// Leaving a named record field.
    fn leave_field(&mut self, _name: &'static str) -> Result<(), InspectError> {
        Ok(())
    }
}
