// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # typewalk - compiled object-graph traversal
//!
//! For every concrete type it meets, typewalk compiles a [`TypeHandler`]
//! once: a *constructor* that builds a fresh value purely from an external
//! source, and a *describer* that walks an existing value, exchanges every
//! field with that source and mutates the value in place to match. The
//! source/sink is any [`Inspector`] implementation: a decoder, an encoder, a
//! diff log, a UI binding.
//!
//! ## Quick Start
//!
//! ```rust
//! use typewalk::{HandlerCache, Inspect, NdArray, Tape};
//!
//! #[derive(Debug, Default, PartialEq, Inspect)]
//! struct Telemetry {
//!     node: String,
//!     readings: Vec<f32>,
//!     frame: Option<NdArray<u8, 1>>,
//!     #[inspect(since = 2)]
//!     sequence: u64,
//! }
//!
//! # fn main() -> Result<(), typewalk::InspectError> {
//! let cache = HandlerCache::new();
//! let mut sample = Telemetry {
//!     node: "probe-7".into(),
//!     readings: vec![20.5, 21.0],
//!     frame: Some(vec![0xca, 0xfe].into()),
//!     sequence: 42,
//! };
//!
//! let tape = Tape::record(&cache, &mut sample, 2)?;
//! let copy: Telemetry = tape.create(&cache, 2)?;
//! assert_eq!(copy, sample);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  caller: HandlerCache::create / describe, typewalk::handler   |
//! +---------------------------------------------------------------+
//! |  HandlerCache: TypeId -> TypeHandler<T>, built once, shared   |
//! +---------------------------------------------------------------+
//! |  builders: scalar | enum | array | list | collection | record |
//! |            (element visitors resolved at build time)          |
//! +---------------------------------------------------------------+
//! |  Inspector: scalar, on_new, lengths, bytes, begin, markers    |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HandlerCache`] | Concurrent per-type handler store |
//! | [`TypeHandler`] | Compiled constructor/describer pair |
//! | [`Inspector`] | Source/sink a traversal exchanges values with |
//! | [`NdArray`] | Rectangular array of any rank, nullable via `Option` |
//! | [`Dynamic`] | Untyped slot resolved at runtime |
//! | [`Tape`] | In-memory recording, replayed with change tracking |

// Allow the derive macro to work inside this crate's tests
extern crate self as typewalk;

pub mod builders;
pub mod config;
pub mod error;
pub mod handler;
pub mod inspector;
pub mod tape;

#[cfg(test)]
mod testing;

pub use builders::{
    ByteArray, CollectionLike, Dynamic, FieldAccessor, InspectEnum, IntegralRepr, ListLike,
    NdArray, RecordBuilder,
};
pub use config::{Limits, WalkConfig};
pub use error::{BuildError, InspectError, TapeError};
pub use handler::{
    CacheStats, Category, FieldVisitor, HandlerCache, Inspect, SchemaVersion, TypeHandler,
};
pub use inspector::{Inspector, NewInstance, ScalarKind, ScalarMut, ScalarValue};
pub use tape::{Change, Tape, TapeEntry, TapeRecorder, TapeReplayer};

/// Derive macro (for `#[derive(typewalk::Inspect)]`)
pub use typewalk_codegen::Inspect;

use std::sync::Arc;

/// Handler for `T` from the process-wide cache.
pub fn handler<T: Inspect>() -> Result<Arc<TypeHandler<T>>, BuildError> {
    HandlerCache::global().get_or_build::<T>()
}

/// Construct a `T` from `inspector` through the process-wide cache.
pub fn create<T: Inspect>(
    inspector: &mut dyn Inspector,
    version: SchemaVersion,
    is_latest: bool,
) -> Result<T, InspectError> {
    HandlerCache::global().create(inspector, version, is_latest)
}

/// Describe `value` against `inspector` through the process-wide cache.
pub fn describe<T: Inspect>(
    inspector: &mut dyn Inspector,
    value: &mut T,
    version: SchemaVersion,
) -> Result<(), InspectError> {
    HandlerCache::global().describe(inspector, value, version)
}
