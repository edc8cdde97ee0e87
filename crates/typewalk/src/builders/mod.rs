// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handler builders, one per shape category.
//!
//! | Category | Types | Builder |
//! |----------|-------|---------|
//! | scalar | `bool`, integers, floats, `char`, `String` | [`scalar`] |
//! | enum | [`inspect_enum!`](crate::inspect_enum) newtypes | [`enums`] |
//! | array | `Option<NdArray<E, R>>` | [`array`] |
//! | list | `Vec`, `VecDeque` | [`collection`] |
//! | collection | `BTreeSet`, `HashSet`, `LinkedList` | [`collection`] |
//! | record | `#[derive(Inspect)]` structs | [`record`] |
//! | dynamic | [`Dynamic`] | [`dynamic`] |

pub mod array;
pub mod collection;
pub mod dynamic;
pub mod enums;
pub mod record;
pub mod scalar;

pub use array::{ByteArray, NdArray};
pub use collection::{CollectionLike, ListLike};
pub use dynamic::Dynamic;
pub use enums::InspectEnum;
pub use record::{FieldAccessor, RecordBuilder};
pub use scalar::IntegralRepr;
