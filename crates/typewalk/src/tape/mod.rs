// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory snapshot source and diff sink.
//!
//! A [`Tape`] is the ordered list of values a traversal exchanged with its
//! inspector. [`TapeRecorder`] captures one from an existing value;
//! [`TapeReplayer`] feeds it back into `create` or `describe` and logs every
//! [`Change`] it applied.
//!
//! ```
//! use typewalk::{HandlerCache, Tape};
//!
//! let cache = HandlerCache::new();
//! let mut source = vec![1u32, 2, 3];
//! let tape = Tape::record(&cache, &mut source, 1).unwrap();
//!
//! let copy: Vec<u32> = tape.create(&cache, 1).unwrap();
//! assert_eq!(copy, source);
//!
//! let mut stale = vec![1u32, 5];
//! let changes = tape.apply(&cache, &mut stale, 1).unwrap();
//! assert_eq!(stale, source);
//! assert_eq!(changes.len(), 3); // resize, 5 -> 2, 0 -> 3
//! ```

mod recorder;
mod replayer;

pub use recorder::TapeRecorder;
pub use replayer::{Change, TapeReplayer};

use crate::error::{InspectError, TapeError};
use crate::handler::{HandlerCache, Inspect, SchemaVersion};
use crate::inspector::ScalarValue;

/// One recorded inspector exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum TapeEntry {
    /// [`Inspector::scalar`](crate::Inspector::scalar)
    Scalar(ScalarValue),
    /// [`Inspector::array_lengths`](crate::Inspector::array_lengths)
    Lengths(Vec<usize>),
    /// [`Inspector::array_bytes`](crate::Inspector::array_bytes)
    Bytes(Vec<u8>),
    /// [`Inspector::array_begin`](crate::Inspector::array_begin)
    Count(usize),
}

impl TapeEntry {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Lengths(_) => "lengths",
            Self::Bytes(_) => "bytes",
            Self::Count(_) => "count",
        }
    }
}

/// Recorded traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tape {
    entries: Vec<TapeEntry>,
}

impl Tape {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current state of `value`.
    ///
    /// Recording normalises `value`: the inspector protocol has no null
    /// length, so every null array is recorded as zero-length and is
    /// replaced in `value` by an empty array (announced through `on_new`).
    /// A value built back from the tape carries the same empty arrays, so
    /// the normalised `value` and the tape always agree. Values without null
    /// arrays are left untouched.
    pub fn record<T: Inspect>(
        cache: &HandlerCache,
        value: &mut T,
        version: SchemaVersion,
    ) -> Result<Self, InspectError> {
        let mut recorder = TapeRecorder::new();
        cache.describe(&mut recorder, value, version)?;
        Ok(recorder.into_tape())
    }

    /// Construct a fresh `T` from the whole tape.
    pub fn create<T: Inspect>(
        &self,
        cache: &HandlerCache,
        version: SchemaVersion,
    ) -> Result<T, InspectError> {
        let mut replayer = TapeReplayer::new(self);
        let value = cache.create(&mut replayer, version, true)?;
        replayer.expect_end()?;
        Ok(value)
    }

    /// Bring `value` in line with the tape, returning the applied changes.
    pub fn apply<T: Inspect>(
        &self,
        cache: &HandlerCache,
        value: &mut T,
        version: SchemaVersion,
    ) -> Result<Vec<Change>, InspectError> {
        let mut replayer = TapeReplayer::new(self);
        cache.describe(&mut replayer, value, version)?;
        replayer.expect_end()?;
        Ok(replayer.finish())
    }

    pub fn push(&mut self, entry: TapeEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[TapeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TapeEntry> {
        self.entries.iter()
    }

    pub(crate) fn get(&self, position: usize) -> Result<&TapeEntry, TapeError> {
        self.entries
            .get(position)
            .ok_or(TapeError::Exhausted { position })
    }
}

impl FromIterator<TapeEntry> for Tape {
    fn from_iter<I: IntoIterator<Item = TapeEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Tape {
    type Item = &'a TapeEntry;
    type IntoIter = std::slice::Iter<'a, TapeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
