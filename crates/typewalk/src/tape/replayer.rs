// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

use super::{Tape, TapeEntry};
use crate::error::{InspectError, TapeError};
use crate::inspector::{Inspector, NewInstance, ScalarMut, ScalarValue};

/// One modification applied while replaying a tape.
///
/// Paths start at `$` and are built from record field names and outer
/// array dimension indices, e.g. `$.grid[1]` or `$.items.name`.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Scalar value overwritten.
    Scalar {
        path: String,
        old: ScalarValue,
        new: ScalarValue,
    },
    /// Array allocated to replace the previous one (or a null).
    Replaced {
        path: String,
        type_name: &'static str,
        lengths: Vec<usize>,
        previously_non_null: bool,
    },
    /// List or collection count changed.
    Resized { path: String, old: usize, new: usize },
    /// Byte array content overwritten in bulk.
    Bytes { path: String, len: usize },
}

impl Change {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Scalar { path, .. }
            | Self::Replaced { path, .. }
            | Self::Resized { path, .. }
            | Self::Bytes { path, .. } => path,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { path, old, new } => write!(f, "{}: {} -> {}", path, old, new),
            Self::Replaced {
                path,
                lengths,
                previously_non_null,
                ..
            } => write!(
                f,
                "{}: {} array {:?}",
                path,
                if *previously_non_null { "replaced" } else { "new" },
                lengths
            ),
            Self::Resized { path, old, new } => write!(f, "{}: resized {} -> {}", path, old, new),
            Self::Bytes { path, len } => write!(f, "{}: {} bytes rewritten", path, len),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Field(&'static str),
    Index(usize),
}

/// Inspector that replays a [`Tape`] and logs the changes it applies.
#[derive(Debug)]
pub struct TapeReplayer<'t> {
    tape: &'t Tape,
    position: usize,
    path: Vec<Segment>,
    /// Last row closed at each path depth as `(dim, index)`, for numbering
    /// the next row opened at that depth.
    closed_rows: Vec<Option<(usize, usize)>>,
    changes: Vec<Change>,
}

impl<'t> TapeReplayer<'t> {
    #[must_use]
    pub fn new(tape: &'t Tape) -> Self {
        Self {
            tape,
            position: 0,
            path: Vec::new(),
            closed_rows: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Index of the next entry to replay.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tape.len().saturating_sub(self.position)
    }

    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Fail if entries are left unreplayed.
    pub fn expect_end(&self) -> Result<(), TapeError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(TapeError::Trailing { remaining }),
        }
    }

    #[must_use]
    pub fn finish(self) -> Vec<Change> {
        log::debug!(
            "[TapeReplayer] replayed {} entries, {} changes",
            self.position,
            self.changes.len()
        );
        self.changes
    }

    fn entry(&self) -> Result<&'t TapeEntry, TapeError> {
        let tape = self.tape;
        tape.get(self.position)
    }

    fn unexpected(&self, expected: &'static str, found: &TapeEntry) -> InspectError {
        TapeError::UnexpectedEntry {
            position: self.position,
            expected,
            found: found.kind(),
        }
        .into()
    }

    /// Remember the row just closed at the current depth; deeper rows are done.
    fn close_row(&mut self, dim: usize, index: usize) {
        let depth = self.path.len();
        self.closed_rows.resize(depth + 1, None);
        self.closed_rows[depth] = Some((dim, index));
    }

    fn current_path(&self) -> String {
        let mut path = String::from("$");
        for segment in &self.path {
            match segment {
                Segment::Field(name) => {
                    path.push('.');
                    path.push_str(name);
                }
                Segment::Index(index) => {
                    path.push('[');
                    path.push_str(&index.to_string());
                    path.push(']');
                }
            }
        }
        path
    }
}

impl Inspector for TapeReplayer<'_> {
    fn scalar(&mut self, mut value: ScalarMut<'_>) -> Result<(), InspectError> {
        let recorded = match self.entry()? {
            TapeEntry::Scalar(recorded) => recorded,
            other => return Err(self.unexpected("scalar", other)),
        };
        self.position += 1;

        let old = value.get();
        if value.set(recorded.clone())? {
            self.changes.push(Change::Scalar {
                path: self.current_path(),
                old,
                new: recorded.clone(),
            });
        }
        Ok(())
    }

    fn on_new(
        &mut self,
        instance: NewInstance<'_>,
        previously_non_null: bool,
    ) -> Result<(), InspectError> {
        self.changes.push(Change::Replaced {
            path: self.current_path(),
            type_name: instance.type_name,
            lengths: instance.lengths.to_vec(),
            previously_non_null,
        });
        Ok(())
    }

    fn array_lengths(&mut self, lengths: &mut [Option<usize>]) -> Result<(), InspectError> {
        let recorded = match self.entry()? {
            TapeEntry::Lengths(recorded) => recorded,
            other => return Err(self.unexpected("lengths", other)),
        };
        if recorded.len() != lengths.len() {
            return Err(InspectError::RankMismatch {
                expected: lengths.len(),
                found: recorded.len(),
            });
        }
        self.position += 1;

        for (slot, &len) in lengths.iter_mut().zip(recorded) {
            *slot = Some(len);
        }
        // A new array starts numbering its rows from zero.
        self.closed_rows.truncate(self.path.len());
        Ok(())
    }

    fn array_bytes(&mut self, buffer: &mut [u8]) -> Result<(), InspectError> {
        let recorded = match self.entry()? {
            TapeEntry::Bytes(recorded) => recorded,
            other => return Err(self.unexpected("bytes", other)),
        };
        if recorded.len() != buffer.len() {
            return Err(TapeError::ByteLength {
                expected: buffer.len(),
                found: recorded.len(),
            }
            .into());
        }
        self.position += 1;

        if buffer != recorded.as_slice() {
            buffer.copy_from_slice(recorded);
            self.changes.push(Change::Bytes {
                path: self.current_path(),
                len: buffer.len(),
            });
        }
        Ok(())
    }

    fn array_begin(&mut self, count: &mut usize) -> Result<(), InspectError> {
        let recorded = match self.entry()? {
            TapeEntry::Count(recorded) => *recorded,
            other => return Err(self.unexpected("count", other)),
        };
        self.position += 1;

        if recorded != *count {
            self.changes.push(Change::Resized {
                path: self.current_path(),
                old: *count,
                new: recorded,
            });
            *count = recorded;
        }
        Ok(())
    }

    fn array_level_up(&mut self, dim: usize) -> Result<(), InspectError> {
        let depth = self.path.len();
        let index = match self.closed_rows.get(depth).copied().flatten() {
            Some((closed, index)) if closed == dim => index + 1,
            _ => 0,
        };
        self.path.push(Segment::Index(index));
        self.closed_rows.truncate(depth + 1);
        Ok(())
    }

    fn array_level_down(&mut self, dim: usize) -> Result<(), InspectError> {
        if let Some(Segment::Index(index)) = self.path.pop() {
            self.close_row(dim, index);
        }
        Ok(())
    }

    fn enter_field(&mut self, name: &'static str) -> Result<(), InspectError> {
        self.path.push(Segment::Field(name));
        self.closed_rows.truncate(self.path.len());
        Ok(())
    }

    fn leave_field(&mut self, _name: &'static str) -> Result<(), InspectError> {
        self.path.pop();
        self.closed_rows.truncate(self.path.len() + 1);
        Ok(())
    }
}
