// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Tape, TapeEntry};
use crate::error::InspectError;
use crate::inspector::{Inspector, NewInstance, ScalarMut};

/// Inspector that records every exchange without altering the value.
///
/// Lengths and counts are answered with the hints. A null array has no
/// hint and is answered with zero, so the described value is normalised:
/// the null array is replaced by an empty one.
#[derive(Debug, Default)]
pub struct TapeRecorder {
    tape: Tape,
}

impl TapeRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    #[must_use]
    pub fn into_tape(self) -> Tape {
        log::debug!("[TapeRecorder] recorded {} entries", self.tape.len());
        self.tape
    }
}

impl Inspector for TapeRecorder {
    fn scalar(&mut self, value: ScalarMut<'_>) -> Result<(), InspectError> {
        self.tape.push(TapeEntry::Scalar(value.get()));
        Ok(())
    }

    fn on_new(&mut self, _instance: NewInstance<'_>, _: bool) -> Result<(), InspectError> {
        Ok(())
    }

    fn array_lengths(&mut self, lengths: &mut [Option<usize>]) -> Result<(), InspectError> {
        let recorded = lengths
            .iter_mut()
            .map(|len| *len.get_or_insert(0))
            .collect();
        self.tape.push(TapeEntry::Lengths(recorded));
        Ok(())
    }

    fn array_bytes(&mut self, buffer: &mut [u8]) -> Result<(), InspectError> {
        self.tape.push(TapeEntry::Bytes(buffer.to_vec()));
        Ok(())
    }

    fn array_begin(&mut self, count: &mut usize) -> Result<(), InspectError> {
        self.tape.push(TapeEntry::Count(*count));
        Ok(())
    }
}
