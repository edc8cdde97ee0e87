// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scripted, call-counting inspector for unit tests.

use std::collections::VecDeque;
use std::fmt;

use crate::error::InspectError;
use crate::inspector::{Inspector, NewInstance, ScalarMut, ScalarValue};

/// Ordered record of every inspector call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    /// Scalar value after the exchange.
    Scalar(ScalarValue),
    New {
        lengths: Vec<usize>,
        previously_non_null: bool,
    },
    Lengths(Vec<usize>),
    Bytes(usize),
    Begin(usize),
    Up(usize),
    Down(usize),
    Enter(&'static str),
    Leave(&'static str),
}

#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub scalar: usize,
    pub on_new: usize,
    pub lengths: usize,
    pub bytes: usize,
    pub begin: usize,
    /// Per-dimension `array_level_up` counts.
    pub level_up: Vec<usize>,
    /// Per-dimension `array_level_down` counts.
    pub level_down: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct ProbeFailure;

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scripted probe failure")
    }
}

impl std::error::Error for ProbeFailure {}

/// Inspector that replays scripted answers and counts calls.
///
/// Unscripted length negotiations keep the hints (unknown becomes 0);
/// unscripted scalars are left untouched.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    scalars: VecDeque<ScalarValue>,
    shapes: VecDeque<Vec<usize>>,
    counts: VecDeque<usize>,
    byte_fill: Option<u8>,
    fail_after_scalars: Option<usize>,
    pub calls: Calls,
    pub events: Vec<Event>,
    /// Scalar values as handed in, before any scripted overwrite.
    pub seen: Vec<ScalarValue>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalars(mut self, values: impl IntoIterator<Item = ScalarValue>) -> Self {
        self.scalars.extend(values);
        self
    }

    pub fn with_shapes(mut self, shapes: impl IntoIterator<Item = Vec<usize>>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    pub fn with_counts(mut self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.counts.extend(counts);
        self
    }

    pub fn with_byte_fill(mut self, fill: u8) -> Self {
        self.byte_fill = Some(fill);
        self
    }

    /// Fail the scalar exchange following the first `n` successful ones.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after_scalars = Some(n);
        self
    }

    pub fn new_instances(&self) -> Vec<(Vec<usize>, bool)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::New {
                    lengths,
                    previously_non_null,
                } => Some((lengths.clone(), *previously_non_null)),
                _ => None,
            })
            .collect()
    }

    fn bump(counts: &mut Vec<usize>, dim: usize) {
        if counts.len() <= dim {
            counts.resize(dim + 1, 0);
        }
        counts[dim] += 1;
    }
}

impl Inspector for Probe {
    fn scalar(&mut self, mut value: ScalarMut<'_>) -> Result<(), InspectError> {
        if self.fail_after_scalars == Some(self.calls.scalar) {
            return Err(InspectError::from_source(ProbeFailure));
        }
        self.calls.scalar += 1;
        self.seen.push(value.get());
        if let Some(next) = self.scalars.pop_front() {
            value.set(next)?;
        }
        self.events.push(Event::Scalar(value.get()));
        Ok(())
    }

    fn on_new(
        &mut self,
        instance: NewInstance<'_>,
        previously_non_null: bool,
    ) -> Result<(), InspectError> {
        self.calls.on_new += 1;
        self.events.push(Event::New {
            lengths: instance.lengths.to_vec(),
            previously_non_null,
        });
        Ok(())
    }

    fn array_lengths(&mut self, lengths: &mut [Option<usize>]) -> Result<(), InspectError> {
        self.calls.lengths += 1;
        if let Some(shape) = self.shapes.pop_front() {
            if shape.len() != lengths.len() {
                return Err(InspectError::RankMismatch {
                    expected: lengths.len(),
                    found: shape.len(),
                });
            }
            for (slot, len) in lengths.iter_mut().zip(shape) {
                *slot = Some(len);
            }
        } else {
            for slot in lengths.iter_mut() {
                slot.get_or_insert(0);
            }
        }
        self.events.push(Event::Lengths(
            lengths.iter().map(|len| len.unwrap_or(0)).collect(),
        ));
        Ok(())
    }

    fn array_bytes(&mut self, buffer: &mut [u8]) -> Result<(), InspectError> {
        self.calls.bytes += 1;
        if let Some(fill) = self.byte_fill {
            buffer.fill(fill);
        }
        self.events.push(Event::Bytes(buffer.len()));
        Ok(())
    }

    fn array_begin(&mut self, count: &mut usize) -> Result<(), InspectError> {
        self.calls.begin += 1;
        if let Some(next) = self.counts.pop_front() {
            *count = next;
        }
        self.events.push(Event::Begin(*count));
        Ok(())
    }

    fn array_level_up(&mut self, dim: usize) -> Result<(), InspectError> {
        Self::bump(&mut self.calls.level_up, dim);
        self.events.push(Event::Up(dim));
        Ok(())
    }

    fn array_level_down(&mut self, dim: usize) -> Result<(), InspectError> {
        Self::bump(&mut self.calls.level_down, dim);
        self.events.push(Event::Down(dim));
        Ok(())
    }

    fn enter_field(&mut self, name: &'static str) -> Result<(), InspectError> {
        self.events.push(Event::Enter(name));
        Ok(())
    }

    fn leave_field(&mut self, name: &'static str) -> Result<(), InspectError> {
        self.events.push(Event::Leave(name));
        Ok(())
    }
}
