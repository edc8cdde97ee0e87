// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared test inspector: answers from a script and logs every call.

#![allow(dead_code)]

use std::collections::VecDeque;

use typewalk::{InspectError, Inspector, NewInstance, ScalarMut, ScalarValue};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Scalar(ScalarValue),
    New(Vec<usize>, bool),
    Lengths(Vec<Option<usize>>),
    Bytes(usize),
    Begin(usize),
    Up(usize),
    Down(usize),
    Enter(&'static str),
    Leave(&'static str),
}

/// Inspector driven by queued answers; unscripted negotiations keep hints.
#[derive(Debug, Default)]
pub struct Script {
    pub scalars: VecDeque<ScalarValue>,
    pub shapes: VecDeque<Vec<usize>>,
    pub counts: VecDeque<usize>,
    pub calls: Vec<Call>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalars(mut self, values: impl IntoIterator<Item = ScalarValue>) -> Self {
        self.scalars.extend(values);
        self
    }

    pub fn shapes(mut self, shapes: impl IntoIterator<Item = Vec<usize>>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    pub fn counts(mut self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.counts.extend(counts);
        self
    }

    pub fn count_of(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }
}

impl Inspector for Script {
    fn scalar(&mut self, mut value: ScalarMut<'_>) -> Result<(), InspectError> {
        self.calls.push(Call::Scalar(value.get()));
        if let Some(next) = self.scalars.pop_front() {
            value.set(next)?;
        }
        Ok(())
    }

    fn on_new(&mut self, instance: NewInstance<'_>, previously_non_null: bool) -> Result<(), InspectError> {
        self.calls
            .push(Call::New(instance.lengths.to_vec(), previously_non_null));
        Ok(())
    }

    fn array_lengths(&mut self, lengths: &mut [Option<usize>]) -> Result<(), InspectError> {
        self.calls.push(Call::Lengths(lengths.to_vec()));
        match self.shapes.pop_front() {
            Some(shape) => {
                for (slot, len) in lengths.iter_mut().zip(shape) {
                    *slot = Some(len);
                }
            }
            None => {
                for slot in lengths.iter_mut() {
                    slot.get_or_insert(0);
                }
            }
        }
        Ok(())
    }

    fn array_bytes(&mut self, buffer: &mut [u8]) -> Result<(), InspectError> {
        self.calls.push(Call::Bytes(buffer.len()));
        Ok(())
    }

    fn array_begin(&mut self, count: &mut usize) -> Result<(), InspectError> {
        self.calls.push(Call::Begin(*count));
        if let Some(next) = self.counts.pop_front() {
            *count = next;
        }
        Ok(())
    }

    fn array_level_up(&mut self, dim: usize) -> Result<(), InspectError> {
        self.calls.push(Call::Up(dim));
        Ok(())
    }

    fn array_level_down(&mut self, dim: usize) -> Result<(), InspectError> {
        self.calls.push(Call::Down(dim));
        Ok(())
    }

    fn enter_field(&mut self, name: &'static str) -> Result<(), InspectError> {
        self.calls.push(Call::Enter(name));
        Ok(())
    }

    fn leave_field(&mut self, name: &'static str) -> Result<(), InspectError> {
        self.calls.push(Call::Leave(name));
        Ok(())
    }
}
