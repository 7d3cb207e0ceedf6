// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Compact per-stage binding tables.
//!
//! A [`BindingSlotTable`] holds the native handles bound to one (stage, kind) pair,
//! indexed by slot.  Alongside the handles it tracks the *base slot*, the lowest
//! occupied index, so that binding emits a single backend call covering
//! `base_slot..len` rather than `0..len`.
//!
//! # Invariants
//!
//! After every operation:
//! - `base_slot` is `None` exactly when the table is empty (`len() == 0`).
//! - Otherwise `slots[base_slot]` is occupied and nothing below it is.
//! - The last entry of `slots` is occupied; the table never keeps trailing holes.
//!
//! Holes *between* occupied slots are allowed and are passed to the backend as null
//! bindings, which unbinds those slots.
//!
//! Tables are not synchronized.  They belong to the thread recording commands for a
//! single graphics context.

use crate::bindings::{BindingKind, NativeHandle, ShaderStage};
use crate::context::GraphicsContext;
use logwise::privacy::LogIt;

#[derive(Debug, Clone)]
pub struct BindingSlotTable {
    stage: ShaderStage,
    kind: BindingKind,
    slots: Vec<NativeHandle>,
    base_slot: Option<u32>,
}

impl BindingSlotTable {
    pub fn new(stage: ShaderStage, kind: BindingKind) -> Self {
        Self {
            stage,
            kind,
            slots: Vec::new(),
            base_slot: None,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Lowest occupied slot, or `None` when nothing is bound.
    pub fn base_slot(&self) -> Option<u32> {
        self.base_slot
    }

    /// Number of slots tracked, i.e. one past the highest occupied slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All tracked slots, including null holes.
    pub fn slots(&self) -> &[NativeHandle] {
        &self.slots
    }

    /// The handle in `slot`, if occupied.
    pub fn get(&self, slot: u32) -> Option<NativeHandle> {
        self.slots
            .get(slot as usize)
            .copied()
            .filter(|handle| !handle.is_null())
    }

    /// Assigns `handle` to `slot`, growing the table as needed.
    ///
    /// `slot` is not checked against backend limits; that is the caller's job.
    /// Assigning [`NativeHandle::NULL`] is the same as [`unset`](Self::unset).
    pub fn set(&mut self, slot: u32, handle: NativeHandle) {
        if handle.is_null() {
            self.unset(slot);
            return;
        }
        let index = slot as usize;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, NativeHandle::NULL);
        }
        self.slots[index] = handle;
        self.base_slot = Some(match self.base_slot {
            Some(base) => base.min(slot),
            None => slot,
        });
    }

    /// Clears `slot`.  Slots past the end are ignored.
    pub fn unset(&mut self, slot: u32) {
        let index = slot as usize;
        if index >= self.slots.len() {
            return;
        }

        if index == self.slots.len() - 1 {
            // top slot: shrink instead of rescanning
            self.slots.pop();
            while self.slots.last().is_some_and(|handle| handle.is_null()) {
                self.slots.pop();
            }
            if self.slots.is_empty() {
                self.base_slot = None;
            }
            return;
        }

        self.slots[index] = NativeHandle::NULL;

        if self.base_slot == Some(slot) {
            match self.slots.iter().position(|handle| !handle.is_null()) {
                Some(first) => self.base_slot = Some(first as u32),
                None => self.clear(),
            }
        }
    }

    /// Forgets every binding.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.base_slot = None;
    }

    /// The contiguous range `bind` would send, as `(start_slot, handles)`.
    pub fn bound_range(&self) -> Option<(u32, &[NativeHandle])> {
        let base = self.base_slot?;
        let handles = self.slots.get(base as usize..)?;
        if handles.is_empty() {
            None
        } else {
            Some((base, handles))
        }
    }

    /// Sends the occupied range to `context` in a single call.
    ///
    /// Does nothing when the table is empty.
    pub fn bind(&self, context: &mut dyn GraphicsContext) {
        let Some((start_slot, handles)) = self.bound_range() else {
            return;
        };
        logwise::trace_sync!(
            "bind {stage} {kind} start={start} count={count}",
            stage = LogIt(&self.stage),
            kind = LogIt(&self.kind),
            start = start_slot,
            count = handles.len()
        );
        context.set_bindings(self.stage, self.kind, start_slot, handles);
    }

    /// Detaches the same range `bind` would send, leaving the table untouched.
    pub fn unbind(&self, context: &mut dyn GraphicsContext) {
        let Some((start_slot, handles)) = self.bound_range() else {
            return;
        };
        let nulls = vec![NativeHandle::NULL; handles.len()];
        context.set_bindings(self.stage, self.kind, start_slot, &nulls);
    }
}
