// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Named bindings over the full set of per-stage tables.
//!
//! Shaders refer to their resources by name (`"albedo"`, `"CameraConstants"`).  The
//! [`BindingRegistry`] maps each name to the stage, kind and slot it was declared
//! at, and owns one [`BindingSlotTable`] per (stage, kind) pair.  Rendering code sets
//! resources by name; at draw time [`BindingRegistry::bind`] flushes every table.
//!
//! # Example
//!
//! ```
//! use shader_slots::bindings::{BindingKind, BindingRegistry, NativeHandle, ShaderStage};
//! use shader_slots::context::RecordingContext;
//!
//! let mut registry = BindingRegistry::new();
//! registry.add_binding("camera", ShaderStage::Vertex, BindingKind::ConstantBuffer, 0).unwrap();
//! registry.add_binding("linear", ShaderStage::Pixel, BindingKind::Sampler, 1).unwrap();
//!
//! assert!(registry.set("camera", NativeHandle::new(0x10)));
//! assert!(registry.set("linear", NativeHandle::new(0x20)));
//! assert!(!registry.set("missing", NativeHandle::new(0x30)));
//!
//! let mut context = RecordingContext::new();
//! registry.bind(&mut context);
//! assert_eq!(context.calls().len(), 2);
//! ```

use crate::bindings::{BindingKind, BindingSlotTable, NativeHandle, ShaderStage};
use crate::context::GraphicsContext;
use std::collections::HashMap;

const TABLE_COUNT: usize = ShaderStage::ALL.len() * BindingKind::ALL.len();

/// Where a named binding lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub stage: ShaderStage,
    pub kind: BindingKind,
    pub slot: u32,
}

/// Returned when a binding name is registered twice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("A binding named {name:?} is already registered")]
pub struct DuplicateBindingError {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct BindingRegistry {
    bindings: HashMap<String, Binding>,
    tables: Vec<BindingSlotTable>,
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingRegistry {
    /// Creates a registry with no names and an empty table for every (stage, kind).
    pub fn new() -> Self {
        let mut tables = Vec::with_capacity(TABLE_COUNT);
        for stage in ShaderStage::ALL {
            for kind in BindingKind::ALL {
                tables.push(BindingSlotTable::new(stage, kind));
            }
        }
        Self {
            bindings: HashMap::new(),
            tables,
        }
    }

    fn table_index(stage: ShaderStage, kind: BindingKind) -> usize {
        stage.index() * BindingKind::ALL.len() + kind.index()
    }

    /// Registers `name` at the given stage, kind and slot.
    pub fn add_binding(
        &mut self,
        name: &str,
        stage: ShaderStage,
        kind: BindingKind,
        slot: u32,
    ) -> Result<(), DuplicateBindingError> {
        if self.bindings.contains_key(name) {
            return Err(DuplicateBindingError {
                name: name.to_owned(),
            });
        }
        self.bindings
            .insert(name.to_owned(), Binding { stage, kind, slot });
        Ok(())
    }

    /// Forgets `name`.  Whatever is bound at its slot stays bound.
    pub fn remove_binding(&mut self, name: &str) -> bool {
        self.bindings.remove(name).is_some()
    }

    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    /// Binds `handle` at the slot registered for `name`.  Returns false for unknown names.
    pub fn set(&mut self, name: &str, handle: NativeHandle) -> bool {
        let Some(binding) = self.binding(name) else {
            return false;
        };
        self.table_mut(binding.stage, binding.kind)
            .set(binding.slot, handle);
        true
    }

    /// Clears the slot registered for `name`.  Returns false for unknown names.
    pub fn unset(&mut self, name: &str) -> bool {
        let Some(binding) = self.binding(name) else {
            return false;
        };
        self.table_mut(binding.stage, binding.kind)
            .unset(binding.slot);
        true
    }

    pub fn table(&self, stage: ShaderStage, kind: BindingKind) -> &BindingSlotTable {
        &self.tables[Self::table_index(stage, kind)]
    }

    pub fn table_mut(&mut self, stage: ShaderStage, kind: BindingKind) -> &mut BindingSlotTable {
        &mut self.tables[Self::table_index(stage, kind)]
    }

    /// Every table, stage-major.
    pub fn tables(&self) -> &[BindingSlotTable] {
        &self.tables
    }

    /// Flushes every non-empty table to `context`.
    pub fn bind(&self, context: &mut dyn GraphicsContext) {
        for table in &self.tables {
            table.bind(context);
        }
    }

    /// Detaches everything `bind` would attach.
    pub fn unbind(&self, context: &mut dyn GraphicsContext) {
        for table in &self.tables {
            table.unbind(context);
        }
    }

    /// Forgets every name; table contents are kept.
    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    /// Empties every table; names are kept.
    pub fn clear(&mut self) {
        for table in &mut self.tables {
            table.clear();
        }
    }
}
