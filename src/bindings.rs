// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Resource binding bookkeeping.

[`ShaderStage`] and [`BindingKind`] name the 18 (stage, kind) combinations a backend
binds separately.  A [`BindingSlotTable`] tracks the [`NativeHandle`]s bound to one
combination, and a [`BindingRegistry`] owns all 18 tables and resolves binding names
to their slots.
*/

pub mod stage;
pub mod handle;
pub mod slot_table;
pub mod registry;

pub use handle::NativeHandle;
pub use registry::{Binding, BindingRegistry, DuplicateBindingError};
pub use slot_table::BindingSlotTable;
pub use stage::{BindingKind, ShaderStage};
