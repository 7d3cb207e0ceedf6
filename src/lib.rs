// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! shader_slots tracks which shader-visible resources are bound where, and remembers
  compiled shaders between runs.

The crate sits between a rendering pipeline and a graphics backend and covers two jobs
that backends leave to the application:

| Concern          | Type                                          | Owned by                         |
|------------------|-----------------------------------------------|----------------------------------|
| Slot bookkeeping | [`bindings::BindingSlotTable`]                | one command-recording thread     |
| Named bindings   | [`bindings::BindingRegistry`]                 | one command-recording thread     |
| Compiled shaders | [`shader::ShaderCacheEntry`], [`shader::ShaderCache`] | any thread, locked per entry |

# Binding tables

Each (stage, kind) pair gets a compact table of native handles.  The table remembers the
lowest occupied slot, so at draw time it emits exactly one "set N resources starting at
slot S" call into the [`context::GraphicsContext`] instead of rebinding from slot 0.

# Shader cache

Compiled bytecode is stored under a content hash of the shader variant, together with a
CRC32 of the bytecode and the vertex input layout the shader expects.  Entries serialize
to a compact little-endian record and are locked individually, so distinct shaders
compile in parallel while two requests for the same variant compile it once.

```
use shader_slots::bindings::{BindingRegistry, BindingKind, NativeHandle, ShaderStage};
use shader_slots::context::RecordingContext;

let mut registry = BindingRegistry::new();
registry.add_binding("albedo", ShaderStage::Pixel, BindingKind::ShaderResource, 2).unwrap();
registry.set("albedo", NativeHandle::new(0xBBBB));

let mut context = RecordingContext::new();
registry.bind(&mut context);
assert_eq!(context.calls().len(), 1);
assert_eq!(context.calls()[0].start_slot, 2);
```
*/

pub mod bindings;
pub mod context;
pub mod shader;

pub type Priority = async_file::Priority;
