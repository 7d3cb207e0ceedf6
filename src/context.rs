// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The graphics backend as seen by the binding tables.
//!
//! Backends expose one batched "set N objects starting at slot S" entry point per
//! stage and binding kind, 18 in total.  [`GraphicsContext`] mirrors that surface so an
//! implementation is a thin forward to the native API.  The provided
//! [`GraphicsContext::set_bindings`] picks the right entry point for a (stage, kind)
//! pair, which is how [`crate::bindings::BindingSlotTable`] talks to the backend.

pub mod recording;

pub use recording::{BindCall, RecordingContext};

use crate::bindings::{BindingKind, NativeHandle, ShaderStage};

/// Per-stage binding entry points of a graphics context.
///
/// Every method binds `handles.len()` contiguous slots starting at `start_slot`.
/// A [`NativeHandle::NULL`] entry unbinds its slot.
pub trait GraphicsContext {
    fn vs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn hs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn ds_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn gs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn ps_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn cs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]);

    fn vs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn hs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn ds_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn gs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn ps_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn cs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]);

    fn vs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn hs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn ds_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn gs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn ps_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]);
    fn cs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]);

    /// Dispatches to the entry point for `stage` and `kind`.
    fn set_bindings(
        &mut self,
        stage: ShaderStage,
        kind: BindingKind,
        start_slot: u32,
        handles: &[NativeHandle],
    ) {
        match (kind, stage) {
            (BindingKind::ConstantBuffer, ShaderStage::Vertex) => {
                self.vs_set_constant_buffers(start_slot, handles)
            }
            (BindingKind::ConstantBuffer, ShaderStage::Hull) => {
                self.hs_set_constant_buffers(start_slot, handles)
            }
            (BindingKind::ConstantBuffer, ShaderStage::Domain) => {
                self.ds_set_constant_buffers(start_slot, handles)
            }
            (BindingKind::ConstantBuffer, ShaderStage::Geometry) => {
                self.gs_set_constant_buffers(start_slot, handles)
            }
            (BindingKind::ConstantBuffer, ShaderStage::Pixel) => {
                self.ps_set_constant_buffers(start_slot, handles)
            }
            (BindingKind::ConstantBuffer, ShaderStage::Compute) => {
                self.cs_set_constant_buffers(start_slot, handles)
            }
            (BindingKind::ShaderResource, ShaderStage::Vertex) => {
                self.vs_set_shader_resources(start_slot, handles)
            }
            (BindingKind::ShaderResource, ShaderStage::Hull) => {
                self.hs_set_shader_resources(start_slot, handles)
            }
            (BindingKind::ShaderResource, ShaderStage::Domain) => {
                self.ds_set_shader_resources(start_slot, handles)
            }
            (BindingKind::ShaderResource, ShaderStage::Geometry) => {
                self.gs_set_shader_resources(start_slot, handles)
            }
            (BindingKind::ShaderResource, ShaderStage::Pixel) => {
                self.ps_set_shader_resources(start_slot, handles)
            }
            (BindingKind::ShaderResource, ShaderStage::Compute) => {
                self.cs_set_shader_resources(start_slot, handles)
            }
            (BindingKind::Sampler, ShaderStage::Vertex) => self.vs_set_samplers(start_slot, handles),
            (BindingKind::Sampler, ShaderStage::Hull) => self.hs_set_samplers(start_slot, handles),
            (BindingKind::Sampler, ShaderStage::Domain) => self.ds_set_samplers(start_slot, handles),
            (BindingKind::Sampler, ShaderStage::Geometry) => {
                self.gs_set_samplers(start_slot, handles)
            }
            (BindingKind::Sampler, ShaderStage::Pixel) => self.ps_set_samplers(start_slot, handles),
            (BindingKind::Sampler, ShaderStage::Compute) => {
                self.cs_set_samplers(start_slot, handles)
            }
        }
    }
}
