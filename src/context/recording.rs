// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! A context that records binding calls instead of executing them.
//!
//! Useful as a deferred binding list that is built on one pass and replayed into the
//! real context later, and for inspecting exactly which ranges a table emits.

use crate::bindings::{BindingKind, NativeHandle, ShaderStage};
use crate::context::GraphicsContext;

/// One recorded "set resources" call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindCall {
    pub stage: ShaderStage,
    pub kind: BindingKind,
    pub start_slot: u32,
    pub handles: Vec<NativeHandle>,
}

/// Records every binding call in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingContext {
    calls: Vec<BindCall>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// The calls recorded so far, oldest first.
    pub fn calls(&self) -> &[BindCall] {
        &self.calls
    }

    /// Returns the recorded calls and starts a fresh recording.
    pub fn take_calls(&mut self) -> Vec<BindCall> {
        std::mem::take(&mut self.calls)
    }

    /// Issues every recorded call, in order, against `context`.
    pub fn replay(&self, context: &mut dyn GraphicsContext) {
        for call in &self.calls {
            context.set_bindings(call.stage, call.kind, call.start_slot, &call.handles);
        }
    }

    fn record(
        &mut self,
        stage: ShaderStage,
        kind: BindingKind,
        start_slot: u32,
        handles: &[NativeHandle],
    ) {
        self.calls.push(BindCall {
            stage,
            kind,
            start_slot,
            handles: handles.to_vec(),
        });
    }
}

impl GraphicsContext for RecordingContext {
    fn vs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Vertex, BindingKind::ConstantBuffer, start_slot, handles);
    }
    fn hs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Hull, BindingKind::ConstantBuffer, start_slot, handles);
    }
    fn ds_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Domain, BindingKind::ConstantBuffer, start_slot, handles);
    }
    fn gs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Geometry, BindingKind::ConstantBuffer, start_slot, handles);
    }
    fn ps_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Pixel, BindingKind::ConstantBuffer, start_slot, handles);
    }
    fn cs_set_constant_buffers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Compute, BindingKind::ConstantBuffer, start_slot, handles);
    }

    fn vs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Vertex, BindingKind::ShaderResource, start_slot, handles);
    }
    fn hs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Hull, BindingKind::ShaderResource, start_slot, handles);
    }
    fn ds_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Domain, BindingKind::ShaderResource, start_slot, handles);
    }
    fn gs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Geometry, BindingKind::ShaderResource, start_slot, handles);
    }
    fn ps_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Pixel, BindingKind::ShaderResource, start_slot, handles);
    }
    fn cs_set_shader_resources(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Compute, BindingKind::ShaderResource, start_slot, handles);
    }

    fn vs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Vertex, BindingKind::Sampler, start_slot, handles);
    }
    fn hs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Hull, BindingKind::Sampler, start_slot, handles);
    }
    fn ds_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Domain, BindingKind::Sampler, start_slot, handles);
    }
    fn gs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Geometry, BindingKind::Sampler, start_slot, handles);
    }
    fn ps_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Pixel, BindingKind::Sampler, start_slot, handles);
    }
    fn cs_set_samplers(&mut self, start_slot: u32, handles: &[NativeHandle]) {
        self.record(ShaderStage::Compute, BindingKind::Sampler, start_slot, handles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_matching_entry_point() {
        let mut context = RecordingContext::new();
        for stage in ShaderStage::ALL {
            for kind in BindingKind::ALL {
                context.set_bindings(stage, kind, 3, &[NativeHandle::new(7)]);
            }
        }
        let calls = context.take_calls();
        assert_eq!(calls.len(), 18);
        let mut i = 0;
        for stage in ShaderStage::ALL {
            for kind in BindingKind::ALL {
                assert_eq!(calls[i].stage, stage);
                assert_eq!(calls[i].kind, kind);
                assert_eq!(calls[i].start_slot, 3);
                i += 1;
            }
        }
        assert!(context.calls().is_empty());
    }

    #[test]
    fn replay_reproduces_calls() {
        let mut deferred = RecordingContext::new();
        deferred.ps_set_samplers(1, &[NativeHandle::new(1), NativeHandle::NULL]);
        deferred.vs_set_constant_buffers(0, &[NativeHandle::new(9)]);

        let mut immediate = RecordingContext::new();
        deferred.replay(&mut immediate);
        assert_eq!(immediate.calls(), deferred.calls());
    }
}
