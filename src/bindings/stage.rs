// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Shader stages and binding kinds.
//!
//! Every binding table is keyed by a (stage, kind) pair.  Both enums expose an `ALL`
//! array and a dense `index()` so that per-pair storage can be a flat array.

/// Specifies which shader stage a resource should be bound to.
///
/// Each stage has independent binding tables; binding a texture to the pixel stage
/// does not make it visible to the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex shaders.
    Vertex,
    /// Hull (tessellation control) shaders.
    Hull,
    /// Domain (tessellation evaluation) shaders.
    Domain,
    /// Geometry shaders.
    Geometry,
    /// Pixel (fragment) shaders.
    Pixel,
    /// Compute shaders.
    Compute,
}

impl ShaderStage {
    /// All stages, in pipeline order.
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
        ShaderStage::Compute,
    ];

    /// Dense index of the stage, `0..6`.
    pub const fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Hull => 1,
            ShaderStage::Domain => 2,
            ShaderStage::Geometry => 3,
            ShaderStage::Pixel => 4,
            ShaderStage::Compute => 5,
        }
    }
}

/// The category of object bound to a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// Constant (uniform) buffer, register `bN`.
    ConstantBuffer,
    /// Shader-readable resource view, register `tN`.
    ShaderResource,
    /// Sampler state, register `sN`.
    Sampler,
}

impl BindingKind {
    pub const ALL: [BindingKind; 3] = [
        BindingKind::ConstantBuffer,
        BindingKind::ShaderResource,
        BindingKind::Sampler,
    ];

    pub const fn index(self) -> usize {
        match self {
            BindingKind::ConstantBuffer => 0,
            BindingKind::ShaderResource => 1,
            BindingKind::Sampler => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense() {
        for (i, stage) in ShaderStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        for (i, kind) in BindingKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
