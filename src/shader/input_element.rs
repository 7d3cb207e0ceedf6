// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Vertex input-element descriptions.
//!
//! An input element tells the input assembler where one shader input (`POSITION`,
//! `TEXCOORD1`, ...) lives in the bound vertex buffers.  A shader's full layout is an
//! ordered list of elements in input-signature order, and that order is preserved
//! through the cache.
//!
//! # Example
//!
//! ```
//! use shader_slots::shader::{Format, InputElementDescription};
//!
//! let layout = vec![
//!     InputElementDescription::per_vertex("POSITION", 0, Format::R32G32B32Float, 0),
//!     InputElementDescription::per_vertex(
//!         "TEXCOORD",
//!         0,
//!         Format::R32G32Float,
//!         InputElementDescription::APPEND_ALIGNED,
//!     ),
//! ];
//! assert_eq!(layout[1].aligned_byte_offset, -1);
//! ```

use std::hash::{Hash, Hasher};

/// Element data format, stored as its backend integer code.
///
/// Only formats that commonly appear in vertex layouts are named.  Any other code is
/// carried as [`Format::Other`] so cache records round-trip unchanged.
///
/// Formats compare by code: `Format::Other(6)` equals `Format::R32G32B32Float`.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum Format {
    Unknown,
    R32G32B32A32Float,
    R32G32B32A32UInt,
    R32G32B32Float,
    R16G16B16A16Float,
    R16G16B16A16UNorm,
    R32G32Float,
    R32G32UInt,
    R10G10B10A2UNorm,
    R8G8B8A8UNorm,
    R8G8B8A8UInt,
    R8G8B8A8SNorm,
    R16G16Float,
    R32Float,
    R32UInt,
    R32SInt,
    Other(i32),
}

impl Format {
    pub fn code(self) -> i32 {
        match self {
            Format::Unknown => 0,
            Format::R32G32B32A32Float => 2,
            Format::R32G32B32A32UInt => 3,
            Format::R32G32B32Float => 6,
            Format::R16G16B16A16Float => 10,
            Format::R16G16B16A16UNorm => 11,
            Format::R32G32Float => 16,
            Format::R32G32UInt => 17,
            Format::R10G10B10A2UNorm => 24,
            Format::R8G8B8A8UNorm => 28,
            Format::R8G8B8A8UInt => 30,
            Format::R8G8B8A8SNorm => 31,
            Format::R16G16Float => 34,
            Format::R32Float => 41,
            Format::R32UInt => 42,
            Format::R32SInt => 43,
            Format::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Format::Unknown,
            2 => Format::R32G32B32A32Float,
            3 => Format::R32G32B32A32UInt,
            6 => Format::R32G32B32Float,
            10 => Format::R16G16B16A16Float,
            11 => Format::R16G16B16A16UNorm,
            16 => Format::R32G32Float,
            17 => Format::R32G32UInt,
            24 => Format::R10G10B10A2UNorm,
            28 => Format::R8G8B8A8UNorm,
            30 => Format::R8G8B8A8UInt,
            31 => Format::R8G8B8A8SNorm,
            34 => Format::R16G16Float,
            41 => Format::R32Float,
            42 => Format::R32UInt,
            43 => Format::R32SInt,
            other => Format::Other(other),
        }
    }
}

/// Whether an element advances per vertex or per instance.  Compares by code.
#[derive(Debug, Clone, Copy)]
pub enum InputClassification {
    PerVertex,
    PerInstance,
    Other(i32),
}

impl InputClassification {
    pub fn code(self) -> i32 {
        match self {
            InputClassification::PerVertex => 0,
            InputClassification::PerInstance => 1,
            InputClassification::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => InputClassification::PerVertex,
            1 => InputClassification::PerInstance,
            other => InputClassification::Other(other),
        }
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Format {}

impl Hash for Format {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl PartialEq for InputClassification {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for InputClassification {}

impl Hash for InputClassification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

/// One element of a vertex layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputElementDescription {
    /// The semantic this element feeds, e.g. `POSITION`.
    pub semantic_name: String,
    /// Disambiguates repeated semantics (`TEXCOORD0`, `TEXCOORD1`).
    pub semantic_index: i32,
    pub format: Format,
    /// Input-assembler slot (vertex buffer index).
    pub slot: i32,
    /// Byte offset within the vertex, or [`Self::APPEND_ALIGNED`].
    pub aligned_byte_offset: i32,
    pub classification: InputClassification,
    /// Instances drawn per element advance.  Must be 0 for per-vertex data.
    pub instance_data_step_rate: i32,
}

impl InputElementDescription {
    /// Places the element directly after the previous one, with any required padding.
    pub const APPEND_ALIGNED: i32 = -1;

    pub fn new(
        semantic_name: impl Into<String>,
        semantic_index: i32,
        format: Format,
        slot: i32,
        aligned_byte_offset: i32,
        classification: InputClassification,
        instance_data_step_rate: i32,
    ) -> Self {
        Self {
            semantic_name: semantic_name.into(),
            semantic_index,
            format,
            slot,
            aligned_byte_offset,
            classification,
            instance_data_step_rate,
        }
    }

    /// A per-vertex element in slot 0.
    pub fn per_vertex(
        semantic_name: impl Into<String>,
        semantic_index: i32,
        format: Format,
        aligned_byte_offset: i32,
    ) -> Self {
        Self::new(
            semantic_name,
            semantic_index,
            format,
            0,
            aligned_byte_offset,
            InputClassification::PerVertex,
            0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_codes_are_stable() {
        assert_eq!(Format::R32G32B32Float.code(), 6);
        assert_eq!(Format::from_code(28), Format::R8G8B8A8UNorm);
        assert_eq!(Format::from_code(99), Format::Other(99));
        assert_eq!(Format::Other(99).code(), 99);
    }

    #[test]
    fn classification_codes() {
        assert_eq!(InputClassification::from_code(1), InputClassification::PerInstance);
        assert_eq!(InputClassification::Other(5).code(), 5);
    }

    #[test]
    fn other_with_a_named_code_is_that_variant() {
        use std::collections::HashSet;

        assert_eq!(Format::Other(6), Format::R32G32B32Float);
        assert_ne!(Format::Other(7), Format::R32G32B32Float);
        assert_eq!(InputClassification::Other(0), InputClassification::PerVertex);

        let formats: HashSet<Format> = [Format::Other(28), Format::R8G8B8A8UNorm].into();
        assert_eq!(formats.len(), 1);
    }
}
