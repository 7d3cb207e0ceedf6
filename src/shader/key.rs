// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Content-hash keys for shader variants.
//!
//! A variant is one compilation of a shader source: the same file compiled with a
//! different entry point, profile or macro set produces different bytecode and so
//! gets a different key.  Keys are SHA-256 digests over length-prefixed fields, so
//! `("ab", "c")` and `("a", "bc")` never collide.

use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display, Formatter};

/// Shader source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Hlsl,
    Glsl,
}

impl SourceLanguage {
    fn code(self) -> u32 {
        match self {
            SourceLanguage::Hlsl => 0,
            SourceLanguage::Glsl => 1,
        }
    }
}

/// A preprocessor definition passed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderMacro {
    pub name: String,
    pub definition: String,
}

impl ShaderMacro {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// Everything that distinguishes one compiled shader from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderVariant {
    /// Path or logical name of the shader source.
    pub source_name: String,
    pub language: SourceLanguage,
    pub entry_point: String,
    /// Target profile, e.g. `ps_5_0`.
    pub profile: String,
    /// Macros, in the order they are passed to the compiler.
    pub macros: Vec<ShaderMacro>,
}

/// A 32-byte content hash identifying one shader variant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        CacheKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hashes `variant` into its cache key.
    pub fn for_variant(variant: &ShaderVariant) -> Self {
        let mut hasher = Sha256::new();
        hash_str(&mut hasher, &variant.source_name);
        hasher.update(variant.language.code().to_le_bytes());
        hash_str(&mut hasher, &variant.entry_point);
        hash_str(&mut hasher, &variant.profile);
        hasher.update((variant.macros.len() as u64).to_le_bytes());
        for shader_macro in &variant.macros {
            hash_str(&mut hasher, &shader_macro.name);
            hash_str(&mut hasher, &shader_macro.definition);
        }
        CacheKey(hasher.finalize().into())
    }
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Debug for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CacheKey({self})")
    }
}
