// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Compiled shader caching.

A [`ShaderCache`] keeps one [`ShaderCacheEntry`] per shader variant, keyed by a
[`CacheKey`] hashed from the variant's source, entry point, profile and macros.  Each
entry sits in its own lockable [`CacheSlot`], so compiling different variants never
contends while two requests for the same variant compile it once.
*/

pub mod input_element;
pub mod key;
pub mod crc32;
mod wire;
pub mod cache_entry;
pub mod cache_slot;
pub mod cache;

pub use cache::{CacheFileError, CachedShader, ShaderCache, ShaderCacheConfig};
pub use cache_entry::{
    CorruptCacheEntryError, EncodeError, EntryState, ShaderCacheEntry, StaleOrCorruptEntryError,
};
pub use cache_slot::CacheSlot;
pub use crc32::Crc32;
pub use input_element::{Format, InputClassification, InputElementDescription};
pub use key::{CacheKey, ShaderMacro, ShaderVariant, SourceLanguage};
