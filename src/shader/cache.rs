// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The on-disk shader cache.

A [`ShaderCache`] maps [`CacheKey`]s to [`CacheSlot`]s.  Lookups take a shared lock on
the map and then the entry's own lock; inserting a new key or clearing takes the map
exclusively.  Compiling one shader therefore never blocks lookups of another.

Encoding and saving read each slot's published record and take no entry locks.

# File layout

| Field                | Size |
|----------------------|------|
| version (`i32` LE)   | 4    |
| entry count (`i32` LE) | 4  |
| records              | see [`ShaderCacheEntry`] |

A file with a different version, or shorter than the header, is ignored and the cache
starts empty.
*/

use crate::shader::{
    CacheKey, CacheSlot, CorruptCacheEntryError, EncodeError, InputElementDescription,
    ShaderCacheEntry,
};
use logwise::privacy::LogIt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const VERSION: i32 = 3;
const HEADER_LEN: usize = 8;

/// Where and whether the cache persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderCacheConfig {
    /// Cache file location.
    pub path: PathBuf,
    /// When set, every lookup misses, inserts are dropped, and
    /// [`ShaderCache::slot_or_insert`] hands out slots that are not kept.
    pub disabled: bool,
    /// Write the file after every [`ShaderCache::insert`].
    pub save_on_insert: bool,
}

impl Default for ShaderCacheConfig {
    fn default() -> Self {
        ShaderCacheConfig {
            path: PathBuf::from("cache/shadercache.bin"),
            disabled: false,
            save_on_insert: false,
        }
    }
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedShader {
    pub bytecode: Vec<u8>,
    pub input_elements: Vec<InputElementDescription>,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheFileError {
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not read cache file: {0}")]
    Read(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Cache record {index} is corrupt: {source}")]
    Corrupt {
        index: usize,
        #[source]
        source: CorruptCacheEntryError,
    },
}

#[derive(Default)]
struct Entries {
    slots: Vec<Arc<CacheSlot>>,
    by_key: HashMap<CacheKey, usize>,
}

impl Entries {
    fn get(&self, key: &CacheKey) -> Option<&Arc<CacheSlot>> {
        self.by_key.get(key).map(|&i| &self.slots[i])
    }

    /// Adds `slot`, replacing any slot with the same key.
    fn push(&mut self, slot: Arc<CacheSlot>) {
        match self.by_key.get(&slot.key()) {
            Some(&i) => self.slots[i] = slot,
            None => {
                self.by_key.insert(slot.key(), self.slots.len());
                self.slots.push(slot);
            }
        }
    }
}

/// An encoded cache plus what it contains.
struct Snapshot {
    bytes: Vec<u8>,
    written: Vec<(Arc<CacheSlot>, u64)>,
}

pub struct ShaderCache {
    config: ShaderCacheConfig,
    entries: RwLock<Entries>,
    /// Orders snapshots taken by concurrent saves.
    next_save: AtomicU64,
    /// Sequence number of the snapshot the file currently holds.
    file: wasm_safe_mutex::Mutex<u64>,
}

impl ShaderCache {
    /// An empty cache.  Nothing is read until [`Self::load`].
    pub fn new(config: ShaderCacheConfig) -> Self {
        ShaderCache {
            config,
            entries: RwLock::new(Entries::default()),
            next_save: AtomicU64::new(1),
            file: wasm_safe_mutex::Mutex::new(0),
        }
    }

    pub fn config(&self) -> &ShaderCacheConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of every slot, in insertion order.
    pub fn entries(&self) -> Vec<Arc<CacheSlot>> {
        self.read().slots.clone()
    }

    pub fn slot(&self, key: &CacheKey) -> Option<Arc<CacheSlot>> {
        self.read().get(key).cloned()
    }

    /// The slot for `key`, creating an uncompiled one if absent.
    ///
    /// `input_elements` only applies to a newly created slot.  A disabled cache returns
    /// a fresh slot every time and does not keep it.
    pub fn slot_or_insert(
        &self,
        key: CacheKey,
        input_elements: Vec<InputElementDescription>,
    ) -> Arc<CacheSlot> {
        if self.config.disabled {
            return Arc::new(CacheSlot::new(ShaderCacheEntry::new(key, input_elements)));
        }
        if let Some(slot) = self.slot(&key) {
            return slot;
        }
        let mut entries = self.write();
        // another thread may have inserted between the two locks
        if let Some(slot) = entries.get(&key) {
            return slot.clone();
        }
        let slot = Arc::new(CacheSlot::new(ShaderCacheEntry::new(key, input_elements)));
        entries.push(slot.clone());
        slot
    }

    /// Looks up compiled bytecode for `key`.
    ///
    /// Entries that are uncompiled or fail their integrity check are misses.
    pub fn get(&self, key: &CacheKey) -> Option<CachedShader> {
        if self.config.disabled {
            return None;
        }
        let slot = self.slot(key)?;
        let entry = slot.lock_sync();
        let bytecode = entry.bytecode()?;
        if let Err(err) = entry.verify() {
            logwise::warn_sync!("Shader cache miss: {err}", err = LogIt(&err));
            return None;
        }
        Some(CachedShader {
            bytecode: bytecode.to_vec(),
            input_elements: entry.input_elements().to_vec(),
        })
    }

    /// Stores compiled bytecode for `key`, replacing whatever the entry held.
    ///
    /// Fails only when `save_on_insert` is set and the save fails; the entry is stored
    /// either way.
    pub fn insert(
        &self,
        key: CacheKey,
        input_elements: Vec<InputElementDescription>,
        bytecode: Vec<u8>,
    ) -> Result<(), CacheFileError> {
        if self.config.disabled {
            return Ok(());
        }
        let slot = self.slot_or_insert(key, Vec::new());
        {
            let mut entry = slot.lock_sync();
            entry.set_input_elements(input_elements);
            entry.store_bytecode(bytecode);
        }
        if self.config.save_on_insert {
            self.save()?;
        }
        Ok(())
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.write();
        let count = entries.slots.len();
        *entries = Entries::default();
        logwise::info_sync!("Cleared shader cache ({count} entries)", count = count);
    }

    /// Serializes the whole cache, header included.
    ///
    /// Entries are taken as of their last unlock, so this never waits for an in-flight
    /// compile.  Entries inserted after the call starts are not included.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.snapshot()?.bytes)
    }

    fn snapshot(&self) -> Result<Snapshot, EncodeError> {
        let slots = self.entries();
        let count = i32::try_from(slots.len()).map_err(|_| EncodeError::TooLarge {
            field: "entry count",
            len: slots.len(),
        })?;
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&count.to_le_bytes());
        let mut written = Vec::with_capacity(slots.len());
        for slot in slots {
            let record = slot.published();
            bytes.extend_from_slice(&record.bytes?);
            written.push((slot, record.revision));
        }
        Ok(Snapshot { bytes, written })
    }

    /// Replaces the cache contents with the records in `bytes`.
    ///
    /// A short header or a different version leaves the cache empty.  A corrupt record
    /// fails the whole decode and leaves the cache unchanged.
    pub fn decode(&self, bytes: &[u8]) -> Result<(), CacheFileError> {
        let Some(decoded) = decode_entries(bytes)? else {
            *self.write() = Entries::default();
            return Ok(());
        };
        let mut entries = Entries::default();
        for entry in decoded {
            if entries.get(&entry.key()).is_some() {
                logwise::warn_sync!(
                    "Duplicate shader cache record {key}; keeping the later one",
                    key = LogIt(&entry.key())
                );
            }
            entries.push(Arc::new(CacheSlot::new(entry)));
        }
        let count = entries.slots.len();
        *self.write() = entries;
        logwise::info_sync!("Decoded {count} shader cache entries", count = count);
        Ok(())
    }

    /// Writes the cache file, creating its directory if needed.
    ///
    /// Entries whose written revision is still current become persisted once the write
    /// succeeds.  When saves race, a snapshot older than the one already on disk is
    /// dropped rather than written.
    pub fn save(&self) -> Result<(), CacheFileError> {
        let sequence = self.next_save.fetch_add(1, Ordering::Relaxed);
        let snapshot = self.snapshot()?;
        let mut on_disk = self.file.lock_sync();
        if *on_disk > sequence {
            logwise::trace_sync!(
                "Skipping shader cache save {sequence}; {newer} already written",
                sequence = sequence,
                newer = *on_disk
            );
            return Ok(());
        }
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.config.path, &snapshot.bytes)?;
        *on_disk = sequence;
        for (slot, revision) in &snapshot.written {
            slot.persisted(*revision);
        }
        logwise::info_sync!(
            "Saved shader cache to {path} ({len} bytes)",
            path = LogIt(&self.config.path),
            len = snapshot.bytes.len()
        );
        Ok(())
    }

    /// Reads the cache file, replacing the current contents.
    ///
    /// A missing file leaves the cache empty.
    pub async fn load(&self, priority: async_file::Priority) -> Result<(), CacheFileError> {
        if !self.config.path.exists() {
            logwise::info_sync!(
                "No shader cache at {path}",
                path = LogIt(&self.config.path)
            );
            self.clear();
            return Ok(());
        }
        let file = async_file::File::open(self.config.path.as_path(), priority)
            .await
            .map_err(|e| CacheFileError::Read(format!("{e:?}")))?;
        let data = file
            .read_all(priority)
            .await
            .map_err(|e| CacheFileError::Read(format!("{e:?}")))?;
        self.decode(&*data)
    }
}

impl Default for ShaderCache {
    fn default() -> Self {
        ShaderCache::new(ShaderCacheConfig::default())
    }
}

impl std::fmt::Debug for ShaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderCache")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

/// `None` when the header is unusable.
fn decode_entries(bytes: &[u8]) -> Result<Option<Vec<ShaderCacheEntry>>, CacheFileError> {
    if bytes.len() < HEADER_LEN {
        logwise::warn_sync!(
            "Shader cache file too short ({len} bytes); ignoring",
            len = bytes.len()
        );
        return Ok(None);
    }
    let version = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if version != VERSION {
        logwise::warn_sync!(
            "Shader cache version {version} does not match {expected}; ignoring",
            version = version,
            expected = VERSION
        );
        return Ok(None);
    }
    let count = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let count = usize::try_from(count).map_err(|_| CacheFileError::Corrupt {
        index: 0,
        source: CorruptCacheEntryError::NegativeLength {
            field: "entry count",
            value: count,
        },
    })?;
    let mut out = Vec::with_capacity(count.min(bytes.len() / HEADER_LEN));
    let mut pos = HEADER_LEN;
    for index in 0..count {
        let (entry, used) = ShaderCacheEntry::read(&bytes[pos..])
            .map_err(|source| CacheFileError::Corrupt { index, source })?;
        pos += used;
        out.push(entry);
    }
    if pos != bytes.len() {
        logwise::warn_sync!(
            "Ignoring {extra} trailing bytes after shader cache records",
            extra = bytes.len() - pos
        );
    }
    Ok(Some(out))
}
