// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Per-entry locking.
//!
//! A [`CacheSlot`] wraps one [`ShaderCacheEntry`] in its own mutex.  Threads working
//! on different shader variants hold different locks and never wait on each other;
//! a second request for a variant that is mid-compilation blocks until the first
//! finishes and then finds the bytecode already there.
//!
//! The lock has no timeout.  Guards release on drop, so early returns and panics
//! inside a critical section cannot leave a slot locked.
//!
//! # Published records
//!
//! When a guard that changed the entry is dropped, the slot re-encodes the entry into
//! a published record.  Saving the cache reads those records and never takes an
//! entry lock, so a save neither waits for an in-flight compile nor deadlocks when
//! called from inside one.  A save reports back the revision it wrote; the entry
//! becomes [`EntryState::Persisted`](crate::shader::EntryState::Persisted) the next
//! time it is locked, and only if it has not changed since.

use crate::shader::{CacheKey, EncodeError, EntryState, ShaderCacheEntry};
use logwise::privacy::LogIt;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use wasm_safe_mutex::Mutex;

/// The last encoded form of an entry.
#[derive(Debug, Clone)]
pub(crate) struct PublishedRecord {
    pub(crate) revision: u64,
    pub(crate) bytes: Result<Arc<[u8]>, EncodeError>,
}

struct Published {
    record: PublishedRecord,
    /// Revision known to match the cache file.
    persisted: Option<u64>,
}

impl Published {
    fn of(entry: &ShaderCacheEntry) -> Self {
        let record = encode(entry);
        let persisted = (entry.state() == EntryState::Persisted).then_some(record.revision);
        Published { record, persisted }
    }
}

fn encode(entry: &ShaderCacheEntry) -> PublishedRecord {
    PublishedRecord {
        revision: entry.revision(),
        bytes: entry.to_bytes().map(Arc::from),
    }
}

pub struct CacheSlot {
    key: CacheKey,
    entry: Mutex<ShaderCacheEntry>,
    // lock order: entry, then published
    published: Mutex<Published>,
}

/// Locked access to a slot's entry.  Republishes the record on drop if it changed.
struct EntryGuard<'a, G: DerefMut<Target = ShaderCacheEntry>> {
    guard: G,
    published: &'a Mutex<Published>,
}

impl<G: DerefMut<Target = ShaderCacheEntry>> Deref for EntryGuard<'_, G> {
    type Target = ShaderCacheEntry;

    fn deref(&self) -> &ShaderCacheEntry {
        &self.guard
    }
}

impl<G: DerefMut<Target = ShaderCacheEntry>> DerefMut for EntryGuard<'_, G> {
    fn deref_mut(&mut self) -> &mut ShaderCacheEntry {
        &mut self.guard
    }
}

impl<G: DerefMut<Target = ShaderCacheEntry>> Drop for EntryGuard<'_, G> {
    fn drop(&mut self) {
        let mut published = self.published.lock_sync();
        if published.record.revision != self.guard.revision() {
            published.record = encode(&self.guard);
        }
    }
}

impl CacheSlot {
    pub fn new(entry: ShaderCacheEntry) -> Self {
        Self {
            key: entry.key(),
            published: Mutex::new(Published::of(&entry)),
            entry: Mutex::new(entry),
        }
    }

    /// The entry's key, readable without taking the lock.
    pub fn key(&self) -> CacheKey {
        self.key
    }

    fn guard<G: DerefMut<Target = ShaderCacheEntry>>(&self, mut guard: G) -> EntryGuard<'_, G> {
        if self.published.lock_sync().persisted == Some(guard.revision()) {
            guard.mark_persisted();
        }
        EntryGuard {
            guard,
            published: &self.published,
        }
    }

    /// Blocks until the entry is exclusively ours.
    ///
    /// The guard must not be used to swap in an entry with a different key.
    pub fn lock_sync(&self) -> impl DerefMut<Target = ShaderCacheEntry> + '_ {
        self.guard(self.entry.lock_sync())
    }

    /// Waits asynchronously until the entry is exclusively ours.
    pub async fn lock_async(&self) -> impl DerefMut<Target = ShaderCacheEntry> + '_ {
        let guard = self.entry.lock_async().await;
        self.guard(guard)
    }

    /// The most recently published record.  Never waits on the entry lock.
    pub(crate) fn published(&self) -> PublishedRecord {
        self.published.lock_sync().record.clone()
    }

    /// Notes that `revision` is now on disk.  Ignored if the entry moved on since.
    pub(crate) fn persisted(&self, revision: u64) {
        let mut published = self.published.lock_sync();
        if published.record.revision == revision {
            published.persisted = Some(revision);
        }
    }

    /// Returns the entry's bytecode, compiling it first if needed.
    ///
    /// `compile` runs at most once per slot across all threads, unless it fails or the
    /// stored bytecode fails its integrity check.  Empty output counts as compiled.  A
    /// failed compile leaves the entry uncompiled and returns the error.
    ///
    /// The slot stays locked while `compile` runs, so `compile` must not lock this slot
    /// again (directly or through [`ShaderCache::insert`](crate::shader::ShaderCache::insert)
    /// of the same key).  Saving the cache from inside `compile` is fine.
    pub fn get_or_compile<E>(
        &self,
        compile: impl FnOnce(&ShaderCacheEntry) -> Result<Vec<u8>, E>,
    ) -> Result<Vec<u8>, E> {
        let mut entry = self.lock_sync();
        if let Some(bytecode) = entry.bytecode() {
            match entry.verify() {
                Ok(()) => return Ok(bytecode.to_vec()),
                Err(err) => {
                    logwise::warn_sync!(
                        "Recompiling shader: {err}",
                        err = LogIt(&err)
                    );
                    entry.free();
                }
            }
        }
        let bytecode = compile(&entry)?;
        logwise::info_sync!(
            "Compiled shader {key} ({len} bytes)",
            key = LogIt(&self.key),
            len = bytecode.len()
        );
        let out = bytecode.clone();
        entry.store_bytecode(bytecode);
        Ok(out)
    }
}

impl Debug for CacheSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSlot").field("key", &self.key).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> CacheSlot {
        CacheSlot::new(ShaderCacheEntry::new(CacheKey::from_bytes([1; 32]), Vec::new()))
    }

    #[test]
    fn compiles_once() {
        let slot = slot();
        let mut calls = 0;
        let first = slot
            .get_or_compile(|_| {
                calls += 1;
                Ok::<_, ()>(vec![1, 2, 3])
            })
            .unwrap();
        let second = slot
            .get_or_compile(|_| {
                calls += 1;
                Ok::<_, ()>(vec![9])
            })
            .unwrap();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, vec![1, 2, 3]);
        assert_eq!(calls, 1);
        assert_eq!(slot.lock_sync().state(), EntryState::Compiled);
    }

    #[test]
    fn empty_output_compiles_once() {
        let slot = slot();
        let mut calls = 0;
        for _ in 0..3 {
            let bytecode = slot
                .get_or_compile(|_| {
                    calls += 1;
                    Ok::<_, ()>(Vec::new())
                })
                .unwrap();
            assert!(bytecode.is_empty());
        }
        assert_eq!(calls, 1);
        assert_eq!(slot.lock_sync().state(), EntryState::Compiled);
    }

    #[test]
    fn failed_compile_leaves_entry_uncompiled() {
        let slot = slot();
        let result = slot.get_or_compile(|_| Err("syntax error"));
        assert_eq!(result, Err("syntax error"));
        assert_eq!(slot.lock_sync().state(), EntryState::Uncompiled);
        let retried = slot.get_or_compile(|_| Ok::<_, &str>(vec![4]));
        assert_eq!(retried, Ok(vec![4]));
    }

    #[test]
    fn corrupt_bytecode_is_recompiled() {
        let slot = CacheSlot::new(ShaderCacheEntry::from_parts(
            CacheKey::from_bytes([2; 32]),
            0xDEAD_BEEF,
            Vec::new(),
            vec![1, 2, 3],
        ));
        let bytecode = slot.get_or_compile(|_| Ok::<_, ()>(vec![5, 6])).unwrap();
        assert_eq!(bytecode, vec![5, 6]);
        assert!(slot.lock_sync().verify().is_ok());
    }

    #[test]
    fn async_lock_sees_sync_writes() {
        let slot = slot();
        slot.lock_sync().store_bytecode(vec![8, 8]);
        let len = test_executors::spin_on(async { slot.lock_async().await.bytecode_len() });
        assert_eq!(len, 2);
    }

    #[test]
    fn record_is_republished_when_the_guard_drops() {
        let slot = slot();
        let before = slot.published();
        {
            let mut entry = slot.lock_sync();
            entry.store_bytecode(vec![1, 2]);
            // not yet visible while the guard is held
            assert_eq!(slot.published().revision, before.revision);
        }
        let after = slot.published();
        assert_ne!(after.revision, before.revision);
        let (decoded, _) = ShaderCacheEntry::read(&after.bytes.unwrap()).unwrap();
        assert_eq!(decoded.bytecode(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn stale_persisted_notice_is_ignored() {
        let slot = slot();
        slot.lock_sync().store_bytecode(vec![1]);
        let written = slot.published().revision;
        slot.lock_sync().store_bytecode(vec![2]);
        slot.persisted(written);
        assert_eq!(slot.lock_sync().state(), EntryState::Compiled);

        slot.persisted(slot.published().revision);
        assert_eq!(slot.lock_sync().state(), EntryState::Persisted);
    }
}
