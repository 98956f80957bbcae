//! The date → entry mapping and its persistence.
//!
//! The whole mapping is serialized as one JSON object under the
//! `diary_entries` blob. The in-memory map is authoritative: a failed flush is
//! logged and retried on the next write.

use crate::constants::KEY_DIARY_ENTRIES;
use crate::errors::AppResult;
use crate::journal::Entry;
use crate::storage::{read_json, write_json, BlobStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owns every persisted entry, keyed by date.
pub struct EntryStore {
    blobs: Arc<dyn BlobStore>,
    entries: BTreeMap<String, Entry>,
}

impl EntryStore {
    /// Loads the mapping from `blobs`.
    ///
    /// A missing blob yields an empty store. A blob that cannot be parsed is
    /// logged and also yields an empty store; it is only replaced on the next
    /// successful write. System messages are stripped from every loaded entry.
    pub fn load(blobs: Arc<dyn BlobStore>) -> Self {
        let entries = match read_json::<BTreeMap<String, Entry>>(blobs.as_ref(), KEY_DIARY_ENTRIES)
        {
            Ok(Some(mut entries)) => {
                for entry in entries.values_mut() {
                    entry.strip_system_messages();
                }
                debug!("Loaded {} entries", entries.len());
                entries
            }
            Ok(None) => {
                debug!("No stored entries found");
                BTreeMap::new()
            }
            Err(e) => {
                error!("Failed to load stored entries, starting empty: {}", e);
                BTreeMap::new()
            }
        };

        Self { blobs, entries }
    }

    /// Returns the stored entry for `date_key`, or a fresh unpersisted one.
    pub fn get(&self, date_key: &str, now: DateTime<Utc>) -> Entry {
        self.entries
            .get(date_key)
            .cloned()
            .unwrap_or_else(|| Entry::new(date_key, now))
    }

    /// Looks up a stored entry without creating one.
    pub fn find(&self, date_key: &str) -> Option<&Entry> {
        self.entries.get(date_key)
    }

    /// Stores `entry` and flushes the mapping.
    ///
    /// Entries without user messages are never persisted. Returns true if the
    /// entry was stored in memory; flush failures are logged, not returned.
    pub fn put(&mut self, entry: &Entry, now: DateTime<Utc>) -> bool {
        if !entry.has_messages() {
            debug!("Skipping save of empty entry {}", entry.date());
            return false;
        }

        let mut stored = entry.clone();
        stored.strip_system_messages();
        stored.touch(now);
        self.entries.insert(stored.date().to_string(), stored);

        if let Err(e) = self.flush() {
            warn!("Failed to persist entries, keeping them in memory: {}", e);
        }
        true
    }

    /// Writes the full mapping to the blob store.
    ///
    /// # Errors
    ///
    /// Returns the storage or serialization error from the blob store.
    pub fn flush(&self) -> AppResult<()> {
        write_json(self.blobs.as_ref(), KEY_DIARY_ENTRIES, &self.entries)?;
        debug!("Flushed {} entries", self.entries.len());
        Ok(())
    }

    /// Entries with at least one user message, newest first.
    pub fn history(&self) -> Vec<&Entry> {
        self.entries
            .values()
            .rev()
            .filter(|e| e.has_messages())
            .collect()
    }

    /// Entries matching `query`, newest first.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.history()
            .into_iter()
            .filter(|e| e.matches_query(query))
            .collect()
    }

    /// Iterates over all stored entries in date order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Removes every entry and deletes the blob.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the blob cannot be removed.
    pub fn clear(&mut self) -> AppResult<()> {
        self.entries.clear();
        self.blobs.remove(KEY_DIARY_ENTRIES)?;
        info!("Cleared all entries");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
