//! ledger.rs — durable record of announced promotions and registered chats.
//!
//! The store is a single JSON document rewritten in full on every mutation:
//!
//! ```json
//! {
//!   "sent_games": { "<app_id>": { "name": "...", "sent_at": "<ISO-8601>" } },
//!   "chat_ids": [ 123456789 ]
//! }
//! ```
//!
//! A missing or unreadable file means "nothing announced yet"; the process
//! never refuses to start over a bad store. Writes are best-effort: a failed
//! persist is logged and the in-memory state stays authoritative until the
//! next mutation retries the write.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Europe::Paris;
use serde::{Deserialize, Serialize};

/// Wall-clock time in the bot's reference timezone.
pub fn reference_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&Paris).fixed_offset()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentRecord {
    pub name: String,
    pub sent_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDoc {
    #[serde(default)]
    sent_games: BTreeMap<String, SentRecord>,
    #[serde(default)]
    chat_ids: BTreeSet<i64>,
}

/// Single source of truth for "has this item already been announced" and
/// "who should be notified". All mutations go through the mutex, so a manual
/// check overlapping a scheduled one cannot produce duplicate records.
#[derive(Debug)]
pub struct NotificationLedger {
    path: PathBuf,
    doc: Mutex<StoreDoc>,
}

impl NotificationLedger {
    /// Open (or create empty) the ledger backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "store unreadable, starting empty");
                StoreDoc::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDoc::default(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "store unreadable, starting empty");
                StoreDoc::default()
            }
        };
        Self {
            path,
            doc: Mutex::new(doc),
        }
    }

    pub fn is_notified(&self, app_id: &str) -> bool {
        let doc = self.doc.lock().expect("ledger mutex poisoned");
        doc.sent_games.contains_key(app_id)
    }

    /// Record `app_id` as announced. Idempotent: an existing record is left
    /// untouched. The document is rewritten to disk before returning, so a
    /// crash right after this call cannot lead to a duplicate notification.
    pub fn mark_notified(&self, app_id: &str, name: &str) {
        let mut doc = self.doc.lock().expect("ledger mutex poisoned");
        doc.sent_games
            .entry(app_id.to_string())
            .or_insert_with(|| SentRecord {
                name: name.to_string(),
                sent_at: reference_now(),
            });
        self.persist(&doc);
    }

    /// Add a recipient; returns whether it was newly added. New recipients
    /// are persisted immediately.
    pub fn register_recipient(&self, chat_id: i64) -> bool {
        let mut doc = self.doc.lock().expect("ledger mutex poisoned");
        let added = doc.chat_ids.insert(chat_id);
        if added {
            self.persist(&doc);
            tracing::info!(chat_id, "recipient registered");
        }
        added
    }

    /// Point-in-time snapshot of the recipient set.
    pub fn recipients(&self) -> Vec<i64> {
        let doc = self.doc.lock().expect("ledger mutex poisoned");
        doc.chat_ids.iter().copied().collect()
    }

    pub fn recipient_count(&self) -> usize {
        let doc = self.doc.lock().expect("ledger mutex poisoned");
        doc.chat_ids.len()
    }

    pub fn notified_count(&self) -> usize {
        let doc = self.doc.lock().expect("ledger mutex poisoned");
        doc.sent_games.len()
    }

    /// Full-document rewrite. Failures are logged, never propagated: the
    /// caller keeps a correct in-memory view and the next mutation retries.
    fn persist(&self, doc: &StoreDoc) {
        match serde_json::to_vec_pretty(doc) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&self.path, bytes) {
                    tracing::warn!(error = %e, path = %self.path.display(), "store write failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "store serialize failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_games.json");
        (dir, path)
    }

    #[test]
    fn absent_file_means_nothing_notified() {
        let (_dir, path) = temp_store();
        let ledger = NotificationLedger::open(&path);
        assert!(!ledger.is_notified("100"));
        assert_eq!(ledger.recipient_count(), 0);
    }

    #[test]
    fn corrupt_file_starts_empty_without_panicking() {
        let (_dir, path) = temp_store();
        fs::write(&path, "{ not json").unwrap();
        let ledger = NotificationLedger::open(&path);
        assert!(!ledger.is_notified("100"));
        // the next mutation overwrites the corrupt file
        ledger.mark_notified("100", "Portal 2");
        let reopened = NotificationLedger::open(&path);
        assert!(reopened.is_notified("100"));
    }

    #[test]
    fn mark_notified_is_durable_and_idempotent() {
        let (_dir, path) = temp_store();
        let ledger = NotificationLedger::open(&path);
        ledger.mark_notified("100", "Portal 2");
        ledger.mark_notified("100", "Renamed Later");
        assert_eq!(ledger.notified_count(), 1);

        let reopened = NotificationLedger::open(&path);
        assert!(reopened.is_notified("100"));
        assert_eq!(reopened.notified_count(), 1);

        // first write wins; the record is never overwritten
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["sent_games"]["100"]["name"], "Portal 2");
    }

    #[test]
    fn sent_at_is_a_parseable_timestamp() {
        let (_dir, path) = temp_store();
        let ledger = NotificationLedger::open(&path);
        ledger.mark_notified("100", "Portal 2");
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let ts = raw["sent_games"]["100"]["sent_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn register_recipient_reports_newly_added() {
        let (_dir, path) = temp_store();
        let ledger = NotificationLedger::open(&path);
        assert!(ledger.register_recipient(42));
        assert!(!ledger.register_recipient(42));
        assert_eq!(ledger.recipients(), vec![42]);
    }

    #[test]
    fn roundtrip_preserves_ids_and_recipients() {
        let (_dir, path) = temp_store();
        {
            let ledger = NotificationLedger::open(&path);
            ledger.mark_notified("100", "A");
            ledger.mark_notified("200", "B");
            ledger.register_recipient(1);
            ledger.register_recipient(2);
        }
        let reopened = NotificationLedger::open(&path);
        assert!(reopened.is_notified("100"));
        assert!(reopened.is_notified("200"));
        assert!(!reopened.is_notified("300"));
        assert_eq!(reopened.recipients(), vec![1, 2]);
    }

    #[test]
    fn unwritable_store_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // a directory at the store path makes every write fail
        let path = dir.path().join("as_dir");
        fs::create_dir(&path).unwrap();
        let ledger = NotificationLedger::open(&path);
        ledger.mark_notified("100", "A");
        assert!(ledger.is_notified("100"));
    }
}
