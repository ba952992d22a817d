use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::store::JsonStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    /// ISO-8601 local time
    pub datetime: String,
    /// IANA zone name, or the UTC offset when the system zone is unknown
    pub timezone: String,
}

impl Timestamp {
    pub fn now() -> Self {
        Self::from_local(Local::now())
    }

    pub fn from_local(at: DateTime<Local>) -> Self {
        Self {
            datetime: at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            timezone: iana_time_zone::get_timezone().unwrap_or_else(|e| {
                debug!("System time zone unavailable ({}), recording offset", e);
                at.format("%:z").to_string()
            }),
        }
    }
}

/// One completed translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationHistoryEntry {
    pub user_id: String,
    pub timestamp: Timestamp,
    pub input_text: String,
    pub translated_text: String,
}

impl TranslationHistoryEntry {
    pub fn new(user_id: &str, input_text: &str, translated_text: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            timestamp: Timestamp::now(),
            input_text: input_text.to_string(),
            translated_text: translated_text.to_string(),
        }
    }
}

/// Append-only translation log.
///
/// Nothing is kept in memory between calls: every append re-reads the file so
/// entries written by another run since startup are preserved.
pub struct HistoryLog {
    store: JsonStore,
    resource: String,
}

impl HistoryLog {
    pub fn new(store: JsonStore, resource: impl Into<String>) -> Self {
        Self {
            store,
            resource: resource.into(),
        }
    }

    pub async fn append(&self, entry: TranslationHistoryEntry) -> Result<()> {
        let mut entries = self.entries().await?;
        entries.push(entry);
        self.store.save(&self.resource, &entries).await?;
        debug!("History now holds {} entries", entries.len());
        Ok(())
    }

    /// Every recorded entry, oldest first
    pub async fn entries(&self) -> Result<Vec<TranslationHistoryEntry>> {
        self.store.load(&self.resource).await
    }

    /// The most recent `limit` entries for `user_id`, oldest first
    pub async fn entries_for(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TranslationHistoryEntry>> {
        let mut entries: Vec<_> = self
            .entries()
            .await?
            .into_iter()
            .filter(|entry| entry.user_id == user_id)
            .collect();

        if let Some(limit) = limit {
            let skip = entries.len().saturating_sub(limit);
            entries.drain(..skip);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HISTORY: &str = "translation_history.json";

    fn log_in(dir: &std::path::Path) -> HistoryLog {
        HistoryLog::new(JsonStore::new(dir), HISTORY)
    }

    #[test]
    fn test_timestamp_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let ts = Timestamp::from_local(at);
        assert_eq!(ts.datetime, "2024-03-09T14:05:07.000000");
        assert!(!ts.timezone.is_empty());
    }

    #[test]
    fn test_timezone_is_system_zone_name() {
        let ts = Timestamp::now();
        match iana_time_zone::get_timezone() {
            Ok(zone) => assert_eq!(ts.timezone, zone),
            Err(_) => assert!(ts.timezone.starts_with('+') || ts.timezone.starts_with('-')),
        }
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(dir.path());

        for (input, output) in [("Bonjour", "Hello"), ("Merci", "Thank you"), ("Oui", "Yes")] {
            log.append(TranslationHistoryEntry::new("alice", input, output))
                .await
                .unwrap();
        }

        let entries = log.entries().await.unwrap();
        let inputs: Vec<_> = entries.iter().map(|e| e.input_text.as_str()).collect();
        assert_eq!(inputs, vec!["Bonjour", "Merci", "Oui"]);
        assert_eq!(entries[1].translated_text, "Thank you");
    }

    #[tokio::test]
    async fn test_append_keeps_entries_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(dir.path());
        log.append(TranslationHistoryEntry::new("alice", "Hallo", "Hello"))
            .await
            .unwrap();

        // Another process appends behind our back
        let other = log_in(dir.path());
        other
            .append(TranslationHistoryEntry::new("bob", "Hola", "Hello"))
            .await
            .unwrap();

        log.append(TranslationHistoryEntry::new("alice", "Ciao", "Hi"))
            .await
            .unwrap();

        let users: Vec<_> = log
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        assert_eq!(users, vec!["alice", "bob", "alice"]);
    }

    #[tokio::test]
    async fn test_entries_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(dir.path());
        let first = TranslationHistoryEntry::new("alice", "Bonjour", "Hello");
        log.append(first.clone()).await.unwrap();
        log.append(TranslationHistoryEntry::new("alice", "Salut", "Hi"))
            .await
            .unwrap();

        assert_eq!(log.entries().await.unwrap()[0], first);
    }

    #[tokio::test]
    async fn test_entries_for_filters_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(dir.path());
        for (user, input) in [("alice", "1"), ("bob", "2"), ("alice", "3"), ("alice", "4")] {
            log.append(TranslationHistoryEntry::new(user, input, input))
                .await
                .unwrap();
        }

        let all: Vec<_> = log
            .entries_for("alice", None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.input_text)
            .collect();
        assert_eq!(all, vec!["1", "3", "4"]);

        let recent: Vec<_> = log
            .entries_for("alice", Some(2))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.input_text)
            .collect();
        assert_eq!(recent, vec!["3", "4"]);
        assert!(log.entries_for("nobody", Some(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_recovers_from_corrupt_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(HISTORY), [0xff, 0xfe, 0x7b]).unwrap();
        let log = log_in(dir.path());

        log.append(TranslationHistoryEntry::new("alice", "Bonjour", "Hello"))
            .await
            .unwrap();

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].input_text, "Bonjour");
    }

    #[tokio::test]
    async fn test_reads_stored_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(HISTORY),
            r#"[{"user_id": "alice",
                 "timestamp": {"datetime": "2024-01-01T10:00:00", "timezone": "CET"},
                 "input_text": "Bonjour",
                 "translated_text": "Hello"}]"#,
        )
        .unwrap();

        let entries = log_in(dir.path()).entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp.timezone, "CET");
    }
}
