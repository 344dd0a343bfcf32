//! JSONL file store for finished turns.
//!
//! Each [`TurnRecord`] is serialized as a single JSON line and appended to
//! the file via a buffered writer. File writes run on the blocking pool.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use superai_application::{HistoryError, HistoryReader, HistoryWriter, TurnRecord};
use tracing::{debug, warn};

/// Append-only JSONL history, one turn per line.
///
/// Thread-safe via `Arc<Mutex<BufWriter<File>>>`. Flushes after every record
/// and on `Drop`.
pub struct JsonlHistoryStore {
    writer: Arc<Mutex<BufWriter<File>>>,
    path: PathBuf,
}

impl JsonlHistoryStore {
    /// Open (or create) the history file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryWriter for JsonlHistoryStore {
    async fn persist_turn(&self, record: &TurnRecord) -> Result<(), HistoryError> {
        let line = serde_json::to_string(record)?;
        let writer = Arc::clone(&self.writer);
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut writer = writer
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            writeln!(writer, "{}", line)?;
            writer.flush()
        })
        .await
        .map_err(std::io::Error::other)??;
        debug!(turn_id = %record.turn_id, path = %self.path.display(), "Turn persisted");
        Ok(())
    }
}

#[async_trait]
impl HistoryReader for JsonlHistoryStore {
    async fn list_turns(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
    ) -> Result<Vec<TurnRecord>, HistoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut turns: Vec<TurnRecord> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<TurnRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), "Skipping unreadable history line: {}", e);
                    None
                }
            })
            .filter(|record| record.matches(user_id, conversation_id))
            .collect();

        turns.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(turns)
    }
}

impl Drop for JsonlHistoryStore {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use superai_domain::{AnswerSource, DegradedReason, TurnId};

    fn record(user: Option<&str>, prompt: &str, minutes_ago: i64) -> TurnRecord {
        record_in(user, None, prompt, minutes_ago)
    }

    fn record_in(
        user: Option<&str>,
        conversation: Option<&str>,
        prompt: &str,
        minutes_ago: i64,
    ) -> TurnRecord {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        TurnRecord {
            turn_id: TurnId::new(),
            user_id: user.map(str::to_string),
            conversation_id: conversation.map(str::to_string),
            prompt: prompt.to_string(),
            responses: Vec::new(),
            final_answer: "answer".to_string(),
            degraded: true,
            answer_source: AnswerSource::Fallback {
                reason: DegradedReason::NoResponses,
            },
            created_at: at,
            completed_at: at,
        }
    }

    #[tokio::test]
    async fn test_persist_and_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::open(dir.path().join("nested/history.jsonl")).unwrap();

        store.persist_turn(&record(Some("u1"), "older", 10)).await.unwrap();
        store.persist_turn(&record(Some("u2"), "other user", 5)).await.unwrap();
        store.persist_turn(&record(Some("u1"), "newer", 1)).await.unwrap();
        store.persist_turn(&record(None, "anonymous", 0)).await.unwrap();

        let turns = store.list_turns("u1", None).await.unwrap();
        let prompts: Vec<&str> = turns.iter().map(|t| t.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");

        let first = JsonlHistoryStore::open(&path).unwrap();
        first.persist_turn(&record(Some("u1"), "one", 2)).await.unwrap();
        drop(first);

        let second = JsonlHistoryStore::open(&path).unwrap();
        second.persist_turn(&record(Some("u1"), "two", 1)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("turnId").is_some());
            assert_eq!(value["answerSource"]["type"], "fallback");
        }
        assert_eq!(second.list_turns("u1", None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        std::fs::write(&path, "not json\n\n").unwrap();

        let store = JsonlHistoryStore::open(&path).unwrap();
        store.persist_turn(&record(Some("u1"), "ok", 0)).await.unwrap();
        let turns = store.list_turns("u1", None).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].prompt, "ok");
    }

    #[tokio::test]
    async fn test_list_filters_by_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::open(dir.path().join("history.jsonl")).unwrap();

        store
            .persist_turn(&record_in(Some("u1"), Some("c1"), "first in c1", 3))
            .await
            .unwrap();
        store
            .persist_turn(&record_in(Some("u1"), Some("c2"), "only in c2", 2))
            .await
            .unwrap();
        store
            .persist_turn(&record_in(Some("u1"), Some("c1"), "second in c1", 1))
            .await
            .unwrap();
        store
            .persist_turn(&record_in(Some("u2"), Some("c1"), "other user", 0))
            .await
            .unwrap();

        let turns = store.list_turns("u1", Some("c1")).await.unwrap();
        let prompts: Vec<&str> = turns.iter().map(|t| t.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["second in c1", "first in c1"]);

        assert_eq!(store.list_turns("u1", None).await.unwrap().len(), 3);
        assert!(store.list_turns("u1", Some("c9")).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_persists_keep_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = Arc::new(JsonlHistoryStore::open(&path).unwrap());

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            tasks.spawn(async move {
                store
                    .persist_turn(&record(Some("u1"), &format!("turn {}", i), 0))
                    .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 32);
        assert_eq!(store.list_turns("u1", None).await.unwrap().len(), 32);
    }
}
