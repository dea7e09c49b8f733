use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::Receiver;

use crate::error::Result;
use crate::verdict::Verdict;

/// Durable storage for final verdicts. One write per submission id; called off
/// the response path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerdictStore: std::fmt::Debug + Send + Sync {
    async fn record_verdict(
        &self,
        submission_id: &str,
        verdict: Verdict,
        time_ms: u64,
        memory_bytes: u64,
    ) -> Result<()>;
}

/// A verdict commit queued for asynchronous persistence.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub submission_id: String,
    pub verdict: Verdict,
    pub time_ms: u64,
    pub memory_bytes: u64,
}

/// Background stage draining the commit channel into the store. Persistence
/// failures are logged, never surfaced to the judging caller, and never block
/// the response path.
pub fn handle_committing(mut commit_rx: Receiver<CommitRequest>, store: Arc<dyn VerdictStore>) {
    tokio::spawn(async move {
        while let Some(req) = commit_rx.recv().await {
            let result = store
                .record_verdict(&req.submission_id, req.verdict, req.time_ms, req.memory_bytes)
                .await;
            match result {
                Ok(()) => {
                    tracing::debug!("committed verdict {} for {}", req.verdict, req.submission_id)
                }
                Err(err) => tracing::error!(
                    "failed to commit verdict for {}: {}",
                    req.submission_id,
                    err
                ),
            }
        }
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommittedVerdict {
    pub verdict: Verdict,
    pub time_ms: u64,
    pub memory_bytes: u64,
}

/// In-memory store, keyed by submission id. The SQL-backed store lives with
/// the transport layer.
#[derive(Debug, Default)]
pub struct MemoryVerdictStore {
    verdicts: DashMap<String, CommittedVerdict>,
}

impl MemoryVerdictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, submission_id: &str) -> Option<CommittedVerdict> {
        self.verdicts.get(submission_id).map(|entry| *entry.value())
    }
}

#[async_trait]
impl VerdictStore for MemoryVerdictStore {
    async fn record_verdict(
        &self,
        submission_id: &str,
        verdict: Verdict,
        time_ms: u64,
        memory_bytes: u64,
    ) -> Result<()> {
        self.verdicts.insert(
            submission_id.to_string(),
            CommittedVerdict {
                verdict,
                time_ms,
                memory_bytes,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JudgeError;
    use tokio::sync::mpsc;

    fn request(id: &str) -> CommitRequest {
        CommitRequest {
            submission_id: id.to_string(),
            verdict: Verdict::Accepted,
            time_ms: 12,
            memory_bytes: 2048,
        }
    }

    #[tokio::test]
    async fn committer_drains_the_channel_into_the_store() {
        let store = Arc::new(MemoryVerdictStore::new());
        let (commit_tx, commit_rx) = mpsc::channel(8);
        handle_committing(commit_rx, store.clone());

        commit_tx.send(request("s1")).await.unwrap();
        commit_tx.send(request("s2")).await.unwrap();
        drop(commit_tx);

        // The committer runs on its own task; poll until it catches up.
        for _ in 0..50 {
            if store.get("s2").is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let committed = store.get("s1").expect("s1 committed");
        assert_eq!(committed.verdict, Verdict::Accepted);
        assert_eq!(committed.time_ms, 12);
        assert!(store.get("s2").is_some());
    }

    #[tokio::test]
    async fn store_failure_does_not_kill_the_committer() {
        let mut store = MockVerdictStore::new();
        let mut first = true;
        store
            .expect_record_verdict()
            .times(2)
            .returning(move |_, _, _, _| {
                if std::mem::take(&mut first) {
                    Err(JudgeError::Internal("db down".to_string()))
                } else {
                    Ok(())
                }
            });

        let (commit_tx, commit_rx) = mpsc::channel(8);
        handle_committing(commit_rx, Arc::new(store));

        commit_tx.send(request("s1")).await.unwrap();
        commit_tx.send(request("s2")).await.unwrap();
        drop(commit_tx);

        // Both sends are consumed even though the first commit failed; the
        // mock's `times(2)` expectation panics the test otherwise.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn memory_store_overwrites_per_submission() {
        let store = MemoryVerdictStore::new();
        store
            .record_verdict("s1", Verdict::WrongAnswer, 5, 100)
            .await
            .unwrap();
        store
            .record_verdict("s1", Verdict::Accepted, 7, 200)
            .await
            .unwrap();
        assert_eq!(store.get("s1").unwrap().verdict, Verdict::Accepted);
    }
}
