use std::path::PathBuf;

use async_trait::async_trait;

use crate::checksum;
use crate::domain::TestCase;
use crate::error::{JudgeError, Result};

/// Yields the ordered test cases of a problem. Injected into the orchestrator
/// so the backing store (filesystem scan, database, ...) stays swappable and
/// no global problem table exists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseProvider: std::fmt::Debug + Send + Sync {
    /// Must fail with `JudgeError::NoTestCases` when the problem has none.
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCase>>;
}

/// Filesystem-backed provider: scans `<root>/<problem_id>/` for `N.in` /
/// `N.out` pairs and digests each expected output at scan time.
#[derive(Debug)]
pub struct FsCaseProvider {
    root: PathBuf,
}

impl FsCaseProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CaseProvider for FsCaseProvider {
    #[tracing::instrument(skip(self))]
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCase>> {
        let problem_dir = self.root.join(problem_id);
        let mut entries = match tokio::fs::read_dir(&problem_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(JudgeError::NoTestCases {
                    problem_id: problem_id.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let mut stems = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("in") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    stems.push(stem.to_string());
                }
            }
        }
        if stems.is_empty() {
            return Err(JudgeError::NoTestCases {
                problem_id: problem_id.to_string(),
            });
        }

        // Numeric stems sort numerically, anything else falls back to
        // lexicographic order behind them.
        stems.sort_by_key(|stem| match stem.parse::<u64>() {
            Ok(n) => (0u8, n, stem.clone()),
            Err(_) => (1, 0, stem.clone()),
        });

        let mut cases = Vec::with_capacity(stems.len());
        for (index, stem) in stems.into_iter().enumerate() {
            let input_path = problem_dir.join(format!("{stem}.in"));
            let expected_output_path = problem_dir.join(format!("{stem}.out"));
            let expected = tokio::fs::read(&expected_output_path).await.map_err(|err| {
                JudgeError::Internal(format!(
                    "problem {problem_id}: missing or unreadable expected output {expected_output_path:?}: {err}"
                ))
            })?;

            cases.push(TestCase {
                index,
                input_path,
                expected_output_path,
                expected_checksum: checksum::digest(&expected),
                expected_trimmed_checksum: checksum::digest_trimmed(&expected),
            });
        }
        tracing::debug!("problem {} has {} test cases", problem_id, cases.len());
        Ok(cases)
    }
}
