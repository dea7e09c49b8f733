pub mod shell;

use std::path::Path;

use serde::Deserialize;

use crate::error::{JudgeError, Result};

/// Per-case resource budget enforced by the external harness.
#[derive(Clone, Copy, Debug)]
pub struct CaseLimits {
    pub time_ms: u64,
    pub memory_bytes: u64,
}

/// The structured record the harness prints for one run. Describes the judged
/// program; the harness's own exit code is reported separately.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    #[serde(rename = "result")]
    pub status: i32,
    #[serde(rename = "real_time")]
    pub time_ms: u64,
    #[serde(rename = "memory")]
    pub memory_bytes: u64,
}

impl RunRecord {
    /// Parses the harness's combined output. Anything that is not the record
    /// format is an internal failure, distinct from any judging verdict.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw.trim()).map_err(|source| JudgeError::MalformedRecord {
            raw: raw.to_string(),
            source,
        })
    }
}

/// One isolated run of an already-compiled executable. Invocations are
/// independent; the executable is the only shared (read-only) state.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SandboxRunner: std::fmt::Debug + Send + Sync {
    async fn run(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
        limits: CaseLimits,
    ) -> Result<RunRecord>;
}
