use thiserror::Error;

pub type Result<T> = std::result::Result<T, JudgeError>;

/// Failure taxonomy for the judging pipeline.
///
/// Configuration and compile errors abort a submission before any test case
/// runs. Harness errors mean the sandbox binary itself misbehaved, which is
/// never the judged program's fault. Judging outcomes (wrong answer, limit
/// exceeded, ...) are verdicts, not errors, and never appear here.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("language `{0}` is not supported")]
    UnsupportedLanguage(String),

    #[error(
        "time and memory limits must be positive (got {time_limit_ms} ms, {memory_limit_bytes} bytes)"
    )]
    InvalidLimits {
        time_limit_ms: u64,
        memory_limit_bytes: u64,
    },

    #[error("compilation failed:\n{stderr}")]
    Compile { stderr: String },

    #[error("sandbox harness failed (exit {exit_code:?}): {output}")]
    Harness {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("sandbox harness did not finish within {deadline_ms} ms")]
    HarnessTimeout { deadline_ms: u64 },

    #[error("sandbox harness produced an unparseable result record: {raw}")]
    MalformedRecord {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("problem `{problem_id}` has no test cases")]
    NoTestCases { problem_id: String },

    #[error("{0}")]
    Internal(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl JudgeError {
    /// True for failures that abort the whole submission; false for the
    /// per-test-case failures the orchestrator records as an InternalError
    /// verdict while continuing with the remaining cases.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            JudgeError::MalformedRecord { .. } | JudgeError::Internal(_)
        )
    }
}
