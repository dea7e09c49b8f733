use std::path::Path;

use crate::checksum;

/// Status codes reported by the sandbox harness inside its result record.
/// These describe the judged program, not the harness process itself.
pub mod status {
    pub const SUCCESS: i32 = 0;
    pub const CPU_TIME_EXCEEDED: i32 = 1;
    pub const WALL_TIME_EXCEEDED: i32 = 2;
    pub const MEMORY_EXCEEDED: i32 = 3;
    pub const RUNTIME_FAULT: i32 = 4;
    pub const SYSTEM_FAULT: i32 = 5;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    PresentationError,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    SystemError,
    InternalError,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::PresentationError => "Presentation Error",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::MemoryLimitExceeded => "Memory Limit Exceeded",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::SystemError => "System Error",
            Verdict::InternalError => "Internal Error",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a raw harness status code and the produced output to a verdict.
///
/// The ladder order matters: time and memory codes shadow the runtime-fault
/// code, which shadows the generic catch-all, because the harness's numbering
/// overlaps across failure families. Only a clean run gets its output read.
pub async fn classify(
    status: i32,
    actual_output: &Path,
    expected_checksum: &str,
    expected_trimmed_checksum: &str,
) -> Verdict {
    if let Some(verdict) = classify_status(status) {
        return verdict;
    }
    match tokio::fs::read(actual_output).await {
        Ok(bytes) => classify_output(&bytes, expected_checksum, expected_trimmed_checksum),
        Err(err) => {
            tracing::warn!("failed to read program output {:?}: {}", actual_output, err);
            Verdict::InternalError
        }
    }
}

/// The non-comparison half of the decision table. `None` means the run
/// succeeded and the output must be compared.
pub fn classify_status(status: i32) -> Option<Verdict> {
    match status {
        status::SUCCESS => None,
        status::CPU_TIME_EXCEEDED | status::WALL_TIME_EXCEEDED => {
            Some(Verdict::TimeLimitExceeded)
        }
        status::MEMORY_EXCEEDED => Some(Verdict::MemoryLimitExceeded),
        status::RUNTIME_FAULT => Some(Verdict::RuntimeError),
        status::SYSTEM_FAULT => Some(Verdict::SystemError),
        _ => Some(Verdict::InternalError),
    }
}

/// Pure comparison core: byte-exact digest match, then trimmed digest match,
/// then wrong answer.
pub fn classify_output(
    actual: &[u8],
    expected_checksum: &str,
    expected_trimmed_checksum: &str,
) -> Verdict {
    if checksum::digest(actual) == expected_checksum {
        Verdict::Accepted
    } else if checksum::digest_trimmed(actual) == expected_trimmed_checksum {
        Verdict::PresentationError
    } else {
        Verdict::WrongAnswer
    }
}
