use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{JudgeError, Result};

/// Languages with a registered compiler. Tags are case-sensitive: `C`, `CPP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    /// Resolves a language tag. An unrecognized tag is a configuration error,
    /// not a per-submission judging outcome.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "C" => Ok(Language::C),
            "CPP" => Ok(Language::Cpp),
            other => Err(JudgeError::UnsupportedLanguage(other.to_string())),
        }
    }

    pub fn source_extension(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

/// The unit of work: one submission to judge. Read-only after construction.
#[derive(Clone, Debug)]
pub struct SubmissionJob {
    pub id: String,
    pub problem_id: String,
    pub language: Language,
    pub source: String,
    pub time_limit_ms: u64,
    pub memory_limit_bytes: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SubmissionJob {
    /// Builds a job with a generated submission id.
    pub fn new(
        problem_id: &str,
        language: Language,
        source: &str,
        time_limit_ms: u64,
        memory_limit_bytes: u64,
    ) -> Self {
        Self::with_id(
            &Uuid::new_v4().to_string(),
            problem_id,
            language,
            source,
            time_limit_ms,
            memory_limit_bytes,
        )
    }

    /// Builds a job with a caller-supplied submission id.
    pub fn with_id(
        id: &str,
        problem_id: &str,
        language: Language,
        source: &str,
        time_limit_ms: u64,
        memory_limit_bytes: u64,
    ) -> Self {
        Self {
            id: id.to_string(),
            problem_id: problem_id.to_string(),
            language,
            source: source.to_string(),
            time_limit_ms,
            memory_limit_bytes,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn validate_limits(&self) -> Result<()> {
        if self.time_limit_ms == 0 || self.memory_limit_bytes == 0 {
            return Err(JudgeError::InvalidLimits {
                time_limit_ms: self.time_limit_ms,
                memory_limit_bytes: self.memory_limit_bytes,
            });
        }
        Ok(())
    }
}

/// The submission shape as the transport layer delivers it: raw language tag,
/// optional caller-supplied id. Binding happens in `TryFrom`, so an
/// unsupported tag is rejected before the pipeline touches the filesystem.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub problem_id: String,
    pub code: String,
    pub language: String,
    pub time_limit_ms: u64,
    pub memory_limit_bytes: u64,
}

impl TryFrom<SubmissionRequest> for SubmissionJob {
    type Error = JudgeError;

    fn try_from(req: SubmissionRequest) -> Result<Self> {
        let language = Language::parse(&req.language)?;
        let job = match req.id {
            Some(id) => SubmissionJob::with_id(
                &id,
                &req.problem_id,
                language,
                &req.code,
                req.time_limit_ms,
                req.memory_limit_bytes,
            ),
            None => SubmissionJob::new(
                &req.problem_id,
                language,
                &req.code,
                req.time_limit_ms,
                req.memory_limit_bytes,
            ),
        };
        job.validate_limits()?;
        Ok(job)
    }
}

/// Source text written to disk; produced by the save step, consumed by compile.
#[derive(Clone, Debug)]
pub struct SavedSource {
    pub job: SubmissionJob,
    pub source_path: PathBuf,
}

/// A successfully compiled submission. The executable is exclusively owned by
/// the submission that produced it and is read-only during the run phase.
#[derive(Clone, Debug)]
pub struct CompiledJob {
    pub job: SubmissionJob,
    pub executable: PathBuf,
}

/// One input/expected-output pair. The expected output is carried as a digest
/// pair, never as raw bytes.
#[derive(Clone, Debug)]
pub struct TestCase {
    pub index: usize,
    pub input_path: PathBuf,
    pub expected_output_path: PathBuf,
    pub expected_checksum: String,
    pub expected_trimmed_checksum: String,
}

/// Raw outcome of one sandboxed run, before classification.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub index: usize,
    pub status: i32,
    pub time_ms: u64,
    pub memory_bytes: u64,
    pub output_path: PathBuf,
}

/// Per-test-case outcome after classification.
#[derive(Clone, Debug)]
pub struct CaseResult {
    pub index: usize,
    pub verdict: crate::verdict::Verdict,
    pub time_ms: u64,
    pub memory_bytes: u64,
}

/// What the caller gets back for one submission: the aggregated verdict plus
/// the ordered per-case breakdown.
#[derive(Clone, Debug)]
pub struct JudgeReport {
    pub submission_id: String,
    pub verdict: crate::verdict::Verdict,
    pub time_ms: u64,
    pub memory_bytes: u64,
    pub cases: Vec<CaseResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registered_language_tags() {
        assert_eq!(Language::parse("C").unwrap(), Language::C);
        assert_eq!(Language::parse("CPP").unwrap(), Language::Cpp);
    }

    #[test]
    fn rejects_unknown_language_tag() {
        let err = Language::parse("PASCAL").unwrap_err();
        assert!(matches!(err, JudgeError::UnsupportedLanguage(tag) if tag == "PASCAL"));
    }

    #[test]
    fn language_tags_are_case_sensitive() {
        assert!(Language::parse("cpp").is_err());
        assert!(Language::parse("c").is_err());
    }

    #[test]
    fn generated_submission_ids_are_unique() {
        let a = SubmissionJob::new("1000", Language::C, "int main(){}", 1000, 1 << 26);
        let b = SubmissionJob::new("1000", Language::C, "int main(){}", 1000, 1 << 26);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn request_binding_rejects_unsupported_tag_before_any_work() {
        let req: SubmissionRequest = serde_json::from_str(
            r#"{
                "problem_id": "1000",
                "code": "program sum; begin end.",
                "language": "PASCAL",
                "time_limit_ms": 1000,
                "memory_limit_bytes": 67108864
            }"#,
        )
        .unwrap();
        let err = SubmissionJob::try_from(req).unwrap_err();
        assert!(matches!(err, JudgeError::UnsupportedLanguage(_)));
    }

    #[test]
    fn request_binding_generates_an_id_when_absent() {
        let req: SubmissionRequest = serde_json::from_str(
            r#"{
                "problem_id": "1000",
                "code": "int main(){}",
                "language": "C",
                "time_limit_ms": 1000,
                "memory_limit_bytes": 67108864
            }"#,
        )
        .unwrap();
        let job = SubmissionJob::try_from(req).unwrap();
        assert!(!job.id.is_empty());
        assert_eq!(job.language, Language::C);
    }

    #[test]
    fn zero_limits_are_invalid() {
        let job = SubmissionJob::with_id("s1", "1000", Language::C, "", 0, 1 << 26);
        assert!(matches!(
            job.validate_limits(),
            Err(JudgeError::InvalidLimits { .. })
        ));

        let job = SubmissionJob::with_id("s1", "1000", Language::C, "", 1000, 0);
        assert!(job.validate_limits().is_err());
    }
}
