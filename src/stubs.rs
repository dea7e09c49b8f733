//! Configurable stand-ins for the external collaborators, for exercising the
//! pipeline without a toolchain or a sandbox binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::cases::CaseProvider;
use crate::compiler::Compiler;
use crate::domain::TestCase;
use crate::error::{JudgeError, Result};
use crate::sandbox::{CaseLimits, RunRecord, SandboxRunner};

/// Succeeds with the requested executable path, or rejects every source with
/// the configured diagnostic.
#[derive(Clone, Debug)]
pub struct StubCompiler {
    reject_with: Option<String>,
    delay: Duration,
}

impl StubCompiler {
    pub fn accepting(delay: Duration) -> Self {
        Self {
            reject_with: None,
            delay,
        }
    }

    pub fn rejecting(stderr: &str, delay: Duration) -> Self {
        Self {
            reject_with: Some(stderr.to_string()),
            delay,
        }
    }
}

#[async_trait]
impl Compiler for StubCompiler {
    #[tracing::instrument(skip(self))]
    async fn compile(&self, _source_path: &Path, exe_path: &Path) -> Result<PathBuf> {
        tokio::time::sleep(self.delay).await;
        match &self.reject_with {
            None => Ok(exe_path.to_path_buf()),
            Some(stderr) => Err(JudgeError::Compile {
                stderr: stderr.clone(),
            }),
        }
    }
}

/// Writes a fixed output file and reports a fixed record for every run.
#[derive(Clone, Debug)]
pub struct StubSandbox {
    record: RunRecord,
    output: Vec<u8>,
    delay: Duration,
}

impl StubSandbox {
    pub fn new(record: RunRecord, output: &[u8], delay: Duration) -> Self {
        Self {
            record,
            output: output.to_vec(),
            delay,
        }
    }
}

#[async_trait]
impl SandboxRunner for StubSandbox {
    #[tracing::instrument(skip(self))]
    async fn run(
        &self,
        _executable: &Path,
        _input: &Path,
        output: &Path,
        _limits: CaseLimits,
    ) -> Result<RunRecord> {
        tokio::time::sleep(self.delay).await;
        tokio::fs::write(output, &self.output).await?;
        Ok(self.record)
    }
}

/// Serves a fixed case list for every problem id.
#[derive(Clone, Debug, Default)]
pub struct StaticCaseProvider {
    cases: Vec<TestCase>,
}

impl StaticCaseProvider {
    pub fn new(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }
}

#[async_trait]
impl CaseProvider for StaticCaseProvider {
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCase>> {
        if self.cases.is_empty() {
            return Err(JudgeError::NoTestCases {
                problem_id: problem_id.to_string(),
            });
        }
        Ok(self.cases.clone())
    }
}
