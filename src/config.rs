use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{JudgeError, Result};

/// Pipeline configuration, loadable from a TOML file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Where submitted source files are written.
    pub source_dir: PathBuf,
    /// Where compiled executables are written.
    pub exe_dir: PathBuf,
    /// Where per-case program output is written.
    pub output_dir: PathBuf,
    /// Root directory of problem test data (`<problem_dir>/<problem_id>/`).
    pub problem_dir: PathBuf,
    pub sandbox: SandboxConfig,
    /// Width of the per-submission test-case worker pool.
    pub max_parallel_cases: usize,
    /// Grace margin added to the wall-clock limit for the supervisory
    /// deadline around each harness invocation.
    pub supervisor_grace_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Path to the external sandbox harness binary.
    pub bin: PathBuf,
    /// Isolation profile name passed through to the harness.
    pub seccomp_profile: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("/var/judge/code"),
            exe_dir: PathBuf::from("/var/judge/exe"),
            output_dir: PathBuf::from("/var/judge/output"),
            problem_dir: PathBuf::from("/var/judge/problems"),
            sandbox: SandboxConfig::default(),
            max_parallel_cases: 4,
            supervisor_grace_ms: 5_000,
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            bin: PathBuf::from("/usr/local/bin/judge-sandbox"),
            seccomp_profile: "c_cpp".to_string(),
        }
    }
}

impl JudgeConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| JudgeError::Internal(format!("bad config: {e}")))
    }

    pub async fn load(path: &std::path::Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&text)
    }
}
