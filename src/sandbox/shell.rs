use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

use crate::config::SandboxConfig;
use crate::error::{JudgeError, Result};

use super::{CaseLimits, RunRecord, SandboxRunner};

/// Invokes the external sandbox harness through a single shell command,
/// passing limits and paths as long options, and parses the JSON record it
/// prints. The harness enforces the judged program's budgets itself; this
/// runner only adds a supervisory deadline so a hung harness cannot block the
/// pipeline forever.
#[derive(Debug)]
pub struct ShellSandbox {
    bin: PathBuf,
    seccomp_profile: String,
    supervisor_grace_ms: u64,
}

impl ShellSandbox {
    pub fn new(config: &SandboxConfig, supervisor_grace_ms: u64) -> Self {
        Self {
            bin: config.bin.clone(),
            seccomp_profile: config.seccomp_profile.clone(),
            supervisor_grace_ms,
        }
    }

    fn command_line(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
        limits: CaseLimits,
    ) -> String {
        format!(
            "{} --exe_path={} --input_path={} --output_path={} --max_cpu_time={} --max_real_time={} --memory_limit={} --seccomp_rule_name={}",
            self.bin.display(),
            executable.display(),
            input.display(),
            output.display(),
            limits.time_ms,
            limits.time_ms,
            limits.memory_bytes,
            self.seccomp_profile,
        )
    }
}

#[async_trait]
impl SandboxRunner for ShellSandbox {
    #[tracing::instrument(skip(self))]
    async fn run(
        &self,
        executable: &Path,
        input: &Path,
        output: &Path,
        limits: CaseLimits,
    ) -> Result<RunRecord> {
        let command_line = self.command_line(executable, input, output, limits);
        tracing::debug!("invoking harness: {}", command_line);

        let invocation = Command::new("bash")
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let deadline_ms = limits.time_ms + self.supervisor_grace_ms;
        let out = timeout(Duration::from_millis(deadline_ms), invocation)
            .await
            .map_err(|_| JudgeError::HarnessTimeout { deadline_ms })??;

        let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));

        if !out.status.success() {
            // The harness itself failed; the judged program's own violations
            // arrive as a status code inside the record, never as a harness
            // exit code.
            return Err(JudgeError::Harness {
                exit_code: out.status.code(),
                output: combined,
            });
        }

        RunRecord::parse(&combined)
    }
}
