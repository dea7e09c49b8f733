use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{JudgeError, Result};

use super::Compiler;

/// Which GNU driver to invoke and which language standard to request.
#[derive(Clone, Copy, Debug)]
pub enum Toolchain {
    Gcc,
    Gpp,
}

impl Toolchain {
    fn driver(&self) -> &'static str {
        match self {
            Toolchain::Gcc => "gcc",
            Toolchain::Gpp => "g++",
        }
    }

    fn standard(&self) -> &'static str {
        match self {
            Toolchain::Gcc => "-std=c11",
            Toolchain::Gpp => "-std=c++11",
        }
    }
}

/// Compiler for the compiled-native languages, driving gcc/g++ with a fixed
/// flag set: warnings off, diagnostics capped, math library linked.
#[derive(Debug)]
pub struct GnuCompiler {
    toolchain: Toolchain,
}

impl GnuCompiler {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }
}

#[async_trait]
impl Compiler for GnuCompiler {
    #[tracing::instrument(skip(self), fields(driver = self.toolchain.driver()))]
    async fn compile(&self, source_path: &Path, exe_path: &Path) -> Result<PathBuf> {
        let output = Command::new(self.toolchain.driver())
            .arg("-DONLINE_JUDGE")
            .arg("-O2")
            .arg("-w")
            .arg("-fmax-errors=3")
            .arg(self.toolchain.standard())
            .arg(source_path)
            .arg("-lm")
            .arg("-o")
            .arg(exe_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::debug!("compilation rejected: {}", stderr);
            return Err(JudgeError::Compile { stderr });
        }

        tracing::debug!("compiled {:?} -> {:?}", source_path, exe_path);
        Ok(exe_path.to_path_buf())
    }
}
