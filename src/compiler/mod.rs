pub mod gnu;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::Language;
use crate::error::Result;

use gnu::{GnuCompiler, Toolchain};

/// Translates one source file into an executable. Implementations are
/// constructed for a specific language; compile failures are deterministic,
/// so there is no retry anywhere.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Compiler: std::fmt::Debug + Send + Sync {
    /// Compiles `source_path` into `exe_path`. Returns the absolute path of
    /// the produced executable; on failure carries the toolchain's stderr
    /// verbatim in `JudgeError::Compile`.
    async fn compile(&self, source_path: &Path, exe_path: &Path) -> Result<PathBuf>;
}

/// Resolves a language to its registered compiler.
pub fn compiler_for(language: Language) -> Arc<dyn Compiler> {
    match language {
        Language::C => Arc::new(GnuCompiler::new(Toolchain::Gcc)),
        Language::Cpp => Arc::new(GnuCompiler::new(Toolchain::Gpp)),
    }
}
