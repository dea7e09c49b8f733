use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::mpsc::{self, Sender};

use crate::cases::CaseProvider;
use crate::compiler::{Compiler, compiler_for};
use crate::config::JudgeConfig;
use crate::domain::{
    CaseResult, CompiledJob, ExecutionResult, JudgeReport, Language, SavedSource, SubmissionJob,
    TestCase,
};
use crate::error::Result;
use crate::sandbox::{CaseLimits, SandboxRunner};
use crate::store::{CommitRequest, VerdictStore, handle_committing};
use crate::verdict::{Verdict, classify};

/// Drives the full pipeline for one submission: save source, compile once,
/// run every test case, aggregate, report. Submissions are judged as
/// independent unsynchronized runs; one service instance handles many
/// concurrently.
#[derive(Debug)]
pub struct JudgeService {
    config: JudgeConfig,
    runner: Arc<dyn SandboxRunner>,
    cases: Arc<dyn CaseProvider>,
    commit_tx: Sender<CommitRequest>,
    compiler_factory: fn(Language) -> Arc<dyn Compiler>,
    // Compiled artifacts are memoized per (submission, problem) within this
    // service instance, never across different source text.
    artifacts: DashMap<(String, String), PathBuf>,
}

impl JudgeService {
    /// Spawns the verdict committer, so this must run inside a Tokio runtime.
    pub fn new(
        config: JudgeConfig,
        runner: Arc<dyn SandboxRunner>,
        cases: Arc<dyn CaseProvider>,
        store: Arc<dyn VerdictStore>,
    ) -> Self {
        let (commit_tx, commit_rx) = mpsc::channel(128);
        handle_committing(commit_rx, store);
        Self {
            config,
            runner,
            cases,
            commit_tx,
            compiler_factory: compiler_for,
            artifacts: DashMap::new(),
        }
    }

    /// Swaps the compiler factory; the seam the tests use to avoid shelling
    /// out to a real toolchain.
    pub fn with_compiler_factory(mut self, factory: fn(Language) -> Arc<dyn Compiler>) -> Self {
        self.compiler_factory = factory;
        self
    }

    /// Judges one submission to completion and returns the full verdict
    /// breakdown. The final verdict is also queued for asynchronous
    /// persistence; that commit never blocks this call.
    #[tracing::instrument(skip(self, job), fields(submission = %job.id, problem = %job.problem_id))]
    pub async fn judge(&self, job: SubmissionJob) -> Result<JudgeReport> {
        job.validate_limits()?;

        let saved = self.save_source(job).await?;
        let compiled = self.compile(saved).await?;
        let cases = self.cases.test_cases(&compiled.job.problem_id).await?;
        let results = self.run_cases(&compiled, &cases).await?;

        let report = aggregate(&compiled.job.id, results);
        tracing::info!("submission {} judged: {}", report.submission_id, report.verdict);
        self.enqueue_commit(&report);
        Ok(report)
    }

    async fn save_source(&self, job: SubmissionJob) -> Result<SavedSource> {
        tokio::fs::create_dir_all(&self.config.source_dir).await?;
        let source_path = self.config.source_dir.join(format!(
            "{}_{}.{}",
            job.id,
            job.problem_id,
            job.language.source_extension()
        ));
        tokio::fs::write(&source_path, &job.source).await?;
        Ok(SavedSource { job, source_path })
    }

    async fn compile(&self, saved: SavedSource) -> Result<CompiledJob> {
        let key = (saved.job.id.clone(), saved.job.problem_id.clone());
        if let Some(executable) = self.artifacts.get(&key) {
            return Ok(CompiledJob {
                job: saved.job,
                executable: executable.clone(),
            });
        }

        tokio::fs::create_dir_all(&self.config.exe_dir).await?;
        let exe_path = self.config.exe_dir.join(&saved.job.id);
        let compiler = (self.compiler_factory)(saved.job.language);
        let executable = compiler.compile(&saved.source_path, &exe_path).await?;

        self.artifacts.insert(key, executable.clone());
        Ok(CompiledJob {
            job: saved.job,
            executable,
        })
    }

    async fn run_cases(
        &self,
        compiled: &CompiledJob,
        cases: &[TestCase],
    ) -> Result<Vec<CaseResult>> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let width = self.config.max_parallel_cases.max(1);
        let outcomes: Vec<Result<CaseResult>> =
            futures::stream::iter(cases.iter().map(|case| self.run_case(compiled, case)))
                .buffer_unordered(width)
                .collect()
                .await;

        let mut results = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
        // Aggregation is by index, never by completion order.
        results.sort_by_key(|r| r.index);
        Ok(results)
    }

    async fn run_case(&self, compiled: &CompiledJob, case: &TestCase) -> Result<CaseResult> {
        let output_path = self
            .config
            .output_dir
            .join(format!("{}_{}", compiled.job.id, case.index));
        let limits = CaseLimits {
            time_ms: compiled.job.time_limit_ms,
            memory_bytes: compiled.job.memory_limit_bytes,
        };

        match self
            .runner
            .run(&compiled.executable, &case.input_path, &output_path, limits)
            .await
        {
            Ok(record) => {
                let exec = ExecutionResult {
                    index: case.index,
                    status: record.status,
                    time_ms: record.time_ms,
                    memory_bytes: record.memory_bytes,
                    output_path,
                };
                let verdict = classify(
                    exec.status,
                    &exec.output_path,
                    &case.expected_checksum,
                    &case.expected_trimmed_checksum,
                )
                .await;
                Ok(CaseResult {
                    index: exec.index,
                    verdict,
                    time_ms: exec.time_ms,
                    memory_bytes: exec.memory_bytes,
                })
            }
            // Cases are independent: a broken record for one index must not
            // swallow the verdicts of the others.
            Err(err) if !err.is_fatal() => {
                tracing::warn!("case {} failed internally: {}", case.index, err);
                Ok(CaseResult {
                    index: case.index,
                    verdict: Verdict::InternalError,
                    time_ms: 0,
                    memory_bytes: 0,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn enqueue_commit(&self, report: &JudgeReport) {
        let request = CommitRequest {
            submission_id: report.submission_id.clone(),
            verdict: report.verdict,
            time_ms: report.time_ms,
            memory_bytes: report.memory_bytes,
        };
        if let Err(err) = self.commit_tx.try_send(request) {
            tracing::error!(
                "failed to queue verdict commit for {}: {}",
                report.submission_id,
                err
            );
        }
    }
}

/// The submission verdict is the verdict of the lowest-indexed non-Accepted
/// case, Accepted when every case passed. Reported time and memory are the
/// maxima across cases. `results` must already be sorted by index.
fn aggregate(submission_id: &str, results: Vec<CaseResult>) -> JudgeReport {
    let verdict = results
        .iter()
        .find(|r| r.verdict != Verdict::Accepted)
        .map_or(Verdict::Accepted, |r| r.verdict);
    let time_ms = results.iter().map(|r| r.time_ms).max().unwrap_or(0);
    let memory_bytes = results.iter().map(|r| r.memory_bytes).max().unwrap_or(0);

    JudgeReport {
        submission_id: submission_id.to_string(),
        verdict,
        time_ms,
        memory_bytes,
        cases: results,
    }
}
