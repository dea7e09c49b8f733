use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cases::FsCaseProvider;
use crate::checksum;
use crate::config::{JudgeConfig, SandboxConfig};
use crate::domain::{Language, SubmissionJob, TestCase};
use crate::error::JudgeError;
use crate::judge::JudgeService;
use crate::sandbox::RunRecord;
use crate::sandbox::shell::ShellSandbox;
use crate::store::MemoryVerdictStore;
use crate::stubs::{StaticCaseProvider, StubCompiler, StubSandbox};
use crate::verdict::{Verdict, status};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_config(dir: &Path) -> JudgeConfig {
    JudgeConfig {
        source_dir: dir.join("code"),
        exe_dir: dir.join("exe"),
        output_dir: dir.join("output"),
        problem_dir: dir.join("problems"),
        max_parallel_cases: 2,
        ..JudgeConfig::default()
    }
}

fn one_case(expected: &[u8]) -> Vec<TestCase> {
    vec![TestCase {
        index: 0,
        input_path: "/dev/null".into(),
        expected_output_path: "/dev/null".into(),
        expected_checksum: checksum::digest(expected),
        expected_trimmed_checksum: checksum::digest_trimmed(expected),
    }]
}

fn stub_service(
    dir: &Path,
    sandbox: StubSandbox,
    cases: Vec<TestCase>,
    store: Arc<MemoryVerdictStore>,
) -> JudgeService {
    init_tracing();
    JudgeService::new(
        test_config(dir),
        Arc::new(sandbox),
        Arc::new(StaticCaseProvider::new(cases)),
        store,
    )
    .with_compiler_factory(|_| Arc::new(StubCompiler::accepting(Duration::ZERO)))
}

async fn wait_for_commit(store: &MemoryVerdictStore, id: &str) {
    for _ in 0..100 {
        if store.get(id).is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("verdict for {id} never committed");
}

#[tokio::test]
async fn accepted_submission_over_stub_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let sandbox = StubSandbox::new(
        RunRecord {
            status: status::SUCCESS,
            time_ms: 15,
            memory_bytes: 4096,
        },
        b"4\n",
        Duration::from_millis(5),
    );
    let store = Arc::new(MemoryVerdictStore::new());
    let service = stub_service(dir.path(), sandbox, one_case(b"4\n"), store.clone());

    let job = SubmissionJob::with_id("it-1", "1000", Language::Cpp, "...", 1000, 64 << 20);
    let report = service.judge(job).await.unwrap();

    assert_eq!(report.verdict, Verdict::Accepted);
    assert_eq!(report.cases.len(), 1);
    wait_for_commit(&store, "it-1").await;
    assert_eq!(store.get("it-1").unwrap().verdict, Verdict::Accepted);
}

#[tokio::test]
async fn compile_rejection_surfaces_toolchain_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let sandbox = StubSandbox::new(
        RunRecord {
            status: status::SUCCESS,
            time_ms: 0,
            memory_bytes: 0,
        },
        b"",
        Duration::ZERO,
    );
    let store = Arc::new(MemoryVerdictStore::new());
    let service = JudgeService::new(
        test_config(dir.path()),
        Arc::new(sandbox),
        Arc::new(StaticCaseProvider::new(one_case(b""))),
        store,
    )
    .with_compiler_factory(|_| {
        Arc::new(StubCompiler::rejecting(
            "error: expected ';' before '}'",
            Duration::ZERO,
        ))
    });

    let job = SubmissionJob::with_id("it-2", "1000", Language::C, "int main({", 1000, 64 << 20);
    match service.judge(job).await.unwrap_err() {
        JudgeError::Compile { stderr } => assert!(stderr.contains("expected ';'")),
        other => panic!("expected Compile error, got {other:?}"),
    }
}

// -- real toolchain + fake harness script ------------------------------------
//
// These compile with the system gcc and drive the compiled binary through a
// shell harness that mimics the sandbox's option surface and record format.

fn fake_harness(dir: &Path) -> SandboxConfig {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("harness.sh");
    let script = r#"#!/bin/bash
for arg in "$@"; do
  case "$arg" in
    --exe_path=*) exe="${arg#*=}" ;;
    --input_path=*) input="${arg#*=}" ;;
    --output_path=*) output="${arg#*=}" ;;
  esac
done
"$exe" < "$input" > "$output"
code=$?
result=0
if [ $code -ne 0 ]; then result=4; fi
echo "{\"result\": $result, \"real_time\": 3, \"memory\": 1024}"
"#;
    std::fs::write(&bin, script).unwrap();
    std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
    SandboxConfig {
        bin,
        seccomp_profile: "c_cpp".to_string(),
    }
}

fn write_problem(root: &Path, problem_id: &str, cases: &[(&str, &str)]) {
    let dir = root.join(problem_id);
    std::fs::create_dir_all(&dir).unwrap();
    for (i, (input, output)) in cases.iter().enumerate() {
        std::fs::write(dir.join(format!("{}.in", i + 1)), input).unwrap();
        std::fs::write(dir.join(format!("{}.out", i + 1)), output).unwrap();
    }
}

fn real_service(dir: &Path, store: Arc<MemoryVerdictStore>) -> JudgeService {
    init_tracing();
    let mut config = test_config(dir);
    config.sandbox = fake_harness(dir);
    let sandbox = ShellSandbox::new(&config.sandbox, config.supervisor_grace_ms);
    let provider = FsCaseProvider::new(config.problem_dir.clone());
    JudgeService::new(config, Arc::new(sandbox), Arc::new(provider), store)
}

const SUM_C: &str = r#"
#include <stdio.h>
int main(void) {
    int a, b;
    scanf("%d %d", &a, &b);
    printf("%d\n", a + b);
    return 0;
}
"#;

#[tokio::test]
async fn sum_program_is_accepted_on_all_cases() {
    let dir = tempfile::tempdir().unwrap();
    write_problem(
        &dir.path().join("problems"),
        "1000",
        &[("1 2\n", "3\n"), ("5 7\n", "12\n")],
    );

    let store = Arc::new(MemoryVerdictStore::new());
    let service = real_service(dir.path(), store);

    let job = SubmissionJob::with_id("it-3", "1000", Language::C, SUM_C, 1000, 64 << 20);
    let report = service.judge(job).await.unwrap();

    assert_eq!(report.verdict, Verdict::Accepted);
    assert_eq!(report.cases.len(), 2);
}

#[tokio::test]
async fn missing_newline_is_a_presentation_error() {
    let dir = tempfile::tempdir().unwrap();
    write_problem(&dir.path().join("problems"), "1001", &[("2 2\n", "4\n")]);

    // Same sum program, but the output lacks the trailing newline.
    let source = SUM_C.replace("%d\\n", "%d");
    let store = Arc::new(MemoryVerdictStore::new());
    let service = real_service(dir.path(), store);

    let job = SubmissionJob::with_id("it-4", "1001", Language::C, &source, 1000, 64 << 20);
    let report = service.judge(job).await.unwrap();

    assert_eq!(report.verdict, Verdict::PresentationError);
}

#[tokio::test]
async fn crashing_program_is_a_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    write_problem(&dir.path().join("problems"), "1002", &[("\n", "ok\n")]);

    let source = "#include <stdlib.h>\nint main(void){abort();}\n";
    let store = Arc::new(MemoryVerdictStore::new());
    let service = real_service(dir.path(), store);

    let job = SubmissionJob::with_id("it-5", "1002", Language::C, source, 1000, 64 << 20);
    let report = service.judge(job).await.unwrap();

    assert_eq!(report.verdict, Verdict::RuntimeError);
}
