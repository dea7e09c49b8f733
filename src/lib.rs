pub mod cases;
pub mod checksum;
pub mod compiler;
pub mod config;
pub mod domain;
pub mod error;
pub mod judge;
pub mod sandbox;
pub mod store;
pub mod stubs;
pub mod verdict;

#[cfg(test)]
mod integration_test;

pub use config::JudgeConfig;
pub use domain::{JudgeReport, Language, SubmissionJob, SubmissionRequest};
pub use error::{JudgeError, Result};
pub use judge::JudgeService;
pub use verdict::Verdict;
