pub mod audit;
pub mod engine;
pub mod sampler;
pub mod submission;
pub mod watcher;

pub use audit::{verify_deputy, AuditError, AuditOutcome, AuditPolicy, Auditor};
pub use engine::{AuditTask, ChallengeEngine, Evidence, FraudReason, Verdict};
pub use sampler::sample_indices;
pub use submission::{ProofSubmitter, SubmitError, Submission};
pub use watcher::{ChainWatcher, WatcherHandle, WatcherPhase, WatcherSettings, WatcherStatus};

const CHAIN_WATCHER_TAG: &str = "ChainWatcher";
const AUDIT_TAG: &str = "Audit";

#[cfg(test)]
pub(crate) mod test_utils;
