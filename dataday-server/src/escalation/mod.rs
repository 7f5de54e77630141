//! Escalation pipeline
//!
//! Sequential, single-pass pipeline run once per day per user:
//! goal/log read → miss detection → escalation policy → consent gate →
//! notification dispatch → counter write-back.

pub mod consent;
pub mod miss;
pub mod orchestrator;
pub mod policy;

pub use miss::consecutive_misses;
pub use orchestrator::{process_escalations, RunSummary};
pub use policy::{escalation_action, EscalationAction, PolicyThresholds};
