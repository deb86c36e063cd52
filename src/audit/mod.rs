//! Audit runs: the progress state machine and the pipeline that drives it

mod pipeline;
mod state;

pub use pipeline::{AuditPipeline, AuditRequest};
pub use state::{AuditRun, AuditStatus, ProgressCheckpoint};
