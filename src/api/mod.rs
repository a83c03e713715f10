pub mod attach;

use std::sync::Arc;

pub use attach::{AttachInput, AttachOutput, SequenceAttacher};

/// Progress callback for CLI or embedding applications
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress events emitted while a batch is being placed
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Started { task: String },
    Progress { task: String, current: u64, total: u64 },
    Message { task: String, message: String },
    Completed { task: String },
}
