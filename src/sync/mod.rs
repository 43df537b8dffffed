// file: src/sync/mod.rs
// description: fetch, edit and submit workflow exports
// reference: internal module structure

pub mod controller;
pub mod submission;

pub use controller::{SessionState, SyncController};
pub use submission::{SubmissionHandle, SubmitOutcome};
