// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod change_set;
pub mod repository;

pub use change_set::{BatchOperation, ChangeSet, RepositoryToggle};
pub use repository::RepositoryInfo;
