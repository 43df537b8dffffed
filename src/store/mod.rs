// file: src/store/mod.rs
// description: local edit session model exports
// reference: internal module structure

pub mod edit;
pub mod repository_store;

pub use edit::RepositoryEdit;
pub use repository_store::RepositoryStore;
