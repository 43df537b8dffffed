// file: src/store/repository_store.rs
// description: baseline and working repository sequences with dirty tracking
// reference: in-memory edit session model

use crate::error::{Result, SyncError};
use crate::models::{ChangeSet, RepositoryInfo};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Edit session for one connection. Owned by a single caller; not meant for
/// concurrent mutation.
#[derive(Debug)]
pub struct RepositoryStore {
    connection_id: String,
    baseline: Vec<RepositoryInfo>,
    working: Vec<RepositoryInfo>,
    submitting: Arc<AtomicBool>,
    committed: Arc<AtomicBool>,
}

impl RepositoryStore {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            baseline: Vec::new(),
            working: Vec::new(),
            submitting: Arc::new(AtomicBool::new(false)),
            committed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Replaces the baseline and resets the working sequence to a copy of it.
    pub fn load(&mut self, baseline: Vec<RepositoryInfo>) -> Result<()> {
        if self.is_submitting() {
            return Err(SyncError::InvalidState(format!(
                "cannot reload repositories for {} while an update is in flight",
                self.connection_id
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = baseline.iter().find(|r| !seen.insert(r.url.as_str())) {
            return Err(SyncError::DuplicateEntry {
                url: dup.url.clone(),
            });
        }

        debug!(
            "Loaded {} repositories for connection {}",
            baseline.len(),
            self.connection_id
        );
        self.working = baseline.clone();
        self.baseline = baseline;
        self.committed.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn add(&mut self, entry: RepositoryInfo) -> Result<()> {
        if self.position(&entry.url).is_some() {
            return Err(SyncError::DuplicateEntry { url: entry.url });
        }
        self.working.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, url: &str) -> Result<RepositoryInfo> {
        let index = self.position(url).ok_or_else(|| SyncError::NotFound {
            url: url.to_string(),
        })?;

        if self.working[index].is_protected {
            return Err(SyncError::ProtectedEntry {
                url: url.to_string(),
            });
        }

        Ok(self.working.remove(index))
    }

    pub fn set_enabled(&mut self, url: &str, enabled: bool) -> Result<()> {
        let index = self.position(url).ok_or_else(|| SyncError::NotFound {
            url: url.to_string(),
        })?;
        self.working[index].enabled = enabled;
        Ok(())
    }

    pub fn diff(&self) -> ChangeSet {
        ChangeSet::between(&self.baseline, &self.working)
    }

    pub fn has_changes(&self) -> bool {
        !self.diff().is_empty()
    }

    pub fn baseline(&self) -> &[RepositoryInfo] {
        &self.baseline
    }

    pub fn working(&self) -> &[RepositoryInfo] {
        &self.working
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// True once this session's changes were applied remotely. A committed
    /// session must be reloaded before it can be committed again.
    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::SeqCst)
    }

    pub(crate) fn submission_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.submitting)
    }

    pub(crate) fn commit_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.committed)
    }

    fn position(&self, url: &str) -> Option<usize> {
        self.working.iter().position(|r| r.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scenario_store() -> RepositoryStore {
        let mut store = RepositoryStore::new("local");
        store
            .load(vec![
                RepositoryInfo::new("a", "A").with_enabled(true),
                RepositoryInfo::new("b", "B").with_enabled(false).protected(),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_fresh_load_has_no_changes() {
        let store = scenario_store();
        assert!(store.diff().is_empty());
        assert!(!store.has_changes());
        assert_eq!(store.working(), store.baseline());
    }

    #[test]
    fn test_toggle_and_add_scenario() {
        let mut store = scenario_store();
        store.set_enabled("b", true).unwrap();
        let c = RepositoryInfo::new("c", "C").with_enabled(true);
        store.add(c.clone()).unwrap();

        let diff = store.diff();
        assert_eq!(
            diff.toggles,
            vec![crate::models::RepositoryToggle {
                url: "b".into(),
                enabled: true
            }]
        );
        assert_eq!(diff.additions, vec![c]);
        assert!(diff.removals.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_url() {
        let mut store = scenario_store();
        let err = store.add(RepositoryInfo::new("a", "Other")).unwrap_err();
        assert!(matches!(err, SyncError::DuplicateEntry { url } if url == "a"));
        assert_eq!(store.working().len(), 2);
    }

    #[test]
    fn test_add_then_remove_restores_working() {
        let mut store = scenario_store();
        let before = store.working().to_vec();

        store.add(RepositoryInfo::new("z", "Z")).unwrap();
        store.remove("z").unwrap();

        assert_eq!(store.working(), before.as_slice());
        assert!(!store.has_changes());
    }

    #[test]
    fn test_remove_protected_fails_and_leaves_working_untouched() {
        let mut store = scenario_store();
        let before = store.working().to_vec();

        let err = store.remove("b").unwrap_err();
        assert!(matches!(err, SyncError::ProtectedEntry { url } if url == "b"));
        assert_eq!(store.working(), before.as_slice());
    }

    #[test]
    fn test_remove_and_toggle_unknown_url() {
        let mut store = scenario_store();
        assert!(matches!(
            store.remove("missing"),
            Err(SyncError::NotFound { .. })
        ));
        assert!(matches!(
            store.set_enabled("missing", true),
            Err(SyncError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_unprotected_is_a_removal() {
        let mut store = scenario_store();
        let removed = store.remove("a").unwrap();
        assert_eq!(store.diff().removals, vec![removed]);
    }

    #[test]
    fn test_diff_is_idempotent() {
        let mut store = scenario_store();
        store.set_enabled("a", false).unwrap();
        assert_eq!(store.diff(), store.diff());
    }

    #[test]
    fn test_toggle_back_is_not_a_change() {
        let mut store = scenario_store();
        store.set_enabled("a", false).unwrap();
        store.set_enabled("a", true).unwrap();
        assert!(!store.has_changes());
    }

    #[test]
    fn test_load_resets_working_copy() {
        let mut store = scenario_store();
        store.add(RepositoryInfo::new("c", "C")).unwrap();

        store.load(vec![RepositoryInfo::new("x", "X")]).unwrap();
        assert_eq!(store.working().len(), 1);
        assert!(store.working().iter().all(|r| r.url != "c"));
        assert!(!store.has_changes());
    }

    #[test]
    fn test_load_clears_committed_flag() {
        let mut store = scenario_store();
        store.commit_flag().store(true, Ordering::SeqCst);
        assert!(store.is_committed());

        store.load(vec![RepositoryInfo::new("x", "X")]).unwrap();
        assert!(!store.is_committed());
    }

    #[test]
    fn test_load_rejects_duplicate_baseline() {
        let mut store = RepositoryStore::new("local");
        let err = store
            .load(vec![RepositoryInfo::new("a", "A"), RepositoryInfo::new("a", "B")])
            .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateEntry { .. }));
        assert!(store.baseline().is_empty());
    }

    #[test]
    fn test_load_rejected_while_submitting() {
        let mut store = scenario_store();
        store.submission_flag().store(true, Ordering::SeqCst);

        let err = store.load(vec![]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidState(_)));
        assert_eq!(store.baseline().len(), 2);
    }
}
