// file: src/store/edit.rs
// description: scripted edits applied to an open edit session

use crate::error::Result;
use crate::models::RepositoryInfo;
use crate::store::RepositoryStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RepositoryEdit {
    Add(RepositoryInfo),
    Remove { url: String },
    Enable { url: String },
    Disable { url: String },
}

impl RepositoryEdit {
    pub fn apply(&self, store: &mut RepositoryStore) -> Result<()> {
        match self {
            RepositoryEdit::Add(entry) => store.add(entry.clone()),
            RepositoryEdit::Remove { url } => store.remove(url).map(|_| ()),
            RepositoryEdit::Enable { url } => store.set_enabled(url, true),
            RepositoryEdit::Disable { url } => store.set_enabled(url, false),
        }
    }

    pub fn apply_all(edits: &[RepositoryEdit], store: &mut RepositoryStore) -> Result<()> {
        edits.iter().try_for_each(|edit| edit.apply(store))
    }

    pub fn parse_script(contents: &str) -> Result<Vec<RepositoryEdit>> {
        serde_json::from_str(contents)
            .map_err(|e| crate::error::SyncError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;

    #[test]
    fn test_parse_and_apply_script() {
        let script = r#"[
            {"action": "add", "url": "https://example.com/c.json", "name": "C"},
            {"action": "disable", "url": "a"},
            {"action": "remove", "url": "a"}
        ]"#;
        let edits = RepositoryEdit::parse_script(script).unwrap();
        assert_eq!(edits.len(), 3);

        let mut store = RepositoryStore::new("local");
        store.load(vec![RepositoryInfo::new("a", "A")]).unwrap();
        RepositoryEdit::apply_all(&edits, &mut store).unwrap();

        let diff = store.diff();
        assert_eq!(diff.additions.len(), 1);
        assert_eq!(diff.removals.len(), 1);
        assert!(diff.toggles.is_empty());
    }

    #[test]
    fn test_failing_edit_stops_script() {
        let mut store = RepositoryStore::new("local");
        store
            .load(vec![RepositoryInfo::new("p", "P").protected()])
            .unwrap();

        let edits = vec![
            RepositoryEdit::Disable { url: "p".into() },
            RepositoryEdit::Remove { url: "p".into() },
            RepositoryEdit::Enable { url: "p".into() },
        ];
        let err = RepositoryEdit::apply_all(&edits, &mut store).unwrap_err();
        assert!(matches!(err, SyncError::ProtectedEntry { .. }));
        assert!(!store.working()[0].enabled);
    }

    #[test]
    fn test_malformed_script() {
        assert!(matches!(
            RepositoryEdit::parse_script(r#"[{"action": "rename"}]"#),
            Err(SyncError::Serialization(_))
        ));
    }
}
