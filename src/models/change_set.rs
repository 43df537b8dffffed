// file: src/models/change_set.rs
// description: difference between a fetched baseline and an edited working set
// reference: internal data structures

use crate::models::RepositoryInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryToggle {
    pub url: String,
    pub enabled: bool,
}

/// Additions, removals and enable/disable toggles, in the order the entries
/// appear in their source sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub additions: Vec<RepositoryInfo>,
    pub removals: Vec<RepositoryInfo>,
    pub toggles: Vec<RepositoryToggle>,
}

/// One entry of a batch update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BatchOperation {
    Add {
        url: String,
        name: String,
        description: String,
        enabled: bool,
        #[serde(
            rename = "projectStyles",
            default,
            skip_serializing_if = "Vec::is_empty"
        )]
        project_styles: Vec<String>,
    },
    Remove {
        url: String,
    },
    Enable {
        url: String,
    },
    Disable {
        url: String,
    },
}

impl BatchOperation {
    pub fn url(&self) -> &str {
        match self {
            BatchOperation::Add { url, .. }
            | BatchOperation::Remove { url }
            | BatchOperation::Enable { url }
            | BatchOperation::Disable { url } => url,
        }
    }
}

impl ChangeSet {
    pub fn between(baseline: &[RepositoryInfo], working: &[RepositoryInfo]) -> Self {
        let base_by_url: HashMap<&str, &RepositoryInfo> =
            baseline.iter().map(|r| (r.url.as_str(), r)).collect();
        let work_by_url: HashMap<&str, &RepositoryInfo> =
            working.iter().map(|r| (r.url.as_str(), r)).collect();

        let mut change_set = ChangeSet::default();

        for repo in working {
            match base_by_url.get(repo.url.as_str()) {
                None => change_set.additions.push(repo.clone()),
                Some(base) if base.enabled != repo.enabled => {
                    change_set.toggles.push(RepositoryToggle {
                        url: repo.url.clone(),
                        enabled: repo.enabled,
                    })
                }
                Some(_) => {}
            }
        }

        change_set.removals = baseline
            .iter()
            .filter(|r| !r.is_protected && !work_by_url.contains_key(r.url.as_str()))
            .cloned()
            .collect();

        change_set
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && self.toggles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.additions.len() + self.removals.len() + self.toggles.len()
    }

    /// Flattens the change set into removals, then additions, then toggles.
    pub fn operations(&self) -> Vec<BatchOperation> {
        let removals = self.removals.iter().map(|r| BatchOperation::Remove {
            url: r.url.clone(),
        });
        let additions = self.additions.iter().map(|r| BatchOperation::Add {
            url: r.url.clone(),
            name: r.name.clone(),
            description: r.description.clone(),
            enabled: r.enabled,
            project_styles: r.project_styles.clone(),
        });
        let toggles = self.toggles.iter().map(|t| {
            if t.enabled {
                BatchOperation::Enable { url: t.url.clone() }
            } else {
                BatchOperation::Disable { url: t.url.clone() }
            }
        });

        removals.chain(additions).chain(toggles).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} added, {} removed, {} toggled",
            self.additions.len(),
            self.removals.len(),
            self.toggles.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_sets_produce_empty_change_set() {
        let baseline = vec![RepositoryInfo::new("a", "A"), RepositoryInfo::new("b", "B")];
        let change_set = ChangeSet::between(&baseline, &baseline.clone());
        assert!(change_set.is_empty());
        assert_eq!(change_set.len(), 0);
        assert!(change_set.operations().is_empty());
    }

    #[test]
    fn test_protected_entries_never_appear_as_removals() {
        let baseline = vec![
            RepositoryInfo::new("a", "A"),
            RepositoryInfo::new("b", "B").protected(),
        ];
        let change_set = ChangeSet::between(&baseline, &[]);
        assert_eq!(change_set.removals, vec![baseline[0].clone()]);
    }

    #[test]
    fn test_operations_order_and_wire_format() {
        let baseline = vec![
            RepositoryInfo::new("old", "Old"),
            RepositoryInfo::new("keep", "Keep").with_enabled(true),
        ];
        let working = vec![
            RepositoryInfo::new("keep", "Keep").with_enabled(false),
            RepositoryInfo::new("new", "New").with_description("fresh"),
        ];

        let ops = ChangeSet::between(&baseline, &working).operations();
        assert_eq!(
            ops,
            vec![
                BatchOperation::Remove { url: "old".into() },
                BatchOperation::Add {
                    url: "new".into(),
                    name: "New".into(),
                    description: "fresh".into(),
                    enabled: true,
                    project_styles: vec![],
                },
                BatchOperation::Disable { url: "keep".into() },
            ]
        );

        let json = serde_json::to_value(&ops[2]).unwrap();
        assert_eq!(json, serde_json::json!({"op": "disable", "url": "keep"}));
    }

    #[test]
    fn test_additions_carry_project_styles() {
        let mut styled = RepositoryInfo::new("styled", "Styled");
        styled.project_styles = vec!["cli".into(), "webapi".into()];

        let ops = ChangeSet::between(&[], &[styled]).operations();
        let json = serde_json::to_value(&ops[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "op": "add",
                "url": "styled",
                "name": "Styled",
                "description": "",
                "enabled": true,
                "projectStyles": ["cli", "webapi"]
            })
        );

        let plain = ChangeSet::between(&[], &[RepositoryInfo::new("plain", "Plain")]).operations();
        let json = serde_json::to_value(&plain[0]).unwrap();
        assert!(json.get("projectStyles").is_none());
    }
}
