// file: src/models/repository.rs
// description: template source repository model
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// One template source known to a connection. `url` identifies it; name and
/// description are display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, rename = "protected")]
    pub is_protected: bool,
    #[serde(default)]
    pub project_styles: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl RepositoryInfo {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            description: String::new(),
            enabled: true,
            is_protected: false,
            project_styles: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn protected(mut self) -> Self {
        self.is_protected = true;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}
