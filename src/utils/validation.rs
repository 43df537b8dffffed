// file: src/utils/validation.rs
// description: input validation for connection ids and repository entries
// reference: input validation patterns

use crate::error::{Result, SyncError};
use crate::models::RepositoryInfo;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CONNECTION_ID: Regex =
        Regex::new(r"^[A-Za-z0-9._-]+$").expect("CONNECTION_ID regex is valid");
}

pub struct Validator;

impl Validator {
    pub fn validate_connection_id(id: &str) -> Result<()> {
        if !CONNECTION_ID.is_match(id) {
            return Err(SyncError::Validation(format!(
                "Invalid connection id: {:?}",
                id
            )));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_repository(entry: &RepositoryInfo) -> Result<()> {
        Self::validate_url(&entry.url)?;
        if entry.name.trim().is_empty() {
            return Err(SyncError::Validation(format!(
                "Repository {} needs a name",
                entry.url
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_length: usize) -> String {
        if text.chars().count() <= max_length {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_length.saturating_sub(3)).collect();
            format!("{}...", truncated)
        }
    }
}
