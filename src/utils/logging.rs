// file: src/utils/logging.rs
// description: tracing setup and terminal rendering of template sources and sync results
// reference: https://docs.rs/tracing-subscriber

use crate::error::SyncError;
use crate::models::{ChangeSet, RepositoryInfo};
use crate::sync::SubmitOutcome;
use crate::utils::Validator;
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directives read before `RUST_LOG`.
pub const LOG_ENV: &str = "TEMPLATE_SYNC_LOG";

const DESCRIPTION_WIDTH: usize = 72;

fn log_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "template_sync=debug,info"
    } else {
        "template_sync=info,warn"
    };

    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Logs go to stderr so listings on stdout stay scriptable.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(fmt_layer)
        .init();
}

/// One listing entry: state, display name, protection marker, then the url
/// and a truncated description on indented lines.
pub fn format_repository(repo: &RepositoryInfo) -> String {
    let state = if repo.enabled {
        "enabled ".green()
    } else {
        "disabled".dimmed()
    };
    let mut line = format!("{} {}", state, repo.display_name().bold());
    if repo.is_protected {
        line.push_str(&format!(" {}", "[protected]".yellow()));
    }
    line.push_str(&format!("\n         {}", repo.url.cyan()));
    if !repo.description.is_empty() {
        line.push_str(&format!(
            "\n         {}",
            Validator::truncate_text(&repo.description, DESCRIPTION_WIDTH)
        ));
    }
    line
}

pub fn format_outcome(connection_id: &str, outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::NoChanges => format!("{} No changes to submit", "ℹ".blue().bold()),
        SubmitOutcome::Applied {
            additions,
            removals,
            toggles,
        } => format!(
            "{} {}",
            "✓".green().bold(),
            format!(
                "Template sources updated for {}: {} added, {} removed, {} toggled",
                connection_id, additions, removals, toggles
            )
            .as_str()
            .green()
        ),
    }
}

/// Local edit violations are reported as rejected edits, everything else as
/// a failed sync.
pub fn format_failure(err: &SyncError) -> String {
    let label = if err.is_local() {
        "Edit rejected"
    } else {
        "Sync failed"
    };
    format!("{} {}: {}", "✗".red().bold(), label.red().bold(), err)
}

pub fn format_pending(changes: &ChangeSet) -> String {
    format!(
        "{} {}",
        "⚠".yellow().bold(),
        format!("Pending edits: {}", changes.summary())
            .as_str()
            .yellow()
    )
}

pub fn format_empty_listing(connection_id: &str) -> String {
    format!(
        "{} No template sources configured for {}",
        "ℹ".blue().bold(),
        connection_id
    )
}
