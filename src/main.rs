// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use template_sync::utils::logging::{
    format_empty_listing, format_failure, format_outcome, format_pending, format_repository,
};
use template_sync::{
    Config, RepositoryEdit, RepositoryInfo, RepositoryStore, SubmitOutcome, SyncController,
    Validator, gateway,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "template_sync")]
#[command(version)]
#[command(about = "Manage template source repositories for a connection", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value = "local", env = "TEMPLATE_SYNC_CONNECTION")]
    connection: String,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the template sources of the connection
    List,

    /// Add a template source
    Add {
        url: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long)]
        disabled: bool,
    },

    /// Remove a template source
    Remove { url: String },

    /// Enable a template source
    Enable { url: String },

    /// Disable a template source
    Disable { url: String },

    /// Apply a JSON script of edits in one session
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    colored::control::set_override(cli.color);
    template_sync::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    Validator::validate_connection_id(&cli.connection)?;

    let gateway = gateway::from_config(&config).context("Failed to create gateway")?;
    let controller = SyncController::new(gateway, config.sync.remote_call_timeout());

    let edits = match cli.command {
        Commands::List => {
            let store = fetch(&controller, &cli.connection).await?;
            print_repositories(&cli.connection, &store);
            return Ok(());
        }
        Commands::Add {
            url,
            name,
            description,
            disabled,
        } => {
            let entry = RepositoryInfo::new(url, name)
                .with_description(description)
                .with_enabled(!disabled);
            Validator::validate_repository(&entry)?;
            vec![RepositoryEdit::Add(entry)]
        }
        Commands::Remove { url } => vec![RepositoryEdit::Remove { url }],
        Commands::Enable { url } => vec![RepositoryEdit::Enable { url }],
        Commands::Disable { url } => vec![RepositoryEdit::Disable { url }],
        Commands::Apply { file } => {
            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let edits = RepositoryEdit::parse_script(&contents)?;
            for edit in &edits {
                if let RepositoryEdit::Add(entry) = edit {
                    Validator::validate_repository(entry)?;
                }
            }
            edits
        }
    };

    run_session(&controller, &cli.connection, &edits).await
}

fn cancel_on_ctrl_c(token: CancellationToken) -> CancellationToken {
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Failed to create spinner template"),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

async fn fetch(controller: &SyncController, connection: &str) -> Result<RepositoryStore> {
    let bar = spinner(format!("Fetching template sources for {}", connection));
    let fetched = controller
        .begin_sync_with_cancel(connection, cancel_on_ctrl_c(CancellationToken::new()))
        .await;
    bar.finish_and_clear();

    fetched.with_context(|| {
        format!(
            "An error occurred trying to get the template sources for {}",
            connection
        )
    })
}

async fn run_session(
    controller: &SyncController,
    connection: &str,
    edits: &[RepositoryEdit],
) -> Result<()> {
    let mut store = fetch(controller, connection).await?;

    if let Err(e) = RepositoryEdit::apply_all(edits, &mut store) {
        println!("{}", format_failure(&e));
        return Err(e.into());
    }

    if !store.has_changes() {
        println!("{}", format_outcome(connection, &SubmitOutcome::NoChanges));
        return Ok(());
    }

    let handle = controller.commit(connection, &store)?;
    info!("Waiting for submission {}", handle.id());
    cancel_on_ctrl_c(handle.cancellation_token());
    let bar = spinner(format!("Updating template sources for {}", connection));
    let outcome = handle.wait().await;
    bar.finish_and_clear();

    match outcome {
        Ok(outcome) => {
            println!("{}", format_outcome(connection, &outcome));
            Ok(())
        }
        Err(e) => {
            println!("{}", format_failure(&e));
            println!("{}", format_pending(&store.diff()));
            Err(e).context("Failed to update template sources")
        }
    }
}

fn print_repositories(connection: &str, store: &RepositoryStore) {
    if store.working().is_empty() {
        println!("{}", format_empty_listing(connection));
        return;
    }

    for repo in store.working() {
        println!("{}", format_repository(repo));
    }
}
