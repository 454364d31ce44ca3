//! Command-line interface.
//!
//! Results are printed to stdout as JSON; logs and error messages go to stderr.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::config::{ConfigStore, DEFAULT_CONFIG_PATH, ServerConfig};
use crate::db::ConnectionProvider;
use crate::db::models::accounts::AccountStatus;
use crate::db::models::gm_list::AuthorityLevel;
use crate::errors::{Error, Result};
use crate::server_control::ServerControl;
use crate::services::{AccountService, AuthorityService, CharacterService, StatisticsAggregator};
use crate::types::AccountId;
use crate::update::{DownloadEvent, DownloadOutcome, UpdateDownloader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "REALMCTL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage login accounts
    #[command(subcommand)]
    Accounts(AccountsCommand),
    /// List the characters of an account
    Characters { account_id: AccountId },
    /// Manage GM grants
    #[command(subcommand)]
    Gm(GmCommand),
    /// Account and activity statistics
    Stats,
    /// Check for and download new releases
    #[command(subcommand)]
    Update(UpdateCommand),
    /// Control the game server process
    #[command(subcommand)]
    Server(ServerCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (password masked)
    Show,
    /// Write a configuration file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    List,
    Create {
        login: String,
        #[arg(long, env = "REALMCTL_ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Set an account's status to OK or BLOCK
    Status { account_id: AccountId, status: AccountStatus },
}

#[derive(Subcommand, Debug)]
pub enum GmCommand {
    /// Grant an authority level (IMPLEMENTOR, GOD, LOW_WIZARD, PLAYER)
    Grant {
        account: String,
        character: String,
        level: AuthorityLevel,
    },
    Show { account: String },
    List,
    /// Create the unique index on gmlist(mAccount)
    EnsureIndex,
}

#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    Check {
        /// Defaults to `update_url` from the configuration
        #[arg(long)]
        manifest_url: Option<Url>,
        /// Defaults to `version` from the configuration
        #[arg(long)]
        current_version: Option<String>,
    },
    /// Download an artifact; Ctrl+C cancels and removes the partial file
    Download { url: Url, destination: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    Restart,
}

#[derive(Serialize)]
struct UpdateCheckReport<'a> {
    current_version: &'a str,
    update_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<crate::update::UpdateManifest>,
}

pub async fn run(args: Args) -> Result<()> {
    let store = ConfigStore::new(&args.config);

    match args.command {
        Command::Config(ConfigCommand::Show) => {
            let mut config = store.load_or_default();
            if !config.password.is_empty() {
                config.password = "********".to_string();
            }
            print_json(&config)
        }
        Command::Config(ConfigCommand::Init { force }) => {
            if store.path().exists() && !force {
                return Err(Error::validation(format!(
                    "{} already exists, pass --force to overwrite it",
                    store.path().display()
                )));
            }
            store.save(&ServerConfig::default())?;
            info!(path = %store.path().display(), "Wrote default configuration");
            Ok(())
        }
        Command::Accounts(command) => {
            let service = AccountService::new(ConnectionProvider::from_store(&store)?);
            match command {
                AccountsCommand::List => print_json(&service.list_accounts().await?),
                AccountsCommand::Create { login, password } => {
                    print_json(&service.create_account(&login, &password).await?)
                }
                AccountsCommand::Status { account_id, status } => {
                    if !service.update_status(account_id, status).await? {
                        return Err(Error::validation(format!("No account with id {account_id}")));
                    }
                    print_json(&serde_json::json!({ "id": account_id, "status": status }))
                }
            }
        }
        Command::Characters { account_id } => {
            let service = CharacterService::new(ConnectionProvider::from_store(&store)?);
            print_json(&service.list_characters(account_id).await?)
        }
        Command::Gm(command) => {
            let service = AuthorityService::new(ConnectionProvider::from_store(&store)?);
            match command {
                GmCommand::Grant {
                    account,
                    character,
                    level,
                } => {
                    service.grant_authority(&account, &character, level).await?;
                    print_json(&service.get_grant(&account).await?)
                }
                GmCommand::Show { account } => print_json(&service.get_grant(&account).await?),
                GmCommand::List => print_json(&service.list_grants().await?),
                GmCommand::EnsureIndex => {
                    let created = service.ensure_unique_index().await?;
                    print_json(&serde_json::json!({ "created": created }))
                }
            }
        }
        Command::Stats => {
            let aggregator = StatisticsAggregator::new(ConnectionProvider::from_store(&store)?);
            print_json(&aggregator.snapshot().await?)
        }
        Command::Update(UpdateCommand::Check {
            manifest_url,
            current_version,
        }) => {
            let config = store.load_or_default();
            let manifest_url = manifest_url.or(config.update_url.clone()).ok_or_else(|| Error::Configuration {
                message: "no manifest URL: set update_url or pass --manifest-url".to_string(),
            })?;
            let current_version = current_version.unwrap_or_else(|| config.current_version().to_string());

            let downloader = UpdateDownloader::from_config(&config)?;
            let manifest = downloader.check_version(&manifest_url, &current_version).await?;
            print_json(&UpdateCheckReport {
                current_version: &current_version,
                update_available: manifest.is_some(),
                manifest,
            })
        }
        Command::Update(UpdateCommand::Download { url, destination }) => {
            let downloader = UpdateDownloader::from_config(&store.load_or_default())?;
            download_with_interrupt(&downloader, url, destination).await
        }
        Command::Server(ServerCommand::Restart) => {
            let config = store.load_or_default();
            let output = ServerControl::new(config.server).restart().await?;
            print_json(&output)
        }
    }
}

/// Download while printing events as JSON lines; Ctrl+C cancels.
async fn download_with_interrupt(downloader: &UpdateDownloader, url: Url, destination: PathBuf) -> Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling download");
                cancel.cancel();
            }
        })
    };

    let result = relay_download(downloader, url, destination, &cancel, |event| print_json_line(event)).await;
    interrupt.abort();

    let outcome = result?;
    info!(?outcome, "Download finished");
    Ok(())
}

/// Run a download and hand each event to `emit`.
///
/// If `emit` fails the download is cancelled and awaited before the error is returned, so the
/// partial file is gone by then.
async fn relay_download<F>(
    downloader: &UpdateDownloader,
    url: Url,
    destination: PathBuf,
    cancel: &CancellationToken,
    mut emit: F,
) -> Result<DownloadOutcome>
where
    F: FnMut(&DownloadEvent) -> Result<()>,
{
    let (mut events, handle) = downloader.spawn_download(url, destination, cancel.clone());

    let mut emit_error = None;
    while let Some(event) = events.recv().await {
        if let Err(e) = emit(&event) {
            cancel.cancel();
            emit_error = Some(e);
            break;
        }
    }

    let outcome = handle.await.map_err(|e| Error::Io {
        path: PathBuf::from("<download task>"),
        source: std::io::Error::other(e),
    })?;

    match emit_error {
        Some(e) => Err(e),
        None => outcome,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(stdout_error)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{body}").map_err(stdout_error)
}

fn print_json_line<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let body = serde_json::to_string(value).map_err(stdout_error)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{body}").map_err(stdout_error)
}

fn stdout_error(source: impl Into<std::io::Error>) -> Error {
    Error::Io {
        path: PathBuf::from("<stdout>"),
        source: source.into(),
    }
}
