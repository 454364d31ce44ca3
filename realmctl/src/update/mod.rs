//! Self-update: version check against the release manifest and artifact download.
//!
//! [`UpdateDownloader`] tracks where it is in the update flow and publishes it through a
//! `watch` channel:
//!
//! ```text
//! Idle -> CheckingVersion -> UpToDate
//!                         -> UpdateAvailable -> Downloading -> Completed | Cancelled | Failed
//! ```
//!
//! A failed check also ends in `Failed`. The artifact is written as served; nothing verifies
//! its integrity.

pub mod download;
pub mod manifest;

use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::config::ServerConfig;
use crate::errors::{Error, Result};

pub use download::{CHUNK_SIZE, DownloadEvent, DownloadOutcome, DownloadStatus};
pub use manifest::{UpdateManifest, is_newer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateState {
    Idle,
    CheckingVersion,
    UpToDate,
    UpdateAvailable { version: String },
    Downloading { percent: u8 },
    Completed,
    Cancelled,
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct UpdateDownloader {
    client: Client,
    state: Arc<watch::Sender<UpdateState>>,
}

impl UpdateDownloader {
    /// Build a downloader whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        crate::install_crypto_provider();

        let client = Client::builder().timeout(timeout).build().map_err(Error::network)?;
        let (state, _) = watch::channel(UpdateState::Idle);

        Ok(Self {
            client,
            state: Arc::new(state),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(config.update_timeout)
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UpdateState {
        self.state.borrow().clone()
    }

    fn set_state(&self, state: UpdateState) {
        self.state.send_replace(state);
    }

    /// Fetch the manifest and return it if it announces a newer version than `current_version`.
    pub async fn check_version(&self, manifest_url: &Url, current_version: &str) -> Result<Option<UpdateManifest>> {
        self.set_state(UpdateState::CheckingVersion);

        let manifest = match manifest::fetch_manifest(&self.client, manifest_url).await {
            Ok(manifest) => manifest,
            Err(e) => {
                self.set_state(UpdateState::Failed { message: e.to_string() });
                return Err(e);
            }
        };

        if is_newer(&manifest.version, current_version) {
            info!(current = current_version, available = %manifest.version, "Update available");
            self.set_state(UpdateState::UpdateAvailable {
                version: manifest.version.clone(),
            });
            Ok(Some(manifest))
        } else {
            info!(current = current_version, published = %manifest.version, "Already up to date");
            self.set_state(UpdateState::UpToDate);
            Ok(None)
        }
    }

    /// Stream `url` to `destination`. See [`download::download`] for the event contract.
    pub async fn download<F>(
        &self,
        url: &Url,
        destination: &Path,
        mut on_event: F,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome>
    where
        F: FnMut(DownloadEvent),
    {
        self.set_state(UpdateState::Downloading { percent: 0 });

        download::download(
            &self.client,
            url,
            destination,
            |event| {
                self.set_state(state_for(&event));
                on_event(event);
            },
            cancel,
        )
        .await
    }

    /// Run the download on a tokio task and deliver its events over a channel.
    pub fn spawn_download(
        &self,
        url: Url,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> (mpsc::UnboundedReceiver<DownloadEvent>, JoinHandle<Result<DownloadOutcome>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let this = self.clone();

        let handle = tokio::spawn(async move {
            this.download(
                &url,
                &destination,
                |event| {
                    let _ = tx.send(event);
                },
                &cancel,
            )
            .await
        });

        (rx, handle)
    }
}

fn state_for(event: &DownloadEvent) -> UpdateState {
    match event {
        DownloadEvent::Progress(percent) => UpdateState::Downloading { percent: *percent },
        DownloadEvent::Finished(DownloadStatus::Completed) => UpdateState::Completed,
        DownloadEvent::Finished(DownloadStatus::Cancelled) => UpdateState::Cancelled,
        DownloadEvent::Finished(DownloadStatus::Failed(message)) => UpdateState::Failed {
            message: message.clone(),
        },
    }
}
