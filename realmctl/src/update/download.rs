//! Streaming, cancellable file download with percentage progress.
//!
//! The response body is written in [`CHUNK_SIZE`] pieces. Before each piece the cancel token is
//! checked; after each piece a [`DownloadEvent::Progress`] is emitted. Every call ends with
//! exactly one [`DownloadEvent::Finished`], after which no further events are emitted.
//!
//! On cancellation the partial file is removed. On any other failure it is left in place.

use bytes::BytesMut;
use reqwest::{Client, Response};
use serde::Serialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::errors::{Error, Result};

/// Bytes written per progress step.
pub const CHUNK_SIZE: usize = 4096;

/// How a download that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOutcome {
    Completed,
    Cancelled,
}

/// Terminal status reported to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum DownloadStatus {
    Completed,
    Cancelled,
    Failed(String),
}

impl From<DownloadOutcome> for DownloadStatus {
    fn from(outcome: DownloadOutcome) -> Self {
        match outcome {
            DownloadOutcome::Completed => DownloadStatus::Completed,
            DownloadOutcome::Cancelled => DownloadStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadEvent {
    /// Percentage of the declared content length written so far
    Progress(u8),
    Finished(DownloadStatus),
}

/// Download `url` to `destination`, reporting through `on_event`.
///
/// A response without a declared content length is rejected before anything is written.
#[instrument(skip(client, url, destination, on_event, cancel), fields(url = %url, destination = %destination.display()), err)]
pub async fn download<F>(
    client: &Client,
    url: &Url,
    destination: &Path,
    mut on_event: F,
    cancel: &CancellationToken,
) -> Result<DownloadOutcome>
where
    F: FnMut(DownloadEvent),
{
    let result = stream_to_file(client, url, destination, &mut on_event, cancel).await;

    let status = match &result {
        Ok(outcome) => DownloadStatus::from(*outcome),
        Err(e) => DownloadStatus::Failed(e.to_string()),
    };
    on_event(DownloadEvent::Finished(status));

    result
}

async fn stream_to_file<F>(
    client: &Client,
    url: &Url,
    destination: &Path,
    on_event: &mut F,
    cancel: &CancellationToken,
) -> Result<DownloadOutcome>
where
    F: FnMut(DownloadEvent),
{
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Download cancelled before the transfer started");
            return Ok(DownloadOutcome::Cancelled);
        }
        response = client.get(url.clone()).send() => response?,
    };
    let mut response = response.error_for_status()?;

    let total = response.content_length().ok_or_else(|| Error::Network {
        message: format!("{url} did not declare a content length"),
    })?;
    debug!(total, "Starting download");

    let io_err = |source: std::io::Error| Error::Io {
        path: destination.to_path_buf(),
        source,
    };
    let mut file = File::create(destination).await.map_err(io_err)?;

    let mut buffer = BytesMut::with_capacity(CHUNK_SIZE * 2);
    let mut written: u64 = 0;
    let mut body_done = false;

    loop {
        if !body_done && buffer.len() < CHUNK_SIZE {
            match next_body_chunk(&mut response, cancel).await {
                BodyRead::Data(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    continue;
                }
                BodyRead::End => body_done = true,
                BodyRead::Cancelled => return discard(file, destination).await,
                BodyRead::Failed(e) => {
                    flush_partial(&mut file, destination).await;
                    return Err(Error::network(e));
                }
            }
        }

        if buffer.is_empty() {
            break;
        }

        if cancel.is_cancelled() {
            return discard(file, destination).await;
        }

        let chunk = buffer.split_to(buffer.len().min(CHUNK_SIZE));
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
        on_event(DownloadEvent::Progress(percent(written, total)));
    }

    file.flush().await.map_err(io_err)?;

    if written != total {
        return Err(Error::Network {
            message: format!("transfer ended after {written} of {total} bytes"),
        });
    }

    info!(bytes = written, "Download completed");
    Ok(DownloadOutcome::Completed)
}

enum BodyRead {
    Data(bytes::Bytes),
    End,
    Cancelled,
    Failed(reqwest::Error),
}

/// Next piece of the body, or `Cancelled` if the token fires while waiting on the network.
async fn next_body_chunk(response: &mut Response, cancel: &CancellationToken) -> BodyRead {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => BodyRead::Cancelled,
        chunk = response.chunk() => match chunk {
            Ok(Some(bytes)) => BodyRead::Data(bytes),
            Ok(None) => BodyRead::End,
            Err(e) => BodyRead::Failed(e),
        },
    }
}

/// Drop the partial file after a cancellation.
async fn discard(file: File, destination: &Path) -> Result<DownloadOutcome> {
    drop(file);
    match tokio::fs::remove_file(destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(Error::Io {
                path: destination.to_path_buf(),
                source,
            });
        }
    }
    info!(destination = %destination.display(), "Download cancelled, partial file removed");
    Ok(DownloadOutcome::Cancelled)
}

async fn flush_partial(file: &mut File, destination: &Path) {
    if let Err(e) = file.flush().await {
        warn!(destination = %destination.display(), error = %e, "Could not flush partial download");
    }
}

fn percent(written: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (written.saturating_mul(100) / total).min(100) as u8
}
