//! Release manifest published next to each build.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::{Error, Result};

/// `{"version": "...", "changelog": ["..."], "download_url": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpdateManifest {
    pub version: String,
    #[serde(default)]
    pub changelog: Vec<String>,
    pub download_url: Url,
}

/// Whether `remote` is newer than `current`.
///
/// Plain string ordering, which is what deployed clients compare with: `"1.2.0"` counts as newer
/// than `"1.10.0"`. Switching to numeric ordering changes which clients see an update, so it has
/// to ship together with a manifest migration.
pub fn is_newer(remote: &str, current: &str) -> bool {
    remote > current
}

/// GET and parse the manifest. Non-success status codes and transport failures are network
/// errors; an unparsable document is a network error naming the URL.
#[instrument(skip(client, url), fields(url = %url), err)]
pub async fn fetch_manifest(client: &Client, url: &Url) -> Result<UpdateManifest> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;

    let manifest = response.json::<UpdateManifest>().await.map_err(|e| Error::Network {
        message: format!("invalid manifest at {url}: {e}"),
    })?;

    debug!(version = %manifest.version, "Fetched update manifest");
    Ok(manifest)
}
