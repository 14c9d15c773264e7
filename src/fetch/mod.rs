//! Dataset retrieval over HTTP or from disk.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::{debug, info};

/// Default dataset: Our World in Data's full COVID-19 table.
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/owid/covid-19-data/master/public/data/owid-covid-data.csv";

/// Issues a GET and returns the body. Non-success statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads a dataset from a URL or a local path, gunzipping `.gz` sources.
#[tracing::instrument]
pub async fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source)
            .await
            .with_context(|| format!("downloading {source}"))?
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");

    if source.ends_with(".gz") {
        let bytes = gunzip(&bytes).with_context(|| format!("decompressing {source}"))?;
        info!(bytes = bytes.len(), "Source decompressed");
        return Ok(bytes);
    }

    Ok(bytes)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
