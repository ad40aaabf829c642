use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::LocalFileReader;
use crate::logging::LogSink;

const MIB: u64 = 1024 * 1024;

/// A progress line is logged each time this many bytes have arrived.
const PROGRESS_STEP: u64 = 8 * MIB;

/// A downloaded archive in a temporary file, removed when dropped.
#[derive(Debug)]
pub struct Download {
    file: NamedTempFile,
    size: u64,
}

impl Download {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open the downloaded data for random access.
    pub fn reader(&self) -> Result<LocalFileReader> {
        LocalFileReader::from_file(self.file.reopen()?)
    }
}

/// Fetch `url` into a temporary file.
///
/// The body is streamed chunk by chunk. There is no timeout and no retry;
/// any failure is returned as is.
pub async fn download(url: &str, log: &dyn LogSink) -> Result<Download> {
    let client = Client::builder()
        .user_agent(format!("{}/{}", crate::SHORT_NAME, crate::VERSION))
        .build()?;

    let mut resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("cannot connect to {url}"))?;

    if !resp.status().is_success() {
        bail!("HTTP request for {url} failed with status: {}", resp.status());
    }

    let total = resp.content_length();
    let file = tempfile::Builder::new()
        .prefix(&format!("{}__", crate::SHORT_NAME))
        .tempfile()
        .context("cannot create temporary file")?;

    log.line(&format!("Downloading {url} to {}...", file.path().display()));

    let mut out = tokio::fs::File::from_std(file.reopen()?);
    let mut received = 0u64;
    let mut reported = 0u64;

    while let Some(chunk) = resp
        .chunk()
        .await
        .with_context(|| format!("download of {url} interrupted"))?
    {
        out.write_all(&chunk).await?;
        received += chunk.len() as u64;

        if received / PROGRESS_STEP > reported / PROGRESS_STEP {
            log.line(&progress_line(received, total));
            reported = received;
        }
    }
    out.flush().await?;

    if reported != received {
        log.line(&progress_line(received, total));
    }
    log.line(&format!(
        "Download complete ({:.2} MiB)",
        received as f64 / MIB as f64
    ));

    Ok(Download {
        file,
        size: received,
    })
}

/// `  16 / 120 MiB`, with `?` when the server sent no length.
fn progress_line(received: u64, total: Option<u64>) -> String {
    let total = total.map_or_else(|| "?".to_string(), |t| t.div_ceil(MIB).to_string());
    format!("  {:<3} / {total} MiB", received.div_ceil(MIB))
}
