use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::core::api_client::MediaStream;

const CHUNK_TIMEOUT: Duration = Duration::from_secs(45);
const WRITE_BUFFER: usize = 256 * 1024;
// Pseudo total used to animate progress when the length is unknown.
const UNKNOWN_TOTAL_PAD: f64 = 500_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl Transfer {
    pub fn percent(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => {
                ((self.downloaded as f64 / total as f64) * 100.0).min(100.0)
            }
            _ => {
                let d = self.downloaded as f64;
                ((d / (d + UNKNOWN_TOTAL_PAD)) * 100.0).min(95.0)
            }
        }
    }
}

pub fn part_path_for(output: &Path) -> PathBuf {
    let mut part = output.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

/// Writes `stream` to `output` through a `.part` file and returns the final size.
/// Empty bodies, HTML error pages and short reads are errors; the partial file is
/// removed on any failure.
pub async fn save_stream(
    stream: MediaStream,
    output: &Path,
    progress_tx: &mpsc::Sender<Transfer>,
) -> anyhow::Result<u64> {
    let part_path = part_path_for(output);
    match write_part(stream, &part_path, output, progress_tx).await {
        Ok(size) => Ok(size),
        Err(e) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            Err(e)
        }
    }
}

async fn write_part(
    stream: MediaStream,
    part_path: &Path,
    output: &Path,
    progress_tx: &mpsc::Sender<Transfer>,
) -> anyhow::Result<u64> {
    if stream
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("text/html"))
    {
        return Err(anyhow!(
            "Server returned HTML instead of media, the link may have expired"
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file = tokio::fs::File::create(part_path).await?;
    let mut file = tokio::io::BufWriter::with_capacity(WRITE_BUFFER, file);
    let total = stream.content_length;
    let mut body = stream.body;
    let mut downloaded = 0u64;

    loop {
        match tokio::time::timeout(CHUNK_TIMEOUT, body.next()).await {
            Ok(Some(Ok(chunk))) => {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| anyhow!("Write failed (disk full?): {}", e))?;
                downloaded += chunk.len() as u64;
                let _ = progress_tx.send(Transfer { downloaded, total }).await;
            }
            Ok(Some(Err(e))) => {
                file.flush().await?;
                return Err(anyhow!("Download stream error: {}", e));
            }
            Ok(None) => break,
            Err(_) => {
                file.flush().await?;
                return Err(anyhow!(
                    "Download timed out, no data received for {} seconds",
                    CHUNK_TIMEOUT.as_secs()
                ));
            }
        }
    }
    file.flush().await?;
    drop(file);

    if downloaded == 0 {
        return Err(anyhow!("Downloaded file is empty"));
    }

    if let Some(expected) = total {
        if expected > 0 && downloaded != expected {
            return Err(anyhow!(
                "Incomplete download: expected {} bytes, received {}",
                expected,
                downloaded
            ));
        }
    }

    tokio::fs::rename(part_path, output).await?;
    tracing::debug!("[direct] saved {} bytes to {}", downloaded, output.display());
    Ok(downloaded)
}
