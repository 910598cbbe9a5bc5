//! Result sink (spec §4.7): buffered, per-hit-flushed output writer.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::error::OutputError;

/// Single-writer sink over the output file. Every accepted hit is written
/// as one newline-terminated line and flushed immediately, so a killed
/// process leaves a consistent prefix (spec §3 Invariants).
pub struct ResultSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ResultSink {
    /// Create (truncating) the output file. Called once at driver start;
    /// aborts the run before any worker starts if this fails (spec §4.7).
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .map_err(|source| OutputError::Create {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Write one validated URL and flush immediately. Write failures are
    /// logged and otherwise swallowed: a single bad write should not abort
    /// an otherwise-successful run once probing has started.
    pub async fn write_line(&mut self, line: &str) {
        info!(hit = %line, "validated proxy");
        if let Err(e) = self.writer.write_all(line.as_bytes()).await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write output line");
            return;
        }
        if let Err(e) = self.writer.write_all(b"\n").await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write output line");
            return;
        }
        if let Err(e) = self.writer.flush().await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to flush output file");
        }
    }

    pub async fn flush_and_close(mut self) {
        let _ = self.writer.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_are_flushed_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let mut sink = ResultSink::create(&path).await.unwrap();
            sink.write_line("http://1.2.3.4:8080").await;
            sink.write_line("127.0.0.1:1080").await;
            sink.flush_and_close().await;
        }
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "http://1.2.3.4:8080\n127.0.0.1:1080\n");
    }

    #[tokio::test]
    async fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        tokio::fs::write(&path, "stale\ncontent\n").await.unwrap();
        let sink = ResultSink::create(&path).await.unwrap();
        sink.flush_and_close().await;
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "");
    }
}
