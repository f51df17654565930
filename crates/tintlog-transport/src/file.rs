//! Batched NDJSON file transport.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::batch::{BatchConfig, BatchSink, Batcher};
use crate::error::TransportError;
use crate::record::TransportRecord;
use crate::transport::Transport;

/// Settings for a [`FileTransport`].
#[derive(Debug, Clone)]
pub struct FileConfig {
    pub path: PathBuf,
    pub batch: BatchConfig,
}

impl FileConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch: BatchConfig::default(),
        }
    }

    #[must_use]
    pub fn batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }
}

/// Appends each batch to a file, one JSON object per line.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    fn encode(batch: &[TransportRecord]) -> Result<Vec<u8>, TransportError> {
        let mut out = Vec::with_capacity(batch.len() * 128);
        for record in batch {
            serde_json::to_writer(&mut out, record)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl BatchSink for FileSink {
    async fn send(&self, batch: &[TransportRecord]) -> Result<(), TransportError> {
        let bytes = Self::encode(batch)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        // One write per batch keeps lines from separate flushes whole.
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Batched file sink.
pub struct FileTransport {
    name: String,
    batcher: Batcher<FileSink>,
}

impl FileTransport {
    pub fn new(name: impl Into<String>, config: FileConfig) -> Self {
        Self {
            name: name.into(),
            batcher: Batcher::new(FileSink { path: config.path }, config.batch),
        }
    }

    pub fn path(&self) -> &Path {
        &self.batcher.sink().path
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.batcher.pending_len()
    }
}

#[async_trait]
impl Transport for FileTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: TransportRecord) -> Result<(), TransportError> {
        self.batcher.enqueue(record)
    }

    async fn flush(&self) -> Result<(), TransportError> {
        self.batcher.flush().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.batcher.close().await
    }
}

impl std::fmt::Debug for FileTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTransport")
            .field("name", &self.name)
            .field("path", &self.path())
            .field("batcher", &self.batcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tintlog_core::{Level, LogRecord};

    fn config(path: PathBuf) -> FileConfig {
        FileConfig::new(path)
            .batch(BatchConfig::default().with_flush_interval(Duration::from_secs(3600)))
    }

    #[tokio::test]
    async fn test_appends_ndjson_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.ndjson");
        let transport = FileTransport::new("file", config(path.clone()));

        transport
            .write(TransportRecord::from(&LogRecord::new(Level::Info, "one")))
            .unwrap();
        transport.flush().await.unwrap();
        transport
            .write(TransportRecord::from(&LogRecord::new(Level::Error, "two")))
            .unwrap();
        transport.close().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: TransportRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.message, "two");
        assert_eq!(second.level, Level::Error);
    }

    #[tokio::test]
    async fn test_existing_content_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "{\"seed\":true}\n").unwrap();

        let transport = FileTransport::new("file", config(path.clone()));
        transport
            .write(TransportRecord::from(&LogRecord::new(Level::Warn, "appended")))
            .unwrap();
        transport.flush().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\"seed\":true}\n"));
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_unwritable_path_keeps_records_queued() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append.
        let transport = FileTransport::new("file", config(dir.path().to_path_buf()));
        transport
            .write(TransportRecord::from(&LogRecord::new(Level::Info, "stuck")))
            .unwrap();
        let err = transport.flush().await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(transport.pending_len(), 1);
    }
}
