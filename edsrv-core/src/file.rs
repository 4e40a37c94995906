//! Temporary files holding a payload while an external editor works on it

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::Span;
use uuid::Uuid;

use crate::error::Result;

/// Prefix for every temporary file created by the edit-server
pub const FILE_PREFIX: &str = "edsrv-";

/// A file handed to an external editor
#[async_trait]
pub trait EditFile: Send + Sync {
    /// Full path to the file
    fn path(&self) -> &Path;

    /// Size in bytes of the payload the file was created with
    fn size(&self) -> usize;

    /// Read the current file contents
    async fn read(&self) -> Result<Vec<u8>>;

    /// Remove the file
    async fn remove(&self) -> Result<()>;

    /// Record the file attributes on the informed span
    fn record(&self, span: &Span) {
        span.record("file", tracing::field::display(self.path().display()));
        span.record("size", self.size());
    }
}

/// Temporary file on disk, exclusively owned by the request that created it
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    size: usize,
}

impl TempFile {
    /// Create a new uniquely named file inside `dir` holding `payload`
    pub async fn create(dir: &Path, payload: &[u8]) -> Result<Self> {
        let path = dir.join(format!("{}{}", FILE_PREFIX, Uuid::new_v4().simple()));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(payload).await?;
        file.flush().await?;
        file.sync_all().await?;

        Ok(Self {
            path,
            size: payload.len(),
        })
    }
}

#[async_trait]
impl EditFile for TempFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path).await?)
    }

    async fn remove(&self) -> Result<()> {
        Ok(fs::remove_file(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_writes_payload() {
        let dir = TempDir::new().unwrap();
        let file = TempFile::create(dir.path(), b"some text").await.unwrap();

        assert_eq!(file.size(), 9);
        assert!(file.path().starts_with(dir.path()));
        assert!(file
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(FILE_PREFIX));
        assert_eq!(file.read().await.unwrap(), b"some text");
    }

    #[tokio::test]
    async fn test_read_reflects_external_changes() {
        let dir = TempDir::new().unwrap();
        let file = TempFile::create(dir.path(), b"before").await.unwrap();

        std::fs::write(file.path(), b"after the editor ran").unwrap();

        assert_eq!(file.read().await.unwrap(), b"after the editor ran");
        // size keeps the length written at creation
        assert_eq!(file.size(), 6);
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let file = TempFile::create(dir.path(), b"").await.unwrap();
        assert!(file.path().exists());

        file.remove().await.unwrap();
        assert!(!file.path().exists());

        // a second removal reports the missing file
        assert!(file.remove().await.is_err());
        assert!(file.read().await.is_err());
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = TempFile::create(&missing, b"payload").await;
        assert!(matches!(result, Err(crate::EdsrvError::Io(_))));
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_unique() {
        let dir = TempDir::new().unwrap();

        let creates = (0..32).map(|i| {
            let dir = dir.path().to_path_buf();
            async move {
                TempFile::create(&dir, format!("payload {}", i).as_bytes())
                    .await
                    .unwrap()
            }
        });
        let files = futures_util::future::join_all(creates).await;

        let paths: HashSet<_> = files.iter().map(|f| f.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 32);

        for (i, file) in files.iter().enumerate() {
            assert_eq!(
                file.read().await.unwrap(),
                format!("payload {}", i).into_bytes()
            );
        }
    }
}
