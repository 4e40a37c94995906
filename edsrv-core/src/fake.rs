//! Deterministic stand-ins for the external editor and its files

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Span;

use crate::editor::Editor;
use crate::error::{EdsrvError, Result};
use crate::file::EditFile;

/// In-memory file that always reads back a fixed payload
#[derive(Debug, Clone)]
pub struct FakeFile {
    path: PathBuf,
    payload: Vec<u8>,
    fail_read: bool,
    removals: Arc<AtomicUsize>,
}

impl FakeFile {
    pub fn new(name: impl Into<PathBuf>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            path: name.into(),
            payload: payload.into(),
            fail_read: false,
            removals: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every read fail
    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Number of times the file has been removed
    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EditFile for FakeFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> usize {
        self.payload.len()
    }

    async fn read(&self) -> Result<Vec<u8>> {
        if self.fail_read {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: no such file", self.path.display()),
            )
            .into());
        }
        Ok(self.payload.clone())
    }

    async fn remove(&self) -> Result<()> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Editor that never spawns a process, handing back a [`FakeFile`]
#[derive(Debug, Clone)]
pub struct FakeEditor {
    file: FakeFile,
    fail_edit: bool,
}

impl FakeEditor {
    /// Editor whose result is always `payload`, whatever was sent
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            file: FakeFile::new("fake", payload),
            fail_edit: false,
        }
    }

    /// Editor handing back the informed file
    pub fn with_file(file: FakeFile) -> Self {
        Self {
            file,
            fail_edit: false,
        }
    }

    /// Make every edit fail as if the editor exited with an error
    pub fn failing(mut self) -> Self {
        self.fail_edit = true;
        self
    }

    /// Shared view on the file handed out by this editor
    pub fn file(&self) -> &FakeFile {
        &self.file
    }
}

#[async_trait]
impl Editor for FakeEditor {
    fn command(&self) -> &str {
        "fake-editor"
    }

    fn tmp_dir(&self) -> &Path {
        Path::new("none")
    }

    async fn edit(&self, _payload: &[u8], span: &Span) -> Result<Box<dyn EditFile>> {
        if self.fail_edit {
            return Err(EdsrvError::EditorSpawn {
                command: self.command().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "fake editor failure"),
            });
        }
        self.file.record(span);
        Ok(Box::new(self.file.clone()))
    }
}
