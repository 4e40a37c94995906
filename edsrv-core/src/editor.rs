//! External editor invocation
//!
//! The [`Editor`] trait is the seam between the HTTP layer and the external
//! process: [`ProcessEditor`] runs the configured command against a
//! [`TempFile`], while [`crate::fake::FakeEditor`] stands in for it in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, warn, Span};

use crate::error::{EdsrvError, Result};
use crate::file::{EditFile, TempFile};

/// Editor capable of editing a payload through a file
#[async_trait]
pub trait Editor: Send + Sync {
    /// Editor command in use, as configured
    fn command(&self) -> &str;

    /// Temporary directory in use
    fn tmp_dir(&self) -> &Path;

    /// Edit the payload, returning the file holding the result
    ///
    /// The caller owns the returned file and is expected to read and remove
    /// it. File attributes are recorded on `span`.
    async fn edit(&self, payload: &[u8], span: &Span) -> Result<Box<dyn EditFile>>;
}

/// Editor command template: program, fixed arguments, file path appended last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    raw: String,
    program: String,
    args: Vec<String>,
}

impl EditorCommand {
    /// Parse the command template, splitting on whitespace
    pub fn parse(raw: &str) -> Result<Self> {
        let mut tokens = raw.split_whitespace().map(str::to_string);
        let program = tokens
            .next()
            .ok_or_else(|| EdsrvError::config("editor command is empty"))?;

        Ok(Self {
            raw: raw.to_string(),
            program,
            args: tokens.collect(),
        })
    }

    /// Command template exactly as configured
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Full argument vector for editing the informed file
    pub fn script(&self, file: &Path) -> Vec<String> {
        let mut script = Vec::with_capacity(self.args.len() + 2);
        script.push(self.program.clone());
        script.extend(self.args.iter().cloned());
        script.push(file.display().to_string());
        script
    }

    fn to_command(&self, file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        cmd
    }
}

/// Editor backed by an external process
#[derive(Debug, Clone)]
pub struct ProcessEditor {
    command: EditorCommand,
    tmp_dir: PathBuf,
}

impl ProcessEditor {
    /// Create a new editor with the desired command and temporary directory
    pub fn new(command: &str, tmp_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            command: EditorCommand::parse(command)?,
            tmp_dir: tmp_dir.into(),
        })
    }

    /// Runs the editor command against the file and waits for it to finish
    async fn run_command_and_wait(&self, file: &dyn EditFile) -> Result<()> {
        let script = self.command.script(file.path());
        info!(?script, "running editor command and waiting...");

        let output = self
            .command
            .to_command(file.path())
            .output()
            .await
            .map_err(|source| {
                error!(?script, error = %source, "unable to start editor command");
                EdsrvError::EditorSpawn {
                    command: self.command.as_str().to_string(),
                    source,
                }
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            error!(?script, status = %output.status, output = %combined, "editor command failed");
            return Err(EdsrvError::EditorExit {
                command: self.command.as_str().to_string(),
                status: output.status,
                output: combined,
            });
        }

        debug!(?script, output = %combined, "editor command result");
        Ok(())
    }
}

#[async_trait]
impl Editor for ProcessEditor {
    fn command(&self) -> &str {
        self.command.as_str()
    }

    fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    async fn edit(&self, payload: &[u8], span: &Span) -> Result<Box<dyn EditFile>> {
        debug!(parent: span, "creating temporary file for payload");
        let file = TempFile::create(&self.tmp_dir, payload).await?;
        file.record(span);
        debug!(parent: span, "temporary file created");

        if let Err(e) = self.run_command_and_wait(&file).await {
            // a failed edit never hands the file back, so it is cleaned up here
            match file.remove().await {
                Ok(()) => debug!(parent: span, "temporary file removed after failed edit"),
                Err(remove_err) => {
                    warn!(parent: span, error = %remove_err, "unable to remove temporary file")
                }
            }
            return Err(e);
        }

        Ok(Box::new(file))
    }
}
