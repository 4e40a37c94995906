//! edsrv core - configuration, temporary files and external editor invocation
//!
//! This crate holds everything the edit-server does besides speaking HTTP: an
//! edit request materializes its payload into a [`TempFile`], an [`Editor`]
//! runs against that file, and the caller reads the result back.

pub mod config;
pub mod editor;
pub mod error;
pub mod fake;
pub mod file;

// Re-export commonly used types
pub use config::{Config, ConfigOverrides};
pub use editor::{Editor, EditorCommand, ProcessEditor};
pub use error::{EdsrvError, ErrorSeverity, Result};
pub use file::{EditFile, TempFile};

/// Application name
pub const APP_NAME: &str = "edsrv";
