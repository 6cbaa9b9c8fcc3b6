use std::io;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failure of a host command. The webview receives the display string.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to read file: {0}")]
    Read(#[source] io::Error),
    #[error("Failed to write file: {0}")]
    Write(#[source] io::Error),
    #[error("Failed to create file: {0}")]
    Create(#[source] io::Error),
    #[error("Failed to read directory: {0}")]
    ListDirectory(#[source] io::Error),
    #[error("Failed to export {format}: {source}")]
    ExportWrite {
        format: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("Failed to build docx: {0}")]
    Docx(String),
    #[error("No suitable font found for PDF export: {0}. Install Arial or Liberation fonts.")]
    FontMissing(#[source] genpdf::error::Error),
    #[error("Failed to render PDF: {0}")]
    Pdf(#[source] genpdf::error::Error),
    #[error("Failed to locate settings: {0}")]
    ConfigDir(#[from] tauri::Error),
    #[error("Failed to access settings: {0}")]
    Settings(#[source] io::Error),
}

impl Serialize for CommandError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
