use std::fs;

use serde::Serialize;

use crate::error::CommandError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
}

/// Immediate children of `path`: dot-files skipped, directories first, then
/// by case-insensitive name.
#[tauri::command(async)]
pub fn list_directory(path: String) -> Result<Vec<FsEntry>, CommandError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(&path).map_err(CommandError::ListDirectory)? {
        let entry = entry.map_err(CommandError::ListDirectory)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(CommandError::ListDirectory)?;
        entries.push(FsEntry {
            name,
            path: entry.path().to_string_lossy().into_owned(),
            is_dir: file_type.is_dir(),
        });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    tracing::debug!(path, count = entries.len(), "listed directory");
    Ok(entries)
}
