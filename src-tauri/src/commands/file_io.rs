use std::fs;

use crate::error::CommandError;

#[tauri::command(async)]
pub fn read_file(path: String) -> Result<String, CommandError> {
    fs::read_to_string(&path).map_err(CommandError::Read)
}

#[tauri::command(async)]
pub fn write_file(path: String, content: String) -> Result<(), CommandError> {
    fs::write(&path, &content).map_err(CommandError::Write)?;
    tracing::debug!(%path, bytes = content.len(), "wrote file");
    Ok(())
}

/// Creates an empty file, truncating one that already exists.
#[tauri::command(async)]
pub fn create_file(path: String) -> Result<(), CommandError> {
    fs::write(&path, "").map_err(CommandError::Create)?;
    tracing::info!(%path, "created file");
    Ok(())
}
