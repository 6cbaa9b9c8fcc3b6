//! Native dialogs. A cancelled dialog is `None` / `false`, never an error.

use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

impl From<DialogKind> for MessageLevel {
    fn from(kind: DialogKind) -> Self {
        match kind {
            DialogKind::Info => MessageLevel::Info,
            DialogKind::Warning => MessageLevel::Warning,
            DialogKind::Error => MessageLevel::Error,
        }
    }
}

fn with_filters(dialog: FileDialog, filters: &[FileFilter]) -> FileDialog {
    filters.iter().fold(dialog, |dialog, filter| {
        dialog.add_filter(filter.name.as_str(), filter.extensions.as_slice())
    })
}

fn display(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

/// Splits a suggested save path into the directory to open (if any) and the
/// file name to prefill.
fn save_seed(default_path: &str) -> (Option<&Path>, String) {
    let path = Path::new(default_path);
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}

#[tauri::command]
pub fn pick_file(filters: Vec<FileFilter>) -> Option<String> {
    with_filters(FileDialog::new(), &filters)
        .set_title("Open")
        .pick_file()
        .map(display)
}

#[tauri::command]
pub fn pick_folder() -> Option<String> {
    FileDialog::new()
        .set_title("Open Folder")
        .pick_folder()
        .map(display)
}

#[tauri::command]
pub fn pick_save_path(filters: Vec<FileFilter>, default_path: &str) -> Option<String> {
    let (dir, name) = save_seed(default_path);
    let mut dialog = with_filters(FileDialog::new(), &filters).set_file_name(name);
    if let Some(dir) = dir {
        dialog = dialog.set_directory(dir);
    }
    dialog.save_file().map(display)
}

#[tauri::command]
pub fn confirm(title: &str, message: &str, kind: DialogKind) -> bool {
    let answer = MessageDialog::new()
        .set_title(title)
        .set_description(message)
        .set_level(kind.into())
        .set_buttons(MessageButtons::YesNo)
        .show();
    tracing::debug!(title, ?answer, "confirm dialog closed");
    answer == MessageDialogResult::Yes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_open_in_the_default_directory() {
        assert_eq!(save_seed("export.pdf"), (None, "export.pdf".to_string()));
    }

    #[test]
    fn full_paths_reopen_their_directory() {
        let (dir, name) = save_seed("/notes/ideas.md");
        assert_eq!(dir, Some(Path::new("/notes")));
        assert_eq!(name, "ideas.md");
    }

    #[test]
    fn filters_arrive_from_the_webview() {
        let filters: Vec<FileFilter> = serde_json::from_str(
            r#"[{"name":"Markdown","extensions":["md","markdown"]}]"#,
        )
        .unwrap();
        assert_eq!(filters[0].extensions, vec!["md", "markdown"]);
        let kind: DialogKind = serde_json::from_str(r#""warning""#).unwrap();
        assert_eq!(kind, DialogKind::Warning);
    }
}
