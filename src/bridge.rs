//! Calls into the native host.
//!
//! [`HostBridge`] is the seam between the session and the Tauri side; the
//! session only ever talks to it, so tests swap in a scripted bridge.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;

use crate::settings::AppSettings;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["window", "__TAURI__", "core"])]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The command ran and rejected; `message` is the host's error text.
    #[error("{message}")]
    Host {
        command: &'static str,
        message: String,
    },
    #[error("unexpected payload for `{command}`: {message}")]
    Decode {
        command: &'static str,
        message: String,
    },
}

impl BridgeError {
    pub fn host(command: &'static str, message: impl Into<String>) -> Self {
        Self::Host {
            command,
            message: message.into(),
        }
    }
}

/// One row of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            is_dir: false,
        }
    }

    pub fn dir(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            is_dir: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Confirm {
    pub title: String,
    pub message: String,
    pub kind: DialogKind,
}

impl Confirm {
    pub fn discard_changes() -> Self {
        Self {
            title: "Unsaved Changes".to_string(),
            message: "You have unsaved changes. Discard them?".to_string(),
            kind: DialogKind::Warning,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Txt,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    fn command(self) -> &'static str {
        match self {
            Self::Txt => "export_txt",
            Self::Docx => "export_docx",
            Self::Pdf => "export_pdf",
        }
    }
}

/// Native surface consumed by the session. Dialog methods return `Ok(None)`
/// (or `Ok(false)`) when the user cancels.
#[allow(async_fn_in_trait)]
pub trait HostBridge {
    async fn read_file(&self, path: &str) -> Result<String, BridgeError>;
    async fn write_file(&self, path: &str, content: &str) -> Result<(), BridgeError>;
    async fn create_file(&self, path: &str) -> Result<(), BridgeError>;
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, BridgeError>;
    async fn export(&self, format: ExportFormat, markdown: &str, path: &str)
        -> Result<(), BridgeError>;

    async fn pick_file(&self, filters: &[FileFilter]) -> Result<Option<String>, BridgeError>;
    async fn pick_folder(&self) -> Result<Option<String>, BridgeError>;
    async fn pick_save_path(
        &self,
        filters: &[FileFilter],
        default_path: &str,
    ) -> Result<Option<String>, BridgeError>;
    async fn confirm(&self, prompt: &Confirm) -> Result<bool, BridgeError>;
}

#[derive(Serialize)]
struct NoArgs {}
#[derive(Serialize)]
struct PathArgs<'a> {
    path: &'a str,
}
#[derive(Serialize)]
struct WriteFileArgs<'a> {
    path: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct ExportArgs<'a> {
    markdown: &'a str,
    path: &'a str,
}
#[derive(Serialize)]
struct PickArgs<'a> {
    filters: &'a [FileFilter],
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePathArgs<'a> {
    filters: &'a [FileFilter],
    default_path: &'a str,
}

/// Commands reject with a plain string; anything else is a JS exception.
fn js_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    match err.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{err:?}"),
    }
}

/// Bridge over `window.__TAURI__.core.invoke`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TauriBridge;

impl TauriBridge {
    async fn call<A, T>(&self, command: &'static str, args: &A) -> Result<T, BridgeError>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let args = serde_wasm_bindgen::to_value(args).map_err(|err| BridgeError::Decode {
            command,
            message: err.to_string(),
        })?;
        let reply = invoke(command, args).await.map_err(|err| {
            let message = js_message(&err);
            tracing::debug!(command, %message, "host command rejected");
            BridgeError::Host { command, message }
        })?;
        serde_wasm_bindgen::from_value(reply).map_err(|err| BridgeError::Decode {
            command,
            message: err.to_string(),
        })
    }

    pub async fn load_settings(&self) -> Result<AppSettings, BridgeError> {
        self.call("load_settings", &NoArgs {}).await
    }
}

impl HostBridge for TauriBridge {
    async fn read_file(&self, path: &str) -> Result<String, BridgeError> {
        self.call("read_file", &PathArgs { path }).await
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), BridgeError> {
        self.call("write_file", &WriteFileArgs { path, content }).await
    }

    async fn create_file(&self, path: &str) -> Result<(), BridgeError> {
        self.call("create_file", &PathArgs { path }).await
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, BridgeError> {
        self.call("list_directory", &PathArgs { path }).await
    }

    async fn export(
        &self,
        format: ExportFormat,
        markdown: &str,
        path: &str,
    ) -> Result<(), BridgeError> {
        self.call(format.command(), &ExportArgs { markdown, path })
            .await
    }

    async fn pick_file(&self, filters: &[FileFilter]) -> Result<Option<String>, BridgeError> {
        self.call("pick_file", &PickArgs { filters }).await
    }

    async fn pick_folder(&self) -> Result<Option<String>, BridgeError> {
        self.call("pick_folder", &NoArgs {}).await
    }

    async fn pick_save_path(
        &self,
        filters: &[FileFilter],
        default_path: &str,
    ) -> Result<Option<String>, BridgeError> {
        self.call(
            "pick_save_path",
            &SavePathArgs {
                filters,
                default_path,
            },
        )
        .await
    }

    async fn confirm(&self, prompt: &Confirm) -> Result<bool, BridgeError> {
        self.call("confirm", prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_entry_matches_host_json() {
        let entries: Vec<DirEntry> = serde_json::from_str(
            r#"[{"name":"notes","path":"/w/notes","is_dir":true},
                {"name":"a.md","path":"/w/a.md","is_dir":false}]"#,
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![DirEntry::dir("notes", "/w/notes"), DirEntry::file("a.md", "/w/a.md")]
        );
    }

    #[test]
    fn save_path_args_use_camel_case() {
        let filters = [FileFilter::new("DOCX", &["docx"])];
        let json = serde_json::to_value(SavePathArgs {
            filters: &filters,
            default_path: "export.docx",
        })
        .unwrap();
        assert_eq!(json["defaultPath"], "export.docx");
        assert_eq!(json["filters"][0]["extensions"][0], "docx");
    }

    #[test]
    fn confirm_kind_serializes_lowercase() {
        let json = serde_json::to_value(Confirm::discard_changes()).unwrap();
        assert_eq!(json["kind"], "warning");
        assert_eq!(json["title"], "Unsaved Changes");
    }
}
