use crate::bridge::{ExportFormat, FileFilter};

pub const UNTITLED: &str = "untitled.md";

/// The file backing the open document. `path == None` is a buffer that has
/// never been saved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileRef {
    pub path: Option<String>,
    pub dirty: bool,
}

impl FileRef {
    pub fn title(&self) -> String {
        self.path
            .as_deref()
            .map(file_name)
            .unwrap_or(UNTITLED)
            .to_string()
    }

    pub fn format(&self) -> FileFormat {
        self.path
            .as_deref()
            .map(FileFormat::from_path)
            .unwrap_or_default()
    }
}

/// Last path component, accepting either separator.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Format badge of the open file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileFormat {
    #[default]
    Markdown,
    PlainText,
    Docx,
    Pdf,
}

impl FileFormat {
    pub fn from_path(path: &str) -> Self {
        let name = file_name(path);
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Self::PlainText,
            "docx" => Self::Docx,
            "pdf" => Self::Pdf,
            _ => Self::Markdown,
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::PlainText => "Plain Text",
            Self::Docx => "DOCX",
            Self::Pdf => "PDF",
        }
    }

    /// Identifier of the toolbar pill highlighted for this format.
    pub fn pill_id(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::PlainText => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

pub fn document_filters() -> Vec<FileFilter> {
    vec![
        FileFilter::new("Markdown", &["md", "markdown"]),
        FileFilter::new("Text", &["txt"]),
        FileFilter::new("All Files", &["*"]),
    ]
}

pub fn export_filters(format: ExportFormat) -> Vec<FileFilter> {
    let ext = format.extension();
    vec![FileFilter::new(&ext.to_ascii_uppercase(), &[ext])]
}

pub fn export_default_path(format: ExportFormat) -> String {
    format!("export.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_untitled() {
        assert_eq!(FileRef::default().title(), UNTITLED);
        let file = FileRef {
            path: Some("C:\\notes\\todo.md".to_string()),
            dirty: false,
        };
        assert_eq!(file.title(), "todo.md");
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(FileFormat::from_path("/a/b.MARKDOWN"), FileFormat::Markdown);
        assert_eq!(FileFormat::from_path("/a/b.txt"), FileFormat::PlainText);
        assert_eq!(FileFormat::from_path("/a.d/README"), FileFormat::Markdown);
        assert_eq!(FileFormat::from_path("/a/b.pdf").badge(), "PDF");
    }

    #[test]
    fn export_filter_is_named_after_extension() {
        let filters = export_filters(ExportFormat::Docx);
        assert_eq!(filters, vec![FileFilter::new("DOCX", &["docx"])]);
        assert_eq!(export_default_path(ExportFormat::Pdf), "export.pdf");
    }
}
