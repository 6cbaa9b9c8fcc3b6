//! Toolbar buttons and export pills.

use crate::bridge::{ExportFormat, HostBridge};
use crate::session::{Outcome, Session};

pub const TABLE_TEMPLATE: &str = "\
| Column 1 | Column 2 | Column 3 |
| -------- | -------- | -------- |
| Cell 1   | Cell 2   | Cell 3   |
| Cell 4   | Cell 5   | Cell 6   |";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    H1,
    H2,
    H3,
    BulletList,
    NumberedList,
    Checklist,
    Link,
    Image,
    Table,
    Quote,
    Undo,
    Redo,
}

/// What an action does to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    Wrap(&'static str, &'static str),
    Prefix(&'static str),
    Block(&'static str),
    Undo,
    Redo,
}

impl ToolbarAction {
    pub const ALL: [ToolbarAction; 17] = [
        Self::Undo,
        Self::Redo,
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strikethrough,
        Self::Code,
        Self::H1,
        Self::H2,
        Self::H3,
        Self::BulletList,
        Self::NumberedList,
        Self::Checklist,
        Self::Quote,
        Self::Link,
        Self::Image,
        Self::Table,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Code => "code",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::BulletList => "ul",
            Self::NumberedList => "ol",
            Self::Checklist => "checklist",
            Self::Link => "link",
            Self::Image => "image",
            Self::Table => "table",
            Self::Quote => "quote",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bold => "B",
            Self::Italic => "I",
            Self::Underline => "U",
            Self::Strikethrough => "S",
            Self::Code => "</>",
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
            Self::BulletList => "•",
            Self::NumberedList => "1.",
            Self::Checklist => "☐",
            Self::Link => "🔗",
            Self::Image => "🖼",
            Self::Table => "▦",
            Self::Quote => "❝",
            Self::Undo => "↶",
            Self::Redo => "↷",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Underline => "Underline",
            Self::Strikethrough => "Strikethrough",
            Self::Code => "Inline code",
            Self::H1 => "Heading 1",
            Self::H2 => "Heading 2",
            Self::H3 => "Heading 3",
            Self::BulletList => "Bulleted list",
            Self::NumberedList => "Numbered list",
            Self::Checklist => "Checklist",
            Self::Link => "Link",
            Self::Image => "Image",
            Self::Table => "Table",
            Self::Quote => "Quote",
            Self::Undo => "Undo",
            Self::Redo => "Redo",
        }
    }

    pub fn edit(self) -> Edit {
        match self {
            Self::Bold => Edit::Wrap("**", "**"),
            Self::Italic => Edit::Wrap("*", "*"),
            // markdown has no underline; fall back to HTML
            Self::Underline => Edit::Wrap("<u>", "</u>"),
            Self::Strikethrough => Edit::Wrap("~~", "~~"),
            Self::Code => Edit::Wrap("`", "`"),
            Self::Link => Edit::Wrap("[", "](url)"),
            Self::Image => Edit::Wrap("![alt](", ")"),
            Self::H1 => Edit::Prefix("# "),
            Self::H2 => Edit::Prefix("## "),
            Self::H3 => Edit::Prefix("### "),
            Self::BulletList => Edit::Prefix("- "),
            Self::NumberedList => Edit::Prefix("1. "),
            Self::Checklist => Edit::Prefix("- [ ] "),
            Self::Quote => Edit::Prefix("> "),
            Self::Table => Edit::Block(TABLE_TEMPLATE),
            Self::Undo => Edit::Undo,
            Self::Redo => Edit::Redo,
        }
    }
}

/// Applies a toolbar action. Returns whether the document changed.
pub fn dispatch<B: HostBridge>(session: &Session<B>, action: ToolbarAction) -> bool {
    tracing::trace!(action = action.id(), "toolbar action");
    match action.edit() {
        Edit::Wrap(before, after) => session.insert_markdown(before, after),
        Edit::Prefix(prefix) => session.insert_line_prefix(prefix),
        Edit::Block(block) => session.insert_block(block),
        Edit::Undo => session.undo(),
        Edit::Redo => session.redo(),
    }
}

/// Format pills. Markdown is the native format, so its pill only shows state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pill {
    Markdown,
    Export(ExportFormat),
}

impl Pill {
    pub const ALL: [Pill; 4] = [
        Self::Markdown,
        Self::Export(ExportFormat::Txt),
        Self::Export(ExportFormat::Docx),
        Self::Export(ExportFormat::Pdf),
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Export(format) => format.extension(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Markdown => ".md",
            Self::Export(ExportFormat::Txt) => ".txt",
            Self::Export(ExportFormat::Docx) => ".docx",
            Self::Export(ExportFormat::Pdf) => ".pdf",
        }
    }
}

/// Runs the export behind a pill; `None` for the native format.
pub async fn activate_pill<B: HostBridge>(session: &Session<B>, pill: Pill) -> Option<Outcome> {
    match pill {
        Pill::Markdown => None,
        Pill::Export(format) => Some(session.export_as(format).await),
    }
}
