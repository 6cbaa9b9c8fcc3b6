use crate::document::{CursorInfo, Document};

/// Snapshot shown in the status bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub cursor: CursorInfo,
    pub words: usize,
    pub chars: usize,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            cursor: CursorInfo { line: 1, col: 1 },
            words: 0,
            chars: 0,
        }
    }
}

impl StatusLine {
    pub fn from_document(document: &Document) -> Self {
        Self {
            cursor: document.cursor_info(),
            words: document.word_count(),
            chars: document.char_count(),
        }
    }

    pub fn position_label(&self) -> String {
        format!("Ln {}, Col {}", self.cursor.line, self.cursor.col)
    }

    pub fn words_label(&self) -> String {
        format!("{} words", self.words)
    }

    pub fn chars_label(&self) -> String {
        format!("{} chars", group_thousands(self.chars))
    }
}

pub fn save_label(dirty: bool) -> &'static str {
    if dirty {
        "Modified"
    } else {
        "Saved"
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Selection;

    #[test]
    fn labels_reflect_document() {
        let mut doc = Document::new("# Title\nsome body text");
        doc.set_selection(Selection::cursor(12));
        let status = StatusLine::from_document(&doc);

        assert_eq!(status.position_label(), "Ln 2, Col 5");
        assert_eq!(status.words_label(), "5 words");
        assert_eq!(status.chars_label(), "22 chars");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn empty_document_defaults() {
        assert_eq!(StatusLine::from_document(&Document::default()), StatusLine::default());
        assert_eq!(save_label(true), "Modified");
    }
}
