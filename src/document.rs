//! Text buffer behind the editor surface.
//!
//! Offsets are byte offsets into the buffer and always sit on char
//! boundaries. The textarea speaks UTF-16, so conversion helpers live here
//! too.

use thiserror::Error;

/// Placeholder inserted (and selected) when wrapping an empty selection.
pub const PLACEHOLDER: &str = "text";

const HISTORY_LIMIT: usize = 200;

/// A selected range, `start <= end`. `backward` records that the head (the
/// end that moves) sits at `start`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    backward: bool,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self {
            start: anchor.min(head),
            end: anchor.max(head),
            backward: head < anchor,
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_cursor(self) -> bool {
        self.start == self.end
    }

    pub fn is_backward(self) -> bool {
        self.backward
    }

    pub fn anchor(self) -> usize {
        if self.backward {
            self.end
        } else {
            self.start
        }
    }

    /// The moving end of the selection, where the caret is drawn.
    pub fn head(self) -> usize {
        if self.backward {
            self.start
        } else {
            self.end
        }
    }

    fn snap(self, text: &str) -> Self {
        Self::new(floor_boundary(text, self.anchor()), floor_boundary(text, self.head()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub start: usize,
    pub end: usize,
    pub insert: String,
}

impl TextChange {
    pub fn new(start: usize, end: usize, insert: impl Into<String>) -> Self {
        Self {
            start,
            end,
            insert: insert.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChangeOrigin {
    /// Typed into the textarea; the surface already shows the result.
    Input,
    /// Toolbar or history command; the surface must be refreshed and focused.
    Command,
    /// Programmatic replacement such as loading a file.
    #[default]
    System,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub changes: Vec<TextChange>,
    pub selection_after: Option<Selection>,
    pub origin: ChangeOrigin,
    pub label: &'static str,
}

impl Transaction {
    pub fn single(
        change: TextChange,
        selection_after: Option<Selection>,
        origin: ChangeOrigin,
        label: &'static str,
    ) -> Self {
        Self {
            changes: vec![change],
            selection_after,
            origin,
            label,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub text_changed: bool,
    pub selection_changed: bool,
    pub revision: u64,
    pub origin: ChangeOrigin,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        self.text_changed || self.selection_changed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("range {start}..{end} is invalid for a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("change {next_start}..{next_end} overlaps {first_start}..{first_end}")]
    OverlappingChanges {
        first_start: usize,
        first_end: usize,
        next_start: usize,
        next_end: usize,
    },
}

/// 1-based cursor position; `col` counts UTF-16 code units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorInfo {
    pub line: usize,
    pub col: usize,
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    text: String,
    selection: Selection,
}

#[derive(Clone, Debug)]
pub struct Document {
    text: String,
    selection: Selection,
    revision: u64,
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selection: Selection::cursor(0),
            revision: 0,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selected_text(&self) -> &str {
        &self.text[self.selection.start..self.selection.end]
    }

    pub fn set_selection(&mut self, selection: Selection) -> ApplyOutcome {
        let next = selection.snap(&self.text);
        let selection_changed = self.selection != next;
        self.selection = next;
        ApplyOutcome {
            text_changed: false,
            selection_changed,
            revision: self.revision,
            origin: ChangeOrigin::Input,
        }
    }

    /// Replaces the whole buffer in one transaction. Full replacement is fine
    /// for hand-written notes; no diffing is attempted.
    pub fn set_content(&mut self, text: impl Into<String>) -> Result<ApplyOutcome, DocumentError> {
        let text = text.into();
        let end = text.len();
        self.apply(Transaction::single(
            TextChange::new(0, self.text.len(), text),
            Some(Selection::cursor(end)),
            ChangeOrigin::System,
            "set-content",
        ))
    }

    pub fn replace_from_input(&mut self, new_text: String, selection: Selection) -> ApplyOutcome {
        let next_selection = selection.snap(&new_text);
        let text_changed = self.text != new_text;
        let selection_changed = self.selection != next_selection;

        if text_changed {
            self.record_history();
            self.text = new_text;
            self.revision += 1;
        }
        self.selection = next_selection;

        ApplyOutcome {
            text_changed,
            selection_changed,
            revision: self.revision,
            origin: ChangeOrigin::Input,
        }
    }

    pub fn apply(&mut self, transaction: Transaction) -> Result<ApplyOutcome, DocumentError> {
        let normalized = normalize_changes(&self.text, &transaction.changes)?;
        let next_text = if normalized.is_empty() {
            self.text.clone()
        } else {
            apply_changes_to_text(&self.text, &normalized)
        };

        let next_selection = transaction
            .selection_after
            .unwrap_or_else(|| {
                Selection::new(
                    map_position_through_changes(self.selection.anchor(), &normalized),
                    map_position_through_changes(self.selection.head(), &normalized),
                )
            })
            .snap(&next_text);

        let text_changed = self.text != next_text;
        let selection_changed = self.selection != next_selection;

        if text_changed {
            self.record_history();
            self.text = next_text;
            self.revision += 1;
        }
        self.selection = next_selection;

        Ok(ApplyOutcome {
            text_changed,
            selection_changed,
            revision: self.revision,
            origin: transaction.origin,
        })
    }

    /// Wraps the selection in `before`/`after`, keeping the wrapped span
    /// selected. An empty selection gets [`PLACEHOLDER`] selected instead, so
    /// typing replaces it.
    pub fn insert_markdown(&mut self, before: &str, after: &str) -> Result<ApplyOutcome, DocumentError> {
        let selection = self.selection;
        let body = if selection.is_cursor() {
            PLACEHOLDER
        } else {
            self.selected_text()
        };
        let insert = format!("{before}{body}{after}");
        let anchor = selection.start + before.len();
        let selection_after = Selection::new(anchor, anchor + body.len());
        self.apply(Transaction::single(
            TextChange::new(selection.start, selection.end, insert),
            Some(selection_after),
            ChangeOrigin::Command,
            "insert-markdown",
        ))
    }

    /// Inserts `prefix` at the start of the cursor line. Calls stack; there is
    /// no toggling.
    pub fn insert_line_prefix(&mut self, prefix: &str) -> Result<ApplyOutcome, DocumentError> {
        let start = line_start(&self.text, self.selection.head());
        self.apply(Transaction::single(
            TextChange::new(start, start, prefix),
            None,
            ChangeOrigin::Command,
            "insert-line-prefix",
        ))
    }

    /// Inserts `block` at the cursor so that it occupies its own line.
    pub fn insert_block(&mut self, block: &str) -> Result<ApplyOutcome, DocumentError> {
        let pos = self.selection.head();
        let mut insert = String::new();
        if pos != line_start(&self.text, pos) {
            insert.push('\n');
        }
        insert.push_str(block);
        insert.push('\n');
        let caret = pos + insert.len();
        self.apply(Transaction::single(
            TextChange::new(pos, pos, insert),
            Some(Selection::cursor(caret)),
            ChangeOrigin::Command,
            "insert-block",
        ))
    }

    pub fn undo(&mut self) -> Option<ApplyOutcome> {
        let entry = self.undo.pop()?;
        let current = self.swap_in(entry);
        self.redo.push(current);
        Some(self.history_outcome())
    }

    pub fn redo(&mut self) -> Option<ApplyOutcome> {
        let entry = self.redo.pop()?;
        let current = self.swap_in(entry);
        self.undo.push(current);
        Some(self.history_outcome())
    }

    pub fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn cursor_info(&self) -> CursorInfo {
        let head = self.selection.head();
        let start = line_start(&self.text, head);
        CursorInfo {
            line: self.text[..start].matches('\n').count() + 1,
            col: self.text[start..head].encode_utf16().count() + 1,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Length in UTF-16 code units, matching what the webview reports.
    pub fn char_count(&self) -> usize {
        self.text.encode_utf16().count()
    }

    /// Selection as UTF-16 `(start, end)`, in document order.
    pub fn selection_utf16(&self) -> (u32, u32) {
        (
            byte_to_utf16(&self.text, self.selection.start) as u32,
            byte_to_utf16(&self.text, self.selection.end) as u32,
        )
    }

    fn record_history(&mut self) {
        if self.undo.len() == HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.undo.push(HistoryEntry {
            text: self.text.clone(),
            selection: self.selection,
        });
        self.redo.clear();
    }

    fn swap_in(&mut self, entry: HistoryEntry) -> HistoryEntry {
        let previous = HistoryEntry {
            text: std::mem::replace(&mut self.text, entry.text),
            selection: self.selection,
        };
        self.selection = entry.selection.snap(&self.text);
        self.revision += 1;
        previous
    }

    fn history_outcome(&self) -> ApplyOutcome {
        ApplyOutcome {
            text_changed: true,
            selection_changed: true,
            revision: self.revision,
            origin: ChangeOrigin::Command,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Maps a UTF-16 offset (as reported by the textarea) to a byte offset.
/// Offsets inside a surrogate pair round down; offsets past the end clamp.
pub fn utf16_to_byte(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        let next = units + ch.len_utf16();
        if next > offset {
            return idx;
        }
        units = next;
    }
    text.len()
}

pub fn byte_to_utf16(text: &str, offset: usize) -> usize {
    text[..floor_boundary(text, offset)].encode_utf16().count()
}

fn floor_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn normalize_changes(text: &str, changes: &[TextChange]) -> Result<Vec<TextChange>, DocumentError> {
    let len = text.len();
    let mut sorted = changes.to_vec();
    sorted.sort_by_key(|change| (change.start, change.end));

    for change in &sorted {
        let on_boundaries =
            text.is_char_boundary(change.start.min(len)) && text.is_char_boundary(change.end.min(len));
        if change.start > change.end || change.end > len || !on_boundaries {
            return Err(DocumentError::InvalidRange {
                start: change.start,
                end: change.end,
                len,
            });
        }
    }

    for pair in sorted.windows(2) {
        let first = &pair[0];
        let next = &pair[1];
        if next.start < first.end {
            return Err(DocumentError::OverlappingChanges {
                first_start: first.start,
                first_end: first.end,
                next_start: next.start,
                next_end: next.end,
            });
        }
    }

    Ok(sorted)
}

fn apply_changes_to_text(text: &str, changes: &[TextChange]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for change in changes {
        out.push_str(&text[cursor..change.start]);
        out.push_str(&change.insert);
        cursor = change.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn map_position_through_changes(pos: usize, changes: &[TextChange]) -> usize {
    let mut shift: isize = 0;
    for change in changes {
        if pos < change.start {
            break;
        }
        let removed = (change.end - change.start) as isize;
        let inserted = change.insert.len() as isize;
        if pos <= change.end {
            return (change.start as isize + shift + inserted) as usize;
        }
        shift += inserted - removed;
    }
    (pos as isize + shift) as usize
}

fn line_start(text: &str, pos: usize) -> usize {
    let clamped = floor_boundary(text, pos);
    text[..clamped].rfind('\n').map(|i| i + 1).unwrap_or(0)
}
