//! Application state: the open document, the file behind it and the sidebar
//! tree, plus the file operations that move between them.
//!
//! The UI owns one `Rc<Session<_>>`. Nothing here is global, so tests build
//! as many sessions as they like over a scripted bridge.

mod sidebar;

use std::cell::RefCell;

use futures::lock::Mutex;

use crate::bridge::{BridgeError, Confirm, ExportFormat, HostBridge};
use crate::document::{utf16_to_byte, ApplyOutcome, Document, DocumentError, Selection};
use crate::events::{EventHub, SubscriptionId};
use crate::file_state::{
    document_filters, export_default_path, export_filters, file_name, FileFormat, FileRef,
    UNTITLED,
};
use crate::notice::Notice;
use crate::status::StatusLine;
use crate::tree::TreeModel;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    TitleChanged(String),
    DirtyChanged(bool),
    FormatChanged(FileFormat),
    Notice(Notice),
    TreeChanged,
}

/// How a file operation ended. Failures have already been reported as a
/// notice by the time the caller sees `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
    Failed,
}

pub struct Session<B> {
    bridge: B,
    document: RefCell<Document>,
    file: RefCell<FileRef>,
    tree: RefCell<TreeModel>,
    document_events: EventHub<ApplyOutcome>,
    events: EventHub<SessionEvent>,
    // Held for the whole of open/save/save-as/new/export/select so they run
    // one after another in the order they were issued.
    file_ops: Mutex<()>,
}

impl<B: HostBridge> Session<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            document: RefCell::new(Document::default()),
            file: RefCell::new(FileRef::default()),
            tree: RefCell::new(TreeModel::default()),
            document_events: EventHub::new(),
            events: EventHub::new(),
            file_ops: Mutex::new(()),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Listens to every document change, text or selection.
    pub fn subscribe_document(&self, listener: impl FnMut(&ApplyOutcome) + 'static) -> SubscriptionId {
        self.document_events.subscribe(listener)
    }

    pub fn unsubscribe_document(&self, id: SubscriptionId) -> bool {
        self.document_events.unsubscribe(id)
    }

    pub fn subscribe(&self, listener: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // Document

    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.document.borrow())
    }

    pub fn content(&self) -> String {
        self.document.borrow().text().to_string()
    }

    pub fn status(&self) -> StatusLine {
        StatusLine::from_document(&self.document.borrow())
    }

    /// Replaces the buffer. This marks the file dirty like any other edit;
    /// loaders clear the flag afterwards.
    pub fn set_content(&self, text: &str) -> bool {
        self.edit(|doc| doc.set_content(text))
    }

    /// Text and UTF-16 selection reported by the textarea after an input
    /// event. `head` is the caret end of the selection.
    pub fn input(&self, text: String, anchor: u32, head: u32) -> bool {
        let selection = Selection::new(
            utf16_to_byte(&text, anchor as usize),
            utf16_to_byte(&text, head as usize),
        );
        self.edit(|doc| Ok(doc.replace_from_input(text, selection)))
    }

    pub fn select_utf16(&self, anchor: u32, head: u32) -> bool {
        self.edit(|doc| {
            let selection = Selection::new(
                utf16_to_byte(doc.text(), anchor as usize),
                utf16_to_byte(doc.text(), head as usize),
            );
            Ok(doc.set_selection(selection))
        })
    }

    pub fn set_selection(&self, selection: Selection) -> bool {
        self.edit(|doc| Ok(doc.set_selection(selection)))
    }

    pub fn insert_markdown(&self, before: &str, after: &str) -> bool {
        self.edit(|doc| doc.insert_markdown(before, after))
    }

    pub fn insert_line_prefix(&self, prefix: &str) -> bool {
        self.edit(|doc| doc.insert_line_prefix(prefix))
    }

    pub fn insert_block(&self, block: &str) -> bool {
        self.edit(|doc| doc.insert_block(block))
    }

    pub fn undo(&self) -> bool {
        let outcome = self.document.borrow_mut().undo();
        outcome.map(|outcome| self.publish(&outcome)).is_some()
    }

    pub fn redo(&self) -> bool {
        let outcome = self.document.borrow_mut().redo();
        outcome.map(|outcome| self.publish(&outcome)).is_some()
    }

    fn edit(&self, f: impl FnOnce(&mut Document) -> Result<ApplyOutcome, DocumentError>) -> bool {
        let result = f(&mut self.document.borrow_mut());
        match result {
            Ok(outcome) => {
                self.publish(&outcome);
                outcome.changed()
            }
            Err(err) => {
                tracing::warn!(%err, "document edit rejected");
                false
            }
        }
    }

    fn publish(&self, outcome: &ApplyOutcome) {
        if outcome.text_changed {
            self.set_dirty(true);
        }
        if outcome.changed() {
            self.document_events.emit(outcome);
        }
    }

    // File reference

    pub fn file(&self) -> FileRef {
        self.file.borrow().clone()
    }

    pub fn path(&self) -> Option<String> {
        self.file.borrow().path.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.file.borrow().dirty
    }

    pub fn title(&self) -> String {
        self.file.borrow().title()
    }

    /// Loads the startup document without a backing file. Skipped once the
    /// buffer has been edited or a file opened.
    pub fn load_welcome(&self, text: &str) -> bool {
        let untouched = self.document.borrow().revision() == 0 && self.path().is_none();
        if untouched {
            self.load_document(None, text);
        }
        untouched
    }

    fn set_dirty(&self, dirty: bool) {
        let changed = {
            let mut file = self.file.borrow_mut();
            let changed = file.dirty != dirty;
            file.dirty = dirty;
            changed
        };
        if changed {
            self.events.emit(&SessionEvent::DirtyChanged(dirty));
        }
    }

    /// Clears the dirty flag unless the buffer moved past `revision` while a
    /// write was in flight.
    fn mark_clean_at(&self, revision: u64) {
        let current = self.document.borrow().revision();
        self.set_dirty(current != revision);
    }

    fn adopt_path(&self, path: Option<String>) {
        let (title, format) = {
            let mut file = self.file.borrow_mut();
            file.path = path;
            (file.title(), file.format())
        };
        self.events.emit(&SessionEvent::TitleChanged(title));
        self.events.emit(&SessionEvent::FormatChanged(format));
        self.sync_active_node();
    }

    fn sync_active_node(&self) {
        let path = self.path();
        let changed = self.tree.borrow_mut().set_active_path(path.as_deref());
        if changed {
            self.events.emit(&SessionEvent::TreeChanged);
        }
    }

    fn load_document(&self, path: Option<String>, text: &str) {
        self.set_content(text);
        self.document.borrow_mut().clear_history();
        self.adopt_path(path);
        let revision = self.document.borrow().revision();
        self.mark_clean_at(revision);
    }

    fn notify(&self, notice: Notice) {
        self.events.emit(&SessionEvent::Notice(notice));
    }

    fn fail(&self, operation: &str, err: &BridgeError) -> Outcome {
        tracing::warn!(operation, %err, "file operation failed");
        self.notify(Notice::error(format!("{operation}: {err}")));
        Outcome::Failed
    }

    /// Unwraps a dialog result: a pick, a cancel, or a reported failure.
    fn settle<T>(&self, operation: &str, result: Result<Option<T>, BridgeError>) -> Result<T, Outcome> {
        match result {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(Outcome::Cancelled),
            Err(err) => Err(self.fail(operation, &err)),
        }
    }

    /// Asks before unsaved changes are thrown away. Passes straight through
    /// when the buffer is clean.
    async fn discard_gate(&self, operation: &str) -> Result<(), Outcome> {
        if !self.is_dirty() {
            return Ok(());
        }
        match self.bridge.confirm(&Confirm::discard_changes()).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Outcome::Cancelled),
            Err(err) => Err(self.fail(operation, &err)),
        }
    }

    // File operations

    pub async fn open(&self) -> Outcome {
        const OP: &str = "Failed to open file";
        let _guard = self.file_ops.lock().await;
        if let Err(outcome) = self.discard_gate(OP).await {
            return outcome;
        }
        let picked = self.bridge.pick_file(&document_filters()).await;
        let path = match self.settle(OP, picked) {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };
        match self.bridge.read_file(&path).await {
            Ok(text) => {
                tracing::info!(%path, "opened file");
                self.load_document(Some(path), &text);
                Outcome::Completed
            }
            Err(err) => self.fail(OP, &err),
        }
    }

    pub async fn save(&self) -> Outcome {
        let _guard = self.file_ops.lock().await;
        match self.path() {
            Some(path) => self.write_to(path, false).await,
            None => self.save_as_locked().await,
        }
    }

    pub async fn save_as(&self) -> Outcome {
        let _guard = self.file_ops.lock().await;
        self.save_as_locked().await
    }

    pub async fn new_file(&self) -> Outcome {
        let _guard = self.file_ops.lock().await;
        if let Err(outcome) = self.discard_gate("Failed to create document").await {
            return outcome;
        }
        self.load_document(None, "");
        Outcome::Completed
    }

    /// Writes a converted copy of the buffer. The open file's path and dirty
    /// flag are left alone.
    pub async fn export_as(&self, format: ExportFormat) -> Outcome {
        const OP: &str = "Export failed";
        let _guard = self.file_ops.lock().await;
        let picked = self
            .bridge
            .pick_save_path(&export_filters(format), &export_default_path(format))
            .await;
        let path = match self.settle(OP, picked) {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };
        let markdown = self.content();
        match self.bridge.export(format, &markdown, &path).await {
            Ok(()) => {
                tracing::info!(%path, ?format, "exported document");
                self.notify(Notice::success(format!("Exported to {}", file_name(&path))));
                Outcome::Completed
            }
            Err(err) => self.fail(OP, &err),
        }
    }

    async fn save_as_locked(&self) -> Outcome {
        let default_path = self.path().unwrap_or_else(|| UNTITLED.to_string());
        let picked = self
            .bridge
            .pick_save_path(&document_filters(), &default_path)
            .await;
        match self.settle("Failed to save file", picked) {
            Ok(path) => self.write_to(path, true).await,
            Err(outcome) => outcome,
        }
    }

    async fn write_to(&self, path: String, adopt: bool) -> Outcome {
        let (content, revision) = {
            let doc = self.document.borrow();
            (doc.text().to_string(), doc.revision())
        };
        match self.bridge.write_file(&path, &content).await {
            Ok(()) => {
                tracing::info!(%path, bytes = content.len(), "saved file");
                if adopt {
                    self.adopt_path(Some(path));
                } else {
                    self.events.emit(&SessionEvent::TitleChanged(self.title()));
                }
                self.mark_clean_at(revision);
                Outcome::Completed
            }
            Err(err) => self.fail("Failed to save file", &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::testing::{Call, FakeBridge};

    fn session() -> Session<FakeBridge> {
        Session::new(FakeBridge::default())
    }

    fn recorded_events(session: &Session<FakeBridge>) -> Rc<RefCell<Vec<SessionEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    fn notices(events: &RefCell<Vec<SessionEvent>>) -> Vec<Notice> {
        events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn any_text_edit_marks_dirty() {
        let session = session();
        assert!(!session.is_dirty());
        session.set_content("typed");
        assert!(session.is_dirty());
    }

    #[test]
    fn selection_only_changes_keep_clean() {
        let session = session();
        session.load_welcome("hello");
        session.set_selection(Selection::new(0, 2));
        assert!(!session.is_dirty());
    }

    #[test]
    fn welcome_never_replaces_early_edits() {
        let session = session();
        session.set_content("typed before settings arrived");

        assert!(!session.load_welcome("# Welcome"));
        assert_eq!(session.content(), "typed before settings arrived");
        assert!(session.is_dirty());

        let fresh = Session::new(FakeBridge::default());
        assert!(fresh.load_welcome("# Welcome"));
        assert_eq!(fresh.content(), "# Welcome");
        assert!(!fresh.is_dirty());
    }

    #[test]
    fn status_reports_head_of_backward_selection() {
        let session = session();
        session.load_welcome("abcdef");
        session.select_utf16(5, 1);
        assert_eq!(session.status().position_label(), "Ln 1, Col 2");

        session.input("abcdefg".into(), 2, 7);
        assert_eq!(session.status().position_label(), "Ln 1, Col 8");
    }

    #[test]
    fn document_listeners_run_in_order_and_can_unsubscribe() {
        let session = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = {
            let seen = Rc::clone(&seen);
            session.subscribe_document(move |o| seen.borrow_mut().push(("first", o.text_changed)))
        };
        {
            let seen = Rc::clone(&seen);
            session.subscribe_document(move |o| seen.borrow_mut().push(("second", o.text_changed)));
        }

        session.set_content("a");
        assert!(session.unsubscribe_document(first));
        session.set_selection(Selection::cursor(0));

        assert_eq!(
            *seen.borrow(),
            vec![("first", true), ("second", true), ("second", false)]
        );
    }

    #[test]
    fn save_clears_dirty_and_next_edit_sets_it() {
        let session = session();
        session.bridge().queue_pick(Some("/n/a.md"));
        session.set_content("draft");

        assert_eq!(block_on(session.save()), Outcome::Completed);
        assert!(!session.is_dirty());
        assert_eq!(session.path().as_deref(), Some("/n/a.md"));
        assert_eq!(session.bridge().file("/n/a.md").as_deref(), Some("draft"));

        session.insert_line_prefix("# ");
        assert!(session.is_dirty());

        assert_eq!(block_on(session.save()), Outcome::Completed);
        assert_eq!(session.bridge().file("/n/a.md").as_deref(), Some("# draft"));
        assert_eq!(
            session.bridge().count(|call| matches!(call, Call::PickSave { .. })),
            1
        );
    }

    #[test]
    fn save_as_defaults_to_current_path_or_untitled() {
        let session = session();
        session.bridge().queue_pick(Some("/n/one.md"));
        block_on(session.save_as());
        session.bridge().queue_pick(None);
        assert_eq!(block_on(session.save_as()), Outcome::Cancelled);

        let defaults: Vec<_> = session
            .bridge()
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PickSave { default_path, .. } => Some(default_path),
                _ => None,
            })
            .collect();
        assert_eq!(defaults, vec!["untitled.md", "/n/one.md"]);
    }

    #[test]
    fn failed_save_keeps_dirty_and_reports() {
        let session = session();
        let events = recorded_events(&session);
        session.bridge().queue_pick(Some("/n/a.md"));
        session.bridge().fail_writes.set(true);
        session.set_content("draft");

        assert_eq!(block_on(session.save()), Outcome::Failed);
        assert!(session.is_dirty());
        assert_eq!(session.path(), None);
        assert_eq!(
            notices(&events),
            vec![Notice::error("Failed to save file: Failed to write file: disk full")]
        );
    }

    #[test]
    fn edits_during_a_save_stay_dirty() {
        let session = session();
        session.bridge().queue_pick(Some("/n/a.md"));
        block_on(session.save());
        session.set_content("v1");
        session.bridge().slow_writes.set(true);

        block_on(async {
            futures::join!(session.save(), async {
                session.set_content("v2");
            });
        });

        assert_eq!(session.bridge().file("/n/a.md").as_deref(), Some("v1"));
        assert!(session.is_dirty());
    }

    #[test]
    fn file_operations_run_one_at_a_time() {
        let session = session();
        session.bridge().queue_pick(Some("/n/a.md"));
        block_on(session.save());
        session.set_content("body");
        session.bridge().slow_writes.set(true);
        session.bridge().queue_pick(Some("/n/out.txt"));

        let (saved, exported) = block_on(async {
            futures::join!(session.save(), session.export_as(ExportFormat::Txt))
        });

        assert_eq!((saved, exported), (Outcome::Completed, Outcome::Completed));
        let tail: Vec<_> = session.bridge().calls().into_iter().skip(3).collect();
        assert!(matches!(
            tail.as_slice(),
            [Call::Write { .. }, Call::WriteDone, Call::PickSave { .. }, Call::Export { .. }]
        ));
    }

    #[test]
    fn declined_open_changes_nothing() {
        let session = session();
        session.set_content("unsaved work");
        session.bridge().confirm_answer.set(false);
        session.bridge().put_file("/n/other.md", "other");
        session.bridge().queue_pick(Some("/n/other.md"));

        assert_eq!(block_on(session.open()), Outcome::Cancelled);
        assert_eq!(session.content(), "unsaved work");
        assert_eq!(session.path(), None);
        assert!(session.is_dirty());
        assert_eq!(session.bridge().count(|c| matches!(c, Call::PickFile)), 0);
    }

    #[test]
    fn open_loads_clean_and_announces_title() {
        let session = session();
        let events = recorded_events(&session);
        session.set_content("scratch");
        session.bridge().put_file("/n/todo.txt", "- milk");
        session.bridge().queue_pick(Some("/n/todo.txt"));

        assert_eq!(block_on(session.open()), Outcome::Completed);
        assert_eq!(session.content(), "- milk");
        assert!(!session.is_dirty());
        assert_eq!(session.bridge().count(|c| matches!(c, Call::Confirm)), 1);
        let events = events.borrow();
        assert!(events.contains(&SessionEvent::TitleChanged("todo.txt".into())));
        assert!(events.contains(&SessionEvent::FormatChanged(FileFormat::PlainText)));
        assert_eq!(events.last(), Some(&SessionEvent::DirtyChanged(false)));
    }

    #[test]
    fn loaded_file_cannot_be_undone_away() {
        let session = session();
        session.bridge().put_file("/n/a.md", "from disk");
        session.bridge().queue_pick(Some("/n/a.md"));
        block_on(session.open());

        assert!(!session.undo());
        assert_eq!(session.content(), "from disk");
    }

    #[test]
    fn failed_read_leaves_state_untouched() {
        let session = session();
        let events = recorded_events(&session);
        session.set_content("mine");
        session.bridge().queue_pick(Some("/n/missing.md"));

        assert_eq!(block_on(session.open()), Outcome::Failed);
        assert_eq!(session.content(), "mine");
        assert!(session.is_dirty());
        assert_eq!(notices(&events).len(), 1);
        assert!(notices(&events)[0].message.starts_with("Failed to open file: "));
    }

    #[test]
    fn cancelled_pick_is_silent() {
        let session = session();
        let events = recorded_events(&session);
        session.bridge().queue_pick(None);

        assert_eq!(block_on(session.open()), Outcome::Cancelled);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn declined_new_file_keeps_everything() {
        let session = session();
        session.bridge().queue_pick(Some("/n/a.md"));
        session.set_content("old");
        block_on(session.save());
        session.set_content("changed");
        session.bridge().confirm_answer.set(false);

        assert_eq!(block_on(session.new_file()), Outcome::Cancelled);
        assert_eq!(session.content(), "changed");
        assert_eq!(session.path().as_deref(), Some("/n/a.md"));
        assert!(session.is_dirty());
    }

    #[test]
    fn failed_confirm_aborts_the_operation() {
        let session = session();
        let events = recorded_events(&session);
        session.set_content("draft");
        session.bridge().fail_confirm.set(true);

        assert_eq!(block_on(session.open()), Outcome::Failed);
        assert_eq!(session.bridge().count(|c| matches!(c, Call::PickFile)), 0);
        assert_eq!(session.content(), "draft");
        assert!(session.is_dirty());
        assert_eq!(
            notices(&events),
            vec![Notice::error("Failed to open file: dialog unavailable")]
        );
    }

    #[test]
    fn cancelled_export_is_silent() {
        let session = session();
        session.set_content("# Title");
        let events = recorded_events(&session);
        let before = session.file();
        session.bridge().queue_pick(None);

        assert_eq!(block_on(session.export_as(ExportFormat::Txt)), Outcome::Cancelled);
        assert_eq!(session.file(), before);
        assert_eq!(session.bridge().count(|c| matches!(c, Call::Export { .. })), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn new_file_resets_after_confirmation() {
        let session = session();
        session.bridge().queue_pick(Some("/n/a.md"));
        session.set_content("old");
        block_on(session.save());
        session.set_content("changed");

        assert_eq!(block_on(session.new_file()), Outcome::Completed);
        assert_eq!(session.content(), "");
        assert_eq!(session.file(), FileRef::default());
        assert_eq!(session.title(), UNTITLED);
    }

    #[test]
    fn export_passes_markdown_through_and_leaves_file_alone() {
        let session = session();
        let events = recorded_events(&session);
        session.set_content("# Title");
        session.bridge().queue_pick(Some("/out/report.docx"));
        let before = session.file();

        assert_eq!(block_on(session.export_as(ExportFormat::Docx)), Outcome::Completed);
        assert_eq!(session.file(), before);
        assert!(session.bridge().calls().contains(&Call::Export {
            format: ExportFormat::Docx,
            markdown: "# Title".into(),
            path: "/out/report.docx".into(),
        }));
        assert!(session.bridge().calls().contains(&Call::PickSave {
            filters: vec!["DOCX".into()],
            default_path: "export.docx".into(),
        }));
        assert_eq!(notices(&events), vec![Notice::success("Exported to report.docx")]);
    }

    #[test]
    fn failed_export_is_reported() {
        let session = session();
        let events = recorded_events(&session);
        session.bridge().fail_exports.set(true);
        session.bridge().queue_pick(Some("/out/x.pdf"));

        assert_eq!(block_on(session.export_as(ExportFormat::Pdf)), Outcome::Failed);
        assert_eq!(
            notices(&events),
            vec![Notice::error("Export failed: No suitable font found")]
        );
    }
}
