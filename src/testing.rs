//! Scripted [`HostBridge`] for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::bridge::{BridgeError, Confirm, DirEntry, ExportFormat, FileFilter, HostBridge};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Read(String),
    Write { path: String, content: String },
    WriteDone,
    Create(String),
    List(String),
    Export {
        format: ExportFormat,
        markdown: String,
        path: String,
    },
    PickFile,
    PickFolder,
    PickSave {
        filters: Vec<String>,
        default_path: String,
    },
    Confirm,
}

pub struct FakeBridge {
    files: RefCell<HashMap<String, String>>,
    dirs: RefCell<HashMap<String, Vec<DirEntry>>>,
    picks: RefCell<VecDeque<Option<String>>>,
    calls: RefCell<Vec<Call>>,
    pub confirm_answer: Cell<bool>,
    pub fail_confirm: Cell<bool>,
    pub fail_writes: Cell<bool>,
    pub fail_exports: Cell<bool>,
    /// Makes each write yield once before completing.
    pub slow_writes: Cell<bool>,
}

impl Default for FakeBridge {
    fn default() -> Self {
        Self {
            files: RefCell::default(),
            dirs: RefCell::default(),
            picks: RefCell::default(),
            calls: RefCell::default(),
            confirm_answer: Cell::new(true),
            fail_confirm: Cell::new(false),
            fail_writes: Cell::new(false),
            fail_exports: Cell::new(false),
            slow_writes: Cell::new(false),
        }
    }
}

impl FakeBridge {
    /// Answer for the next file, folder or save dialog.
    pub fn queue_pick(&self, pick: Option<&str>) {
        self.picks.borrow_mut().push_back(pick.map(str::to_string));
    }

    pub fn put_file(&self, path: &str, content: &str) {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
    }

    pub fn put_dir(&self, path: &str, entries: Vec<DirEntry>) {
        self.dirs.borrow_mut().insert(path.to_string(), entries);
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn next_pick(&self) -> Option<String> {
        self.picks.borrow_mut().pop_front().flatten()
    }
}

impl HostBridge for FakeBridge {
    async fn read_file(&self, path: &str) -> Result<String, BridgeError> {
        self.record(Call::Read(path.to_string()));
        self.file(path)
            .ok_or_else(|| BridgeError::host("read_file", "Failed to read file: not found"))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), BridgeError> {
        self.record(Call::Write {
            path: path.to_string(),
            content: content.to_string(),
        });
        if self.slow_writes.get() {
            YieldOnce(false).await;
        }
        self.record(Call::WriteDone);
        if self.fail_writes.get() {
            return Err(BridgeError::host("write_file", "Failed to write file: disk full"));
        }
        self.put_file(path, content);
        Ok(())
    }

    async fn create_file(&self, path: &str) -> Result<(), BridgeError> {
        self.record(Call::Create(path.to_string()));
        if self.fail_writes.get() {
            return Err(BridgeError::host("create_file", "Failed to create file: read-only"));
        }
        self.put_file(path, "");
        Ok(())
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, BridgeError> {
        self.record(Call::List(path.to_string()));
        self.dirs
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::host("list_directory", "Failed to read directory: gone"))
    }

    async fn export(
        &self,
        format: ExportFormat,
        markdown: &str,
        path: &str,
    ) -> Result<(), BridgeError> {
        self.record(Call::Export {
            format,
            markdown: markdown.to_string(),
            path: path.to_string(),
        });
        if self.fail_exports.get() {
            return Err(BridgeError::host("export", "No suitable font found"));
        }
        Ok(())
    }

    async fn pick_file(&self, _filters: &[FileFilter]) -> Result<Option<String>, BridgeError> {
        self.record(Call::PickFile);
        Ok(self.next_pick())
    }

    async fn pick_folder(&self) -> Result<Option<String>, BridgeError> {
        self.record(Call::PickFolder);
        Ok(self.next_pick())
    }

    async fn pick_save_path(
        &self,
        filters: &[FileFilter],
        default_path: &str,
    ) -> Result<Option<String>, BridgeError> {
        self.record(Call::PickSave {
            filters: filters.iter().map(|f| f.name.clone()).collect(),
            default_path: default_path.to_string(),
        });
        Ok(self.next_pick())
    }

    async fn confirm(&self, _prompt: &Confirm) -> Result<bool, BridgeError> {
        self.record(Call::Confirm);
        if self.fail_confirm.get() {
            return Err(BridgeError::host("confirm", "dialog unavailable"));
        }
        Ok(self.confirm_answer.get())
    }
}

struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
