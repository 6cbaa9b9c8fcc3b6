use std::path::Path;

use super::{Outcome, Session, SessionEvent};
use crate::bridge::HostBridge;
use crate::notice::Notice;
use crate::tree::{NodeId, Toggle, TreeRow, TreeStatus};

impl<B: HostBridge> Session<B> {
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        self.tree.borrow().rows()
    }

    pub fn tree_status(&self) -> TreeStatus {
        self.tree.borrow().status()
    }

    pub fn active_folder(&self) -> Option<String> {
        self.tree.borrow().root().map(str::to_string)
    }

    pub fn set_filter(&self, query: &str) {
        self.tree.borrow_mut().set_filter(query);
        self.events.emit(&SessionEvent::TreeChanged);
    }

    /// Picks a folder and makes it the tree root, discarding the old tree.
    pub async fn open_folder(&self) -> Outcome {
        let picked = self.bridge.pick_folder().await;
        match self.settle("Failed to open folder", picked) {
            Ok(path) => self.load_folder(path).await,
            Err(outcome) => outcome,
        }
    }

    /// Lists `path` as depth-0 rows. A failed listing shows the empty state
    /// in the tree instead of a notice.
    pub async fn load_folder(&self, path: String) -> Outcome {
        let generation = self.tree.borrow_mut().begin_load(path.clone());
        self.events.emit(&SessionEvent::TreeChanged);

        let listed = self.bridge.list_directory(&path).await;
        let outcome = match listed {
            Ok(entries) => {
                tracing::debug!(%path, entries = entries.len(), "loaded folder");
                self.tree.borrow_mut().finish_load(generation, entries);
                Outcome::Completed
            }
            Err(err) => {
                tracing::warn!(%path, %err, "failed to load folder");
                self.tree.borrow_mut().fail_load(generation);
                Outcome::Failed
            }
        };
        let current = self.path();
        self.tree.borrow_mut().set_active_path(current.as_deref());
        self.events.emit(&SessionEvent::TreeChanged);
        outcome
    }

    /// Expands or collapses a directory row. Children are listed on the
    /// first expansion only.
    pub async fn toggle_dir(&self, id: NodeId) -> Outcome {
        let toggle = self.tree.borrow_mut().toggle(id);
        let (path, generation) = match toggle {
            Some(Toggle::Fetch { path, generation }) => (path, generation),
            Some(Toggle::Collapsed | Toggle::Expanded) => {
                self.events.emit(&SessionEvent::TreeChanged);
                return Outcome::Completed;
            }
            Some(Toggle::NotADirectory) | None => return Outcome::Cancelled,
        };
        self.events.emit(&SessionEvent::TreeChanged);

        let listed = self.bridge.list_directory(&path).await;
        let outcome = match listed {
            Ok(entries) => {
                let attached = self.tree.borrow_mut().attach_children(generation, id, entries);
                if attached {
                    let current = self.path();
                    self.tree.borrow_mut().set_active_path(current.as_deref());
                }
                Outcome::Completed
            }
            Err(err) => {
                self.tree.borrow_mut().children_failed(generation, id);
                self.fail("Failed to expand folder", &err)
            }
        };
        self.events.emit(&SessionEvent::TreeChanged);
        outcome
    }

    /// Opens the file behind a tree row, after the same discard check as
    /// [`Session::open`].
    pub async fn select_file(&self, id: NodeId) -> Outcome {
        const OP: &str = "Failed to open";
        let _guard = self.file_ops.lock().await;
        let entry = match self.tree.borrow().node(id) {
            Some(node) if !node.entry.is_dir => node.entry.clone(),
            _ => return Outcome::Cancelled,
        };
        if let Err(outcome) = self.discard_gate(OP).await {
            return outcome;
        }
        match self.bridge.read_file(&entry.path).await {
            Ok(text) => {
                tracing::info!(path = %entry.path, "opened file from sidebar");
                self.load_document(Some(entry.path), &text);
                Outcome::Completed
            }
            Err(err) => self.fail(OP, &err),
        }
    }

    /// Creates an empty file in the active folder and reloads the tree.
    /// Names without an extension get `.md`.
    pub async fn create_file(&self, name: &str) -> Outcome {
        let Some(folder) = self.active_folder() else {
            return Outcome::Cancelled;
        };
        let name = name.trim();
        if name.is_empty() {
            return Outcome::Cancelled;
        }
        let name = if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{name}.md")
        };
        let path = Path::new(&folder).join(&name).to_string_lossy().into_owned();

        if let Err(err) = self.bridge.create_file(&path).await {
            return self.fail("Failed to create file", &err);
        }
        tracing::info!(%path, "created file");
        self.load_folder(folder).await;
        self.notify(Notice::success(format!("Created {name}")));
        Outcome::Completed
    }
}
