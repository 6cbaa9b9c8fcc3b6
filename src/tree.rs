//! Sidebar tree as data.
//!
//! Children of a directory are fetched lazily, once, on first expansion and
//! stay cached until the folder is reloaded. Rendering only ever sees the
//! flattened [`TreeRow`]s.

use crate::bridge::DirEntry;

/// Rows deeper than this are indented like this level.
pub const MAX_INDENT: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Children {
    Unloaded,
    Loading,
    Loaded(Vec<NodeId>),
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub entry: DirEntry,
    pub depth: usize,
    pub expanded: bool,
    children: Children,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TreeStatus {
    #[default]
    NoFolder,
    Loading,
    Ready,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub depth: usize,
    pub indent: usize,
    pub expanded: bool,
    pub active: bool,
}

/// What a toggle asks the caller to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Toggle {
    Collapsed,
    Expanded,
    /// Expanded for the first time; list `path` and hand the result to
    /// [`TreeModel::attach_children`].
    Fetch { path: String, generation: u64 },
    NotADirectory,
}

#[derive(Clone, Debug, Default)]
pub struct TreeModel {
    root: Option<String>,
    status: TreeStatus,
    generation: u64,
    nodes: Vec<TreeNode>,
    top: Vec<NodeId>,
    active: Option<NodeId>,
    filter: String,
}

impl TreeModel {
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn status(&self) -> TreeStatus {
        self.status
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Drops the current tree and starts loading `root`. Returns the
    /// generation that results must carry to be accepted.
    pub fn begin_load(&mut self, root: String) -> u64 {
        self.generation += 1;
        self.root = Some(root);
        self.status = TreeStatus::Loading;
        self.nodes.clear();
        self.top.clear();
        self.active = None;
        self.generation
    }

    pub fn finish_load(&mut self, generation: u64, entries: Vec<DirEntry>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.top = self.push_nodes(entries, 0);
        self.status = TreeStatus::Ready;
        true
    }

    pub fn fail_load(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.status = TreeStatus::Failed;
        true
    }

    pub fn toggle(&mut self, id: NodeId) -> Option<Toggle> {
        let generation = self.generation;
        let node = self.nodes.get_mut(id.0)?;
        if !node.entry.is_dir {
            return Some(Toggle::NotADirectory);
        }
        if node.expanded {
            node.expanded = false;
            return Some(Toggle::Collapsed);
        }
        node.expanded = true;
        if node.children == Children::Unloaded {
            node.children = Children::Loading;
            return Some(Toggle::Fetch {
                path: node.entry.path.clone(),
                generation,
            });
        }
        Some(Toggle::Expanded)
    }

    pub fn attach_children(&mut self, generation: u64, id: NodeId, entries: Vec<DirEntry>) -> bool {
        if generation != self.generation {
            return false;
        }
        let Some(depth) = self.nodes.get(id.0).map(|node| node.depth + 1) else {
            return false;
        };
        let children = self.push_nodes(entries, depth);
        self.nodes[id.0].children = Children::Loaded(children);
        true
    }

    /// Marks a failed child listing; the next expansion fetches again.
    pub fn children_failed(&mut self, generation: u64, id: NodeId) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.children = Children::Unloaded;
                true
            }
            None => false,
        }
    }

    /// Marks the file node with `path` active and every other node inactive.
    /// Returns whether the active node changed.
    pub fn set_active_path(&mut self, path: Option<&str>) -> bool {
        let next = path.and_then(|path| {
            self.nodes
                .iter()
                .position(|node| !node.entry.is_dir && node.entry.path == path)
                .map(NodeId)
        });
        let changed = next != self.active;
        self.active = next;
        changed
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_lowercase();
    }

    /// Visible rows in display order. Rows whose name does not match the
    /// filter are hidden; the children of an expanded directory are still
    /// shown when they match.
    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        self.collect_rows(&self.top, &mut rows);
        rows
    }

    fn collect_rows(&self, ids: &[NodeId], rows: &mut Vec<TreeRow>) {
        for &id in ids {
            let node = &self.nodes[id.0];
            if self.matches(node) {
                rows.push(TreeRow {
                    id,
                    name: node.entry.name.clone(),
                    path: node.entry.path.clone(),
                    is_dir: node.entry.is_dir,
                    depth: node.depth,
                    indent: node.depth.min(MAX_INDENT),
                    expanded: node.expanded,
                    active: self.active == Some(id),
                });
            }
            if let (true, Children::Loaded(children)) = (node.expanded, &node.children) {
                self.collect_rows(children, rows);
            }
        }
    }

    fn matches(&self, node: &TreeNode) -> bool {
        self.filter.is_empty() || node.entry.name.to_lowercase().contains(&self.filter)
    }

    fn push_nodes(&mut self, entries: Vec<DirEntry>, depth: usize) -> Vec<NodeId> {
        entries
            .into_iter()
            .map(|entry| {
                let id = NodeId(self.nodes.len());
                self.nodes.push(TreeNode {
                    entry,
                    depth,
                    expanded: false,
                    children: Children::Unloaded,
                });
                id
            })
            .collect()
    }
}
