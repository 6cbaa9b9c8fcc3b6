/// Transient notification shown as a toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "toast success",
            NoticeKind::Error => "toast error",
        }
    }
}

/// Toasts currently on screen, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoticeQueue {
    next_id: u64,
    items: Vec<(u64, Notice)>,
}

impl NoticeQueue {
    pub fn push(&mut self, notice: Notice) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push((id, notice));
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|(existing, _)| *existing != id);
    }

    pub fn items(&self) -> &[(u64, Notice)] {
        &self.items
    }
}
