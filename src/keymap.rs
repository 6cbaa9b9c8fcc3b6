use crate::bridge::HostBridge;
use crate::session::{Outcome, Session};

/// Global file shortcuts. `mod` is Ctrl or Cmd.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Open,
    Save,
    SaveAs,
    New,
}

impl Shortcut {
    pub fn from_key(key: &str, ctrl: bool, meta: bool, shift: bool) -> Option<Self> {
        if !(ctrl || meta) {
            return None;
        }
        match (key.to_ascii_lowercase().as_str(), shift) {
            ("o", false) => Some(Self::Open),
            ("s", false) => Some(Self::Save),
            ("s", true) => Some(Self::SaveAs),
            ("n", false) => Some(Self::New),
            _ => None,
        }
    }

    pub async fn run<B: HostBridge>(self, session: &Session<B>) -> Outcome {
        tracing::debug!(shortcut = ?self, "shortcut");
        match self {
            Self::Open => session.open().await,
            Self::Save => session.save().await,
            Self::SaveAs => session.save_as().await,
            Self::New => session.new_file().await,
        }
    }
}
