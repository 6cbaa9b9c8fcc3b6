use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const WELCOME_DOC: &str = r#"# Welcome to ZNOTE

A neon-soaked markdown notebook. Write in markdown, export to .docx, .txt, or .pdf.

> "The future is already here, it's just not evenly distributed." William Gibson

## Features

- Markdown syntax highlighting
- Folder sidebar with lazy expansion and filtering
- Export to .docx, .txt, and .pdf

```rust
let note = Note::open("ideas.md")?;
```
"#;

/// User settings, read from `settings.json` by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub font_size: u32,
    pub accent_color: String,
    pub toast_duration_ms: u32,
    pub show_welcome: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            font_size: 15,
            accent_color: "#ff71ce".to_string(),
            toast_duration_ms: 3000,
            show_welcome: true,
        }
    }
}

impl AppSettings {
    pub fn css_vars(&self) -> String {
        format!(
            "--editor-font-size: {}px; --accent-color: {};",
            self.font_size, self.accent_color
        )
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.toast_duration_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"font_size": 18}"#).unwrap();
        assert_eq!(settings.font_size, 18);
        assert_eq!(settings.toast_duration(), Duration::from_secs(3));
        assert!(settings.show_welcome);
    }

    #[test]
    fn css_vars_carry_font_and_accent() {
        let css = AppSettings::default().css_vars();
        assert!(css.contains("--editor-font-size: 15px"));
        assert!(css.contains("--accent-color: #ff71ce"));
    }
}
