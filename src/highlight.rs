//! Markdown → HTML for the overlay drawn under the transparent textarea.
//!
//! The output must keep every source character in place so the overlay
//! lines up with the caret; markup characters are wrapped, never dropped.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn inline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<bold>\*\*[^*\n]+\*\*)",
            r"|(?P<strike>~~[^~\n]+~~)",
            r"|(?P<italic>\*[^*\n]+\*)",
            r"|(?P<code>`[^`\n]+`)",
            r"|(?P<link>!?\[[^\]\n]*\]\([^)\n]*\))",
        ))
        .expect("inline markdown pattern")
    })
}

fn list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*)([-*+]|\d+\.)(\s+(?:\[[ xX]\]\s+)?)").expect("list marker pattern")
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn span(class: &str, body: &str) -> String {
    format!("<span class=\"{class}\">{body}</span>")
}

fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    let rest = &line[hashes..];
    ((1..=6).contains(&hashes) && (rest.is_empty() || rest.starts_with([' ', '\t']))).then_some(hashes)
}

fn inline(line: &str) -> String {
    let escaped = escape(line);
    inline_re()
        .replace_all(&escaped, |caps: &Captures| {
            let class = ["bold", "strike", "italic", "code", "link"]
                .into_iter()
                .find(|name| caps.name(name).is_some())
                .unwrap_or("text");
            span(&format!("hl-{class}"), &caps[0])
        })
        .into_owned()
}

fn highlight_line(line: &str) -> String {
    if let Some(level) = heading_level(line) {
        return span(&format!("hl-h{}", level.min(4)), &inline(line));
    }
    if line.starts_with('>') {
        return span("hl-quote", &inline(line));
    }
    if let Some(caps) = list_re().captures(line) {
        let marker_end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let marker = &line[..marker_end];
        return format!("{}{}", span("hl-list", &escape(marker)), inline(&line[marker_end..]));
    }
    inline(line)
}

pub fn highlight_markdown(text: &str) -> String {
    let mut html = String::with_capacity(text.len() * 2);
    let mut in_fence = false;
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            html.push('\n');
        }
        let is_fence = line.trim_start().starts_with("```");
        if is_fence || in_fence {
            html.push_str(&span("hl-fence", &escape(line)));
            if is_fence {
                in_fence = !in_fence;
            }
            continue;
        }
        html.push_str(&highlight_line(line));
    }
    // Keep a trailing newline visible so the overlay is as tall as the textarea.
    html.push_str("\n ");
    html
}
