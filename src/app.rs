use std::future::Future;
use std::rc::{Rc, Weak};

use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos::web_sys::HtmlTextAreaElement;

use crate::bridge::TauriBridge;
use crate::document::ChangeOrigin;
use crate::file_state::{FileFormat, UNTITLED};
use crate::highlight::highlight_markdown;
use crate::keymap::Shortcut;
use crate::notice::NoticeQueue;
use crate::session::{Outcome, Session, SessionEvent};
use crate::settings::{AppSettings, WELCOME_DOC};
use crate::status::{save_label, StatusLine};
use crate::toolbar::{activate_pill, dispatch, Pill, ToolbarAction};
use crate::tree::{TreeRow, TreeStatus};

type Shared = Rc<Session<TauriBridge>>;
type SessionHandle = StoredValue<Shared, LocalStorage>;

/// Runs a file operation on the event loop. Failures were already turned
/// into notices by the session.
fn spawn_op<F, Fut>(session: SessionHandle, op: F)
where
    F: FnOnce(Shared) -> Fut + 'static,
    Fut: Future<Output = Outcome> + 'static,
{
    let session = session.get_value();
    spawn_local(async move {
        let outcome = op(session).await;
        tracing::debug!(?outcome, "file operation finished");
    });
}

/// `(anchor, head)` of the textarea selection in UTF-16 units.
fn textarea_selection(el: &HtmlTextAreaElement) -> (u32, u32) {
    let start = el.selection_start().ok().flatten().unwrap_or(0);
    let end = el.selection_end().ok().flatten().unwrap_or(start);
    match el.selection_direction().ok().flatten().as_deref() {
        Some("backward") => (end, start),
        _ => (start, end),
    }
}

/// Pushes the document into the textarea after a change that did not come
/// from typing.
fn sync_surface(textarea: NodeRef<html::Textarea>, session: &Shared, focus: bool) {
    let Some(el) = textarea.get_untracked() else {
        return;
    };
    let text = session.content();
    if el.value() != text {
        el.set_value(&text);
    }
    if focus {
        let _ = el.focus();
    }
    let ((start, end), backward) =
        session.with_document(|doc| (doc.selection_utf16(), doc.selection().is_backward()));
    let direction = if backward { "backward" } else { "forward" };
    let _ = el.set_selection_range_with_direction(start, end, direction);
}

fn row_class(row: &TreeRow) -> String {
    let mut class = format!("tree-row indent-{}", row.indent);
    if row.is_dir {
        class.push_str(" dir");
    }
    if row.active {
        class.push_str(" active");
    }
    class
}

fn row_icon(row: &TreeRow) -> &'static str {
    match (row.is_dir, row.expanded) {
        (true, true) => "▾",
        (true, false) => "▸",
        (false, _) => "📄",
    }
}

#[component]
pub fn App() -> impl IntoView {
    let shared: Shared = Rc::new(Session::new(TauriBridge));
    let session = StoredValue::new_local(Rc::clone(&shared));
    let textarea = NodeRef::<html::Textarea>::new();

    let (settings, set_settings) = signal(AppSettings::default());
    let (highlighted, set_highlighted) = signal(highlight_markdown(""));
    let (status, set_status) = signal(StatusLine::default());
    let (title, set_title) = signal(UNTITLED.to_string());
    let (dirty, set_dirty) = signal(false);
    let (format, set_format) = signal(FileFormat::default());
    let (rows, set_rows) = signal(Vec::<TreeRow>::new());
    let (tree_status, set_tree_status) = signal(TreeStatus::NoFolder);
    let (folder, set_folder) = signal(None::<String>);
    let (notices, set_notices) = signal(NoticeQueue::default());
    let (scroll_top, set_scroll_top) = signal(0);

    let weak: Weak<Session<TauriBridge>> = Rc::downgrade(&shared);
    let document_sub = shared.subscribe_document(move |outcome| {
        let Some(session) = weak.upgrade() else {
            return;
        };
        set_status.set(session.status());
        if outcome.text_changed {
            set_highlighted.set(highlight_markdown(&session.content()));
        }
        if outcome.origin != ChangeOrigin::Input {
            sync_surface(textarea, &session, outcome.origin == ChangeOrigin::Command);
        }
    });

    let weak = Rc::downgrade(&shared);
    let session_sub = shared.subscribe(move |event| match event {
        SessionEvent::TitleChanged(name) => {
            document().set_title(&format!("ZNOTE — {name}"));
            set_title.set(name.clone());
        }
        SessionEvent::DirtyChanged(value) => set_dirty.set(*value),
        SessionEvent::FormatChanged(value) => set_format.set(*value),
        SessionEvent::Notice(notice) => {
            let id = set_notices.try_update(|queue| queue.push(notice.clone()));
            if let Some(id) = id {
                let duration = settings.get_untracked().toast_duration();
                set_timeout(move || set_notices.update(|queue| queue.dismiss(id)), duration);
            }
        }
        SessionEvent::TreeChanged => {
            if let Some(session) = weak.upgrade() {
                set_rows.set(session.tree_rows());
                set_tree_status.set(session.tree_status());
                set_folder.set(session.active_folder());
            }
        }
    });

    on_cleanup(move || {
        session.with_value(|session| {
            session.unsubscribe_document(document_sub);
            session.unsubscribe(session_sub);
        });
    });

    Effect::new(move |_| {
        let session = session.get_value();
        spawn_local(async move {
            let loaded = match session.bridge().load_settings().await {
                Ok(loaded) => loaded,
                Err(err) => {
                    tracing::warn!(%err, "falling back to default settings");
                    AppSettings::default()
                }
            };
            if loaded.show_welcome && !session.load_welcome(WELCOME_DOC) {
                tracing::debug!("buffer already in use, skipping welcome document");
            }
            document().set_title(&format!("ZNOTE — {}", session.title()));
            set_settings.set(loaded);
        });
    });

    let _keys = window_event_listener(ev::keydown, move |ev| {
        let Some(shortcut) = Shortcut::from_key(&ev.key(), ev.ctrl_key(), ev.meta_key(), ev.shift_key())
        else {
            return;
        };
        ev.prevent_default();
        spawn_op(session, move |s| async move { shortcut.run(&s).await });
    });

    let on_input = move |_: ev::Event| {
        let Some(el) = textarea.get_untracked() else {
            return;
        };
        let (anchor, head) = textarea_selection(&el);
        session.with_value(|s| {
            s.input(el.value(), anchor, head);
        });
    };
    let on_select = move || {
        let Some(el) = textarea.get_untracked() else {
            return;
        };
        let (anchor, head) = textarea_selection(&el);
        session.with_value(|s| {
            s.select_utf16(anchor, head);
        });
    };

    let new_file_in_folder = move || {
        let prompt = window().prompt_with_message_and_default("New file name", "untitled.md");
        if let Ok(Some(name)) = prompt {
            spawn_op(session, move |s| async move { s.create_file(&name).await });
        }
    };

    let toolbar = ToolbarAction::ALL
        .into_iter()
        .map(|action| {
            view! {
                <button
                    class="tool-btn"
                    data-action=action.id()
                    title=action.title()
                    on:mousedown=move |ev| {
                        ev.prevent_default();
                        session.with_value(|s| {
                            dispatch(s, action);
                        });
                    }
                >
                    {action.label()}
                </button>
            }
        })
        .collect::<Vec<_>>();

    let pills = Pill::ALL
        .into_iter()
        .map(|pill| {
            view! {
                <button
                    class=move || {
                        if format.get().pill_id() == pill.id() { "pill active" } else { "pill" }
                    }
                    on:click=move |_| {
                        let session = session.get_value();
                        spawn_local(async move {
                            if let Some(outcome) = activate_pill(&session, pill).await {
                                tracing::debug!(?outcome, pill = pill.id(), "pill finished");
                            }
                        });
                    }
                >
                    {pill.label()}
                </button>
            }
        })
        .collect::<Vec<_>>();

    let tree_view = move || {
        let current = rows.get();
        if current.is_empty() {
            let message = match tree_status.get() {
                TreeStatus::NoFolder => "No folder open",
                TreeStatus::Loading => "Loading…",
                TreeStatus::Failed => "Failed to load folder",
                TreeStatus::Ready => "Nothing to show",
            };
            return view! { <div class="tree-empty">{message}</div> }.into_any();
        }
        current
            .into_iter()
            .map(|row| {
                let id = row.id;
                let is_dir = row.is_dir;
                view! {
                    <div
                        class=row_class(&row)
                        title=row.path.clone()
                        on:click=move |_| {
                            if is_dir {
                                spawn_op(session, move |s| async move { s.toggle_dir(id).await });
                            } else {
                                spawn_op(session, move |s| async move { s.select_file(id).await });
                            }
                        }
                    >
                        <span class="tree-icon">{row_icon(&row)}</span>
                        <span class="tree-name">{row.name.clone()}</span>
                    </div>
                }
            })
            .collect::<Vec<_>>()
            .into_any()
    };

    view! {
        <main class="app-layout" style=move || settings.get().css_vars()>
            <nav class="sidebar">
                <div class="sidebar-header">
                    <span class="sidebar-title">
                        {move || {
                            folder
                                .get()
                                .map(|path| crate::file_state::file_name(&path).to_string())
                                .unwrap_or_else(|| "ZNOTE".to_string())
                        }}
                    </span>
                    <button
                        class="icon-btn"
                        title="New file"
                        disabled=move || folder.get().is_none()
                        on:click=move |_| new_file_in_folder()
                    >
                        "+"
                    </button>
                    <button
                        class="icon-btn"
                        title="Open folder"
                        on:click=move |_| spawn_op(session, |s| async move { s.open_folder().await })
                    >
                        "📁"
                    </button>
                </div>
                <input
                    class="tree-search"
                    type="search"
                    placeholder="Filter files"
                    on:input=move |ev| {
                        let query = event_target_value(&ev);
                        session.with_value(|s| s.set_filter(&query));
                    }
                />
                <div class="tree">{tree_view}</div>
            </nav>
            <section class="editor-pane">
                <header class="topbar">
                    <div class="toolbar">{toolbar}</div>
                    <div class="pills">{pills}</div>
                </header>
                <div class="editor-container">
                    <div
                        class="markdown-highlight-layer"
                        inner_html=move || highlighted.get()
                        prop:scrollTop=move || scroll_top.get()
                    ></div>
                    <textarea
                        class="raw-editor"
                        node_ref=textarea
                        placeholder="Start writing markdown..."
                        spellcheck="false"
                        on:input=on_input
                        on:select=move |_| on_select()
                        on:keyup=move |_| on_select()
                        on:mouseup=move |_| on_select()
                        on:scroll=move |ev| {
                            let target: leptos::web_sys::Element = event_target(&ev);
                            set_scroll_top.set(target.scroll_top());
                        }
                    ></textarea>
                </div>
                <footer class="statusbar">
                    <span class="status-file">{move || title.get()}</span>
                    <span class="status-position">{move || status.get().position_label()}</span>
                    <span class="status-words">{move || status.get().words_label()}</span>
                    <span class="status-chars">{move || status.get().chars_label()}</span>
                    <span class=move || if dirty.get() { "status-save modified" } else { "status-save" }>
                        {move || save_label(dirty.get())}
                    </span>
                    <span class="status-format">{move || format.get().badge()}</span>
                </footer>
            </section>
            <div class="toast-container">
                {move || {
                    notices
                        .get()
                        .items()
                        .iter()
                        .map(|(_, notice)| {
                            view! { <div class=notice.class()>{notice.message.clone()}</div> }
                        })
                        .collect::<Vec<_>>()
                }}
            </div>
        </main>
    }
}
