mod app;
mod bridge;
mod document;
mod events;
mod file_state;
mod highlight;
mod keymap;
mod logging;
mod notice;
mod session;
mod settings;
mod status;
#[cfg(test)]
mod testing;
mod toolbar;
mod tree;

use app::*;
use leptos::prelude::*;

fn main() {
    logging::init();
    tracing::info!("znote ui starting");
    mount_to_body(|| {
        view! { <App/> }
    })
}
