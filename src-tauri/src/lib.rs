mod commands;
mod error;
mod logging;

pub use error::CommandError;

use commands::{dialog, export, file_io, folder, settings};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    tauri::Builder::default()
        .invoke_handler(tauri::generate_handler![
            file_io::read_file,
            file_io::write_file,
            file_io::create_file,
            folder::list_directory,
            export::export_txt,
            export::export_docx,
            export::export_pdf,
            dialog::pick_file,
            dialog::pick_folder,
            dialog::pick_save_path,
            dialog::confirm,
            settings::load_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
