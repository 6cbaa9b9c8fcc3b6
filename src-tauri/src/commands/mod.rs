pub mod dialog;
pub mod export;
pub mod file_io;
pub mod folder;
pub mod settings;
