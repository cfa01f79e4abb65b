pub mod content_item;
pub mod settings;
pub mod status;
