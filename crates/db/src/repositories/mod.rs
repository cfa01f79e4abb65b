pub mod content_item_repo;
pub mod settings_repo;

pub use content_item_repo::ContentItemRepo;
pub use settings_repo::SettingsRepo;
