pub mod api_versions;
pub mod effective_modules;
pub mod modules;
pub mod release_info;
pub mod update_settings;
