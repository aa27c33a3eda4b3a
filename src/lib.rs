pub mod app_info;
pub mod config;
pub mod update;
pub mod version;
