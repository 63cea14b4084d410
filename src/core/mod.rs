// src/core/mod.rs
pub mod config_manager;
pub mod secrets;

pub use config_manager::ConfigManager;
pub use secrets::Secrets;
