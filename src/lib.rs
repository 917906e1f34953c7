pub mod config;
pub mod handler;
pub mod logging;
pub mod version;
