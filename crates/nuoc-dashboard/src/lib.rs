//! Water-quality dashboard: the data API server and a terminal chat widget.

pub mod config;
pub mod server;
pub mod widget;

pub use config::{ChatConfig, ConfigError, DashboardConfig, ServerConfig, DEFAULT_CONFIG_FILE};
