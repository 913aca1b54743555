pub mod config;
pub mod error;
pub mod paths;

pub use config::{EngineConfig, MAX_PERIOD, MIN_PERIOD};
pub use error::{ConfigError, Result};
pub use paths::{default_base_dir, resolve_config_path};
