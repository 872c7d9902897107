pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

pub use config::{parse_duration, WatchConfig};
pub use credentials::MailSettings;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
