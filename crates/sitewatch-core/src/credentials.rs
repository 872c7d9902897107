//! Mail relay credentials loaded from the process environment.

use std::fmt;

use crate::error::{ConfigError, ConfigResult};

pub const SMTP_SERVER: &str = "SMTP_SERVER";
pub const SMTP_USERNAME: &str = "SMTP_USERNAME";
pub const SMTP_PASSWORD: &str = "SMTP_PASSWORD";
pub const SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const RECIPIENT_EMAIL: &str = "RECIPIENT_EMAIL";
pub const SMTP_PORT: &str = "SMTP_PORT";

/// Submission port used with STARTTLS.
pub const DEFAULT_SMTP_PORT: u16 = 587;

const REQUIRED: [&str; 5] = [
    SMTP_SERVER,
    SMTP_USERNAME,
    SMTP_PASSWORD,
    SENDER_EMAIL,
    RECIPIENT_EMAIL,
];

/// Immutable mail relay settings, loaded once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

impl MailSettings {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// Every required variable that is absent or blank is reported in a
    /// single `MissingCredentials` error.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let recipients: Vec<String> = get(RECIPIENT_EMAIL)
            .map(|raw| {
                raw.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|name| match **name {
                RECIPIENT_EMAIL => recipients.is_empty(),
                other => get(other).is_none(),
            })
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        let port = match get(SMTP_PORT) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            server: get(SMTP_SERVER).unwrap_or_default(),
            port,
            username: get(SMTP_USERNAME).unwrap_or_default(),
            password: get(SMTP_PASSWORD).unwrap_or_default(),
            sender: get(SENDER_EMAIL).unwrap_or_default(),
            recipients,
        })
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .finish()
    }
}
