//! sitewatch-notify — alert rendering and delivery.
//!
//! ```text
//! Alert ──► TemplateRegistry (per FailureKind) ──► OutboundMail ──► Mailer
//! ```
//!
//! The `Notifier` ties a registry to a mailer and the configured sender
//! and recipients. `SmtpMailer` delivers over an authenticated STARTTLS
//! session and serializes concurrent sends.

pub mod alert;
pub mod error;
pub mod mailer;
pub mod template;

pub use alert::{Alert, Notifier};
pub use error::{NotifyError, NotifyResult};
pub use mailer::{Mailer, OutboundMail, SmtpMailer};
pub use template::TemplateRegistry;
