//! Outbound mail delivery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sitewatch_core::MailSettings;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::NotifyResult;

/// A fully rendered alert ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Delivers rendered alerts.
///
/// Implementations must be safe to call from many target loops at once.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()>;
}

/// SMTP mailer using STARTTLS and password authentication.
pub struct SmtpMailer {
    /// Held for the whole send so one loop's delivery never interleaves
    /// with another's on the relay connection.
    transport: Mutex<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    /// Build a mailer from validated settings.
    ///
    /// Sender and recipient addresses are parsed here so a malformed
    /// address fails startup instead of the first alert.
    pub fn from_settings(settings: &MailSettings) -> NotifyResult<Self> {
        settings.sender.parse::<Mailbox>()?;
        for recipient in &settings.recipients {
            recipient.parse::<Mailbox>()?;
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport: Mutex::new(transport),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()> {
        let message = build_message(mail)?;
        let transport = self.transport.lock().await;
        let response = transport.send(message).await?;
        debug!(
            subject = %mail.subject,
            recipients = mail.to.len(),
            code = %response.code(),
            "alert mail accepted by relay"
        );
        Ok(())
    }
}

/// Assemble an HTML message for `mail`.
pub fn build_message(mail: &OutboundMail) -> NotifyResult<Message> {
    let mut builder = Message::builder()
        .from(mail.from.parse::<Mailbox>()?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_HTML);
    for recipient in &mail.to {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }
    Ok(builder.body(mail.html_body.clone())?)
}
