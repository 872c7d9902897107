//! Typed alert payload and the notifier that renders and sends it.

use std::sync::Arc;
use std::time::Duration;

use sitewatch_core::FailureKind;
use tracing::info;

use crate::error::NotifyResult;
use crate::mailer::{Mailer, OutboundMail};
use crate::template::{TemplateContext, TemplateRegistry};

/// One failure notification for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub url: String,
    pub kind: FailureKind,
    /// Most recently observed HTTP status (0 if none was received).
    pub status_code: u16,
    /// Backoff delay before the next check.
    pub interval: Duration,
}

impl Alert {
    /// Backoff interval in whole minutes, as shown to operators.
    pub fn interval_minutes(&self) -> u64 {
        self.interval.as_secs() / 60
    }
}

/// Renders alerts and hands them to a `Mailer`.
pub struct Notifier {
    templates: TemplateRegistry,
    mailer: Arc<dyn Mailer>,
    sender: String,
    recipients: Vec<String>,
}

impl Notifier {
    pub fn new(
        templates: TemplateRegistry,
        mailer: Arc<dyn Mailer>,
        sender: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            templates,
            mailer,
            sender: sender.into(),
            recipients,
        }
    }

    pub fn render(&self, alert: &Alert) -> NotifyResult<OutboundMail> {
        let ctx = TemplateContext {
            url: &alert.url,
            status_code: alert.status_code,
            interval_minutes: alert.interval_minutes(),
            kind: alert.kind,
        };
        Ok(OutboundMail {
            from: self.sender.clone(),
            to: self.recipients.clone(),
            subject: self.templates.render_subject(&ctx)?,
            html_body: self.templates.render_body(&ctx)?,
        })
    }

    /// Render and deliver one alert. No retry happens here.
    pub async fn notify(&self, alert: &Alert) -> NotifyResult<()> {
        let mail = self.render(alert)?;
        self.mailer.send(&mail).await?;
        info!(url = %alert.url, kind = %alert.kind, "alert sent");
        Ok(())
    }
}
