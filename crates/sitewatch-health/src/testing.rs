//! Scripted collaborators for driving the checker in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sitewatch_notify::{Mailer, Notifier, NotifyResult, OutboundMail, TemplateRegistry};

use crate::error::ProbeError;
use crate::probe::Prober;

/// Replays queued replies, then falls back to fixed defaults.
pub(crate) struct FakeProber {
    status: Mutex<VecDeque<Result<u16, ProbeError>>>,
    head: Mutex<VecDeque<Result<String, ProbeError>>>,
    default_status: Mutex<u16>,
    pub status_calls: AtomicUsize,
    pub head_calls: AtomicUsize,
}

impl FakeProber {
    /// Healthy by default: 200 and a clean head section.
    pub fn up() -> Self {
        Self::with_default_status(200)
    }

    pub fn with_default_status(code: u16) -> Self {
        Self {
            status: Mutex::new(VecDeque::new()),
            head: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(code),
            status_calls: AtomicUsize::new(0),
            head_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_status(&self, reply: Result<u16, ProbeError>) {
        self.status.lock().unwrap().push_back(reply);
    }

    pub fn push_head(&self, reply: Result<String, ProbeError>) {
        self.head.lock().unwrap().push_back(reply);
    }

    pub fn set_default_status(&self, code: u16) {
        *self.default_status.lock().unwrap() = code;
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn status(&self, _url: &str) -> Result<u16, ProbeError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.status.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(*self.default_status.lock().unwrap()))
    }

    async fn head_section(&self, _url: &str) -> Result<String, ProbeError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.head.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok("<html><head><title>Welcome</title></head>".to_string()))
    }
}

/// Records every mail instead of sending it. Can be told to fail.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundMail>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl RecordingMailer {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            // An address error stands in for a relay failure.
            let err = "not an address"
                .parse::<lettre::message::Mailbox>()
                .unwrap_err();
            return Err(err.into());
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub(crate) fn notifier(mailer: Arc<RecordingMailer>) -> Arc<Notifier> {
    Arc::new(Notifier::new(
        TemplateRegistry::new(),
        mailer,
        "monitor@example.com",
        vec!["ops@example.com".to_string()],
    ))
}
