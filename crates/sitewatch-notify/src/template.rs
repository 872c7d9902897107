//! Per-failure-kind message templates rendered with minijinja.

use std::collections::HashMap;
use std::path::Path;

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use sitewatch_core::FailureKind;
use tracing::debug;

use crate::error::{NotifyError, NotifyResult};

const DEFAULT_SUBJECT: &str = "{{ url }} website status alarm: could not reach website";
const SUBJECT_FILE: &str = "subject.txt";

fn default_body(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::StatusCode => include_str!("templates/status_code.html"),
        FailureKind::ContentError => include_str!("templates/content_error.html"),
        FailureKind::TransportTimeout => include_str!("templates/timeout.html"),
    }
}

/// Values available to every template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext<'a> {
    pub url: &'a str,
    pub status_code: u16,
    pub interval_minutes: u64,
    pub kind: FailureKind,
}

/// Maps each `FailureKind` to its body template, plus one shared subject.
pub struct TemplateRegistry {
    env: Environment<'static>,
    subject: String,
    bodies: HashMap<FailureKind, String>,
}

impl TemplateRegistry {
    /// Registry with the built-in templates.
    pub fn new() -> Self {
        let bodies = FailureKind::ALL
            .iter()
            .map(|kind| (*kind, default_body(*kind).to_string()))
            .collect();
        Self {
            env: strict_env(),
            subject: DEFAULT_SUBJECT.to_string(),
            bodies,
        }
    }

    /// Built-in templates, overridden by `<key>.html` and `subject.txt`
    /// files found in `dir`.
    ///
    /// Every template is compiled up front so syntax errors surface at
    /// startup rather than on the first outage.
    pub fn from_dir(dir: &Path) -> NotifyResult<Self> {
        let mut registry = Self::new();

        for kind in FailureKind::ALL {
            let path = dir.join(format!("{}.html", kind.template_key()));
            if let Some(source) = read_optional(&path)? {
                debug!(path = %path.display(), %kind, "loaded body template override");
                registry.bodies.insert(kind, source);
            }
        }
        if let Some(source) = read_optional(&dir.join(SUBJECT_FILE))? {
            registry.subject = source.trim().to_string();
        }

        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> NotifyResult<()> {
        self.env.template_from_str(&self.subject)?;
        for (kind, source) in &self.bodies {
            let name = body_name(*kind);
            self.env.template_from_named_str(&name, source)?;
        }
        Ok(())
    }

    /// Subject line. Plain text, so values are inserted unescaped.
    pub fn render_subject(&self, ctx: &TemplateContext<'_>) -> NotifyResult<String> {
        Ok(self.env.render_str(&self.subject, ctx)?)
    }

    /// HTML body for the alert's kind. Rendered under an `.html` name so
    /// interpolated values are HTML-escaped.
    pub fn render_body(&self, ctx: &TemplateContext<'_>) -> NotifyResult<String> {
        let source = self
            .bodies
            .get(&ctx.kind)
            .map(String::as_str)
            .unwrap_or_else(|| default_body(ctx.kind));
        Ok(self.env.render_named_str(&body_name(ctx.kind), source, ctx)?)
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn body_name(kind: FailureKind) -> String {
    format!("{}.html", kind.template_key())
}

fn strict_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

fn read_optional(path: &Path) -> NotifyResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(NotifyError::TemplateRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
