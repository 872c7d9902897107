//! Targets file parser.
//!
//! The file carries an optional `[policy]` table and the target list,
//! either as `[[targets]]` tables or as a flat `websites` array of URLs.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Policy, Target};

/// Validated monitoring configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub policy: Policy,
    pub targets: Vec<Target>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    policy: Option<RawPolicy>,
    targets: Option<Vec<RawTarget>>,
    websites: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPolicy {
    initial_interval: Option<String>,
    max_interval: Option<String>,
    healthy_min: Option<String>,
    healthy_max: Option<String>,
    growth_factor: Option<u32>,
    notify_cap: Option<u32>,
    probe_timeout: Option<String>,
    start_stagger: Option<String>,
    max_head_bytes: Option<usize>,
    soft_error_phrases: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
    url: String,
    initial_interval: Option<String>,
    max_interval: Option<String>,
}

impl WatchConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let policy = build_policy(raw.policy.unwrap_or_default())?;

        let mut targets = Vec::new();
        let mut seen = HashSet::new();

        for raw_target in raw.targets.unwrap_or_default() {
            let mut target = Target::with_policy(raw_target.url.trim(), &policy);
            if let Some(v) = raw_target.initial_interval {
                target.initial_interval = duration_field("targets.initial_interval", &v)?;
            }
            if let Some(v) = raw_target.max_interval {
                target.max_interval = duration_field("targets.max_interval", &v)?;
            }
            push_target(&mut targets, &mut seen, target)?;
        }
        for url in raw.websites.unwrap_or_default() {
            push_target(&mut targets, &mut seen, Target::with_policy(url.trim(), &policy))?;
        }

        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        Ok(Self { policy, targets })
    }
}

fn build_policy(raw: RawPolicy) -> ConfigResult<Policy> {
    let mut policy = Policy::default();

    if let Some(v) = raw.initial_interval {
        policy.initial_interval = duration_field("policy.initial_interval", &v)?;
    }
    if let Some(v) = raw.max_interval {
        policy.max_interval = duration_field("policy.max_interval", &v)?;
    }
    if let Some(v) = raw.healthy_min {
        policy.healthy_min = duration_field("policy.healthy_min", &v)?;
    }
    if let Some(v) = raw.healthy_max {
        policy.healthy_max = duration_field("policy.healthy_max", &v)?;
    }
    if let Some(v) = raw.probe_timeout {
        policy.probe_timeout = duration_field("policy.probe_timeout", &v)?;
    }
    if let Some(v) = raw.start_stagger {
        policy.start_stagger = duration_field("policy.start_stagger", &v)?;
    }
    if let Some(v) = raw.growth_factor {
        policy.growth_factor = v;
    }
    if let Some(v) = raw.notify_cap {
        policy.notify_cap = v;
    }
    if let Some(v) = raw.max_head_bytes {
        policy.max_head_bytes = v;
    }
    if let Some(phrases) = raw.soft_error_phrases {
        policy.soft_error_phrases = phrases
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }

    if policy.growth_factor < 1 {
        return Err(ConfigError::InvalidPolicy(
            "growth_factor must be at least 1".to_string(),
        ));
    }
    if policy.healthy_min > policy.healthy_max {
        return Err(ConfigError::InvalidPolicy(
            "healthy_min must not exceed healthy_max".to_string(),
        ));
    }
    if policy.probe_timeout.is_zero() {
        return Err(ConfigError::InvalidPolicy(
            "probe_timeout must be non-zero".to_string(),
        ));
    }
    if policy.max_head_bytes == 0 {
        return Err(ConfigError::InvalidPolicy(
            "max_head_bytes must be non-zero".to_string(),
        ));
    }
    validate_intervals("policy", policy.initial_interval, policy.max_interval)?;

    Ok(policy)
}

fn push_target(
    targets: &mut Vec<Target>,
    seen: &mut HashSet<String>,
    target: Target,
) -> ConfigResult<()> {
    validate_url(&target.url)?;
    validate_intervals(&target.url, target.initial_interval, target.max_interval)?;
    if !seen.insert(target.url.clone()) {
        return Err(ConfigError::DuplicateTarget(target.url));
    }
    targets.push(target);
    Ok(())
}

fn validate_url(raw: &str) -> ConfigResult<()> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    if raw.is_empty() {
        return Err(invalid("empty"));
    }
    let parsed = url::Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(&format!("unsupported scheme `{other}`"))),
    }
}

fn validate_intervals(owner: &str, initial: Duration, max: Duration) -> ConfigResult<()> {
    if initial.is_zero() {
        return Err(ConfigError::InvalidPolicy(format!(
            "{owner}: initial_interval must be non-zero"
        )));
    }
    if initial > max {
        return Err(ConfigError::InvalidPolicy(format!(
            "{owner}: initial_interval exceeds max_interval"
        )));
    }
    Ok(())
}

fn duration_field(key: &str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse a duration string like "500ms", "10s", "5m", "1h".
///
/// A plain number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(3600))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("10s"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("42"), Some(Duration::from_secs(42)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("5d"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn parse_flat_website_list() {
        let config = WatchConfig::from_toml_str(
            r#"websites = ["https://a.example", "http://b.example/status"]"#,
        )
        .unwrap();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.policy, Policy::default());
        assert_eq!(config.targets[0].url, "https://a.example");
        assert_eq!(config.targets[1].initial_interval, Duration::from_secs(300));
    }

    #[test]
    fn parse_policy_and_target_overrides() {
        let config = WatchConfig::from_toml_str(
            r#"
[policy]
initial_interval = "1m"
max_interval = "20m"
growth_factor = 2
notify_cap = 3
soft_error_phrases = ["maintenance", "  "]

[[targets]]
url = "https://a.example"

[[targets]]
url = "https://b.example"
initial_interval = "30s"
max_interval = "5m"
"#,
        )
        .unwrap();

        assert_eq!(config.policy.growth_factor, 2);
        assert_eq!(config.policy.notify_cap, 3);
        assert_eq!(config.policy.soft_error_phrases, vec!["maintenance"]);
        assert_eq!(config.targets[0].initial_interval, Duration::from_secs(60));
        assert_eq!(config.targets[0].max_interval, Duration::from_secs(1200));
        assert_eq!(config.targets[1].initial_interval, Duration::from_secs(30));
        assert_eq!(config.targets[1].max_interval, Duration::from_secs(300));
    }

    #[test]
    fn rejects_empty_target_list() {
        let err = WatchConfig::from_toml_str("websites = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
    }

    #[test]
    fn rejects_duplicate_urls_across_forms() {
        let err = WatchConfig::from_toml_str(
            r#"
websites = ["https://a.example"]

[[targets]]
url = "https://a.example"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTarget(url) if url == "https://a.example"));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = WatchConfig::from_toml_str(r#"websites = ["ftp://a.example"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_initial_above_max() {
        let err = WatchConfig::from_toml_str(
            r#"
[[targets]]
url = "https://a.example"
initial_interval = "2h"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPolicy(_)));
    }

    #[test]
    fn invalid_duration_names_key() {
        let err = WatchConfig::from_toml_str(
            r#"
websites = ["https://a.example"]

[policy]
probe_timeout = "fast"
"#,
        )
        .unwrap_err();
        match err {
            ConfigError::InvalidDuration { key, value } => {
                assert_eq!(key, "policy.probe_timeout");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_inverted_healthy_range() {
        let err = WatchConfig::from_toml_str(
            r#"
websites = ["https://a.example"]

[policy]
healthy_min = "10m"
healthy_max = "5m"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPolicy(_)));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.toml");
        std::fs::write(&path, r#"websites = ["https://a.example"]"#).unwrap();

        let config = WatchConfig::from_file(&path).unwrap();
        assert_eq!(config.targets.len(), 1);
    }

    #[test]
    fn from_file_missing_reports_path() {
        let err = WatchConfig::from_file(Path::new("/nonexistent/targets.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/targets.toml"));
    }
}
