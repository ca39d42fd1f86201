use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub(crate) const DEFAULT_URL: &str = "https://api.agrimetrics.co.uk";

const KEY_VARS: [&str; 2] = ["AGRIMETRICS_API_KEY", "API_KEY"];

/// Settings passed explicitly into [`crate::Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base API URL, typically `https://api.agrimetrics.co.uk`.
    pub url: String,
    /// Subscription key.
    pub key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

impl ClientConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            key: key.into(),
            verify: true,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("AGRIMETRICS_URL").ok());
    let mut key = key.or_else(|| {
        KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
    });
    let mut file_verify: Option<bool> = None;

    let rc_candidates = rc_candidates();
    if key.is_none() || url.is_none() || verify.is_none() {
        if let Some(rc_path) = rc_candidates.iter().find(|p| p.exists()) {
            let cfg = read_rc(rc_path)
                .map_err(|e| Error::Configuration(format!("{:#}", e)))?;
            tracing::debug!(path = %rc_path.display(), "loaded configuration file");
            url = url.or(cfg.url);
            key = key.or(cfg.key);
            file_verify = cfg.verify;
        }
    }

    let key = key.ok_or_else(|| {
        let places = rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Error::Configuration(format!(
            "missing API key (set API_KEY or put `key:` in one of: {})",
            if places.is_empty() { ".agrimetricsrc" } else { places.as_str() }
        ))
    })?;

    Ok(ClientConfig {
        url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
        key: key.trim().to_string(),
        verify: verify.or(file_verify).unwrap_or(true),
    })
}

fn read_rc(path: &Path) -> anyhow::Result<RcConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();
    // `key:` may be followed by its value on the next line.
    let mut pending: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = pending.take() {
            if !line.contains(':') || (name == "url" && line.contains("://")) {
                set_rc_value(&mut cfg, name, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v);
            if v.is_empty() {
                pending = Some(k);
            } else {
                set_rc_value(&mut cfg, k, v);
            }
        }
    }

    cfg
}

fn set_rc_value(cfg: &mut RcConfig, name: &str, value: &str) {
    match name {
        "url" => cfg.url = Some(value.to_string()),
        "key" => cfg.key = Some(value.to_string()),
        "verify" => cfg.verify = Some(value != "0" && !value.eq_ignore_ascii_case("false")),
        _ => {}
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) AGRIMETRICS_RC  2) ./.agrimetricsrc  3) ~/.agrimetricsrc
    if let Ok(p) = std::env::var("AGRIMETRICS_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".agrimetricsrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".agrimetricsrc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn parses_inline_values() {
        let cfg = parse_rc(
            "# agrimetrics\nurl: https://api.example.test\nkey: 'abc123'\nverify: 0\n",
        );
        assert_eq!(
            cfg,
            RcConfig {
                url: Some("https://api.example.test".into()),
                key: Some("abc123".into()),
                verify: Some(false),
            }
        );
    }

    #[test]
    fn parses_value_on_next_line() {
        let cfg = parse_rc("key:\n  \"tok-en\"\nurl:\nhttps://api.example.test\n");
        assert_eq!(cfg.key.as_deref(), Some("tok-en"));
        assert_eq!(cfg.url.as_deref(), Some("https://api.example.test"));
        assert_eq!(cfg.verify, None);
    }

    #[test]
    fn empty_key_followed_by_another_setting() {
        let cfg = parse_rc("key:\nverify: 1\n");
        assert_eq!(cfg.key, None);
        assert_eq!(cfg.verify, Some(true));
    }

    #[test]
    fn reads_rc_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "key: from-file").unwrap();
        let cfg = read_rc(file.path()).unwrap();
        assert_eq!(cfg.key.as_deref(), Some("from-file"));

        let missing = file.path().with_extension("missing");
        let err = read_rc(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read configuration file"));
    }

    #[test]
    fn explicit_arguments_win() {
        let cfg = load_config(
            Some("https://api.example.test".into()),
            Some(" explicit ".into()),
            Some(false),
        )
        .unwrap();
        assert_eq!(
            cfg,
            ClientConfig {
                url: "https://api.example.test".into(),
                key: "explicit".into(),
                verify: false,
            }
        );
    }

    #[test]
    fn config_builder_defaults() {
        let cfg = ClientConfig::new("k").with_url("http://localhost:1234");
        assert_eq!(cfg.url, "http://localhost:1234");
        assert!(cfg.verify);
    }
}
