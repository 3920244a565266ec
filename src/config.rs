use crate::pipeline::ForecastHorizon;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env";

pub const NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const GNEWS_API_KEY: &str = "GNEWS_API_KEY";
pub const TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    pub query: QueryConfig,
    pub alerts: AlertConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// Where the two interchange datasets live between stages.
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub raw_news_file: PathBuf,
    pub analyzed_news_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    pub topic: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AlertConfig {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_newsapi_base")]
    pub newsapi_base_url: String,
    #[serde(default = "default_gnews_base")]
    pub gnews_base_url: String,
    #[serde(default = "default_twitter_base")]
    pub twitter_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_newsapi_base() -> String { "https://newsapi.org".to_string() }
fn default_gnews_base() -> String { "https://gnews.io".to_string() }
fn default_twitter_base() -> String { "https://api.twitter.com".to_string() }
fn default_language() -> String { "en".to_string() }
fn default_page_size() -> u32 { 50 }
fn default_request_timeout() -> u64 { 15_000 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            newsapi_base_url: default_newsapi_base(),
            gnews_base_url: default_gnews_base(),
            twitter_base_url: default_twitter_base(),
            language: default_language(),
            page_size: default_page_size(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u32,
}

fn default_horizon_days() -> u32 { 7 }

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: default_horizon_days(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config TOML")
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        Self::load_env_file_from(Path::new(ENV_FILE));
    }

    pub fn load_env_file_from(path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

/// Secrets resolved from the environment. Never read from the TOML file.
#[derive(Clone)]
pub struct Credentials {
    pub news_api_key: String,
    pub gnews_api_key: String,
    pub twitter_bearer_token: String,
    pub slack_webhook_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("news_api_key", &"<redacted>")
            .field("gnews_api_key", &"<redacted>")
            .field("twitter_bearer_token", &"<redacted>")
            .field("slack_webhook_url", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve every credential through `lookup`. The first missing or blank
    /// variable aborts resolution.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key).map(|v| sanitize_key(&v)) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => anyhow::bail!("missing required setting {}", key),
            }
        };

        let slack_webhook_url = required(SLACK_WEBHOOK_URL)?;
        if !(slack_webhook_url.starts_with("https://") || slack_webhook_url.starts_with("http://")) {
            anyhow::bail!("{} must be an http(s) URL", SLACK_WEBHOOK_URL);
        }

        Ok(Self {
            news_api_key: required(NEWS_API_KEY)?,
            gnews_api_key: required(GNEWS_API_KEY)?,
            twitter_bearer_token: required(TWITTER_BEARER_TOKEN)?,
            slack_webhook_url,
        })
    }
}

/// Everything a run needs, resolved once at process entry and shared
/// read-only with every stage.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub credentials: Credentials,
    pub default_horizon: ForecastHorizon,
}

impl Settings {
    /// Read `config_path`, seed the environment from `.env`, then resolve
    /// credentials. Any failure here is fatal to startup.
    pub fn resolve(config_path: &Path) -> Result<Self> {
        let config = Config::load(config_path)?;
        Config::load_env_file();
        let credentials = Credentials::from_env()?;
        Self::new(config, credentials)
    }

    pub fn new(config: Config, credentials: Credentials) -> Result<Self> {
        if config.query.topic.trim().is_empty() {
            anyhow::bail!("query.topic cannot be empty");
        }
        if config.paths.raw_news_file.as_os_str().is_empty() {
            anyhow::bail!("paths.raw_news_file cannot be empty");
        }
        if config.paths.analyzed_news_file.as_os_str().is_empty() {
            anyhow::bail!("paths.analyzed_news_file cannot be empty");
        }
        if config.paths.raw_news_file == config.paths.analyzed_news_file {
            anyhow::bail!("raw and analyzed dataset paths must differ");
        }

        let AlertConfig { positive_threshold: pos, negative_threshold: neg } = config.alerts;
        for (name, v) in [("positive_threshold", pos), ("negative_threshold", neg)] {
            if !v.is_finite() || !(-1.0..=1.0).contains(&v) {
                anyhow::bail!("alerts.{} must be within [-1, 1], got {}", name, v);
            }
        }
        if neg >= pos {
            anyhow::bail!(
                "alerts.negative_threshold ({}) must be below alerts.positive_threshold ({})",
                neg, pos
            );
        }

        if config.sources.page_size == 0 || config.sources.page_size > 100 {
            anyhow::bail!("sources.page_size must be within 1..=100");
        }

        let default_horizon = ForecastHorizon::try_from(config.forecast.default_horizon_days)
            .context("forecast.default_horizon_days")?;

        Ok(Self {
            config,
            credentials,
            default_horizon,
        })
    }

    pub fn raw_path(&self) -> &Path {
        &self.config.paths.raw_news_file
    }

    pub fn analyzed_path(&self) -> &Path {
        &self.config.paths.analyzed_news_file
    }

    pub fn default_topic(&self) -> &str {
        self.config.query.topic.trim()
    }
}

/// Strip carriage returns, BOM, and other invisible chars from a key/path value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (NEWS_API_KEY, "news-key"),
            (GNEWS_API_KEY, "gnews-key"),
            (TWITTER_BEARER_TOKEN, "bearer"),
            (SLACK_WEBHOOK_URL, "https://hooks.slack.com/services/T/B/X"),
        ])
    }

    fn lookup_in<'a>(env: &'a HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |k| env.get(k).map(|v| v.to_string())
    }

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        assert_eq!(config.query.topic, "artificial intelligence");
        assert!(config.alerts.negative_threshold < config.alerts.positive_threshold);
        assert_eq!(config.forecast.default_horizon_days, 7);
    }

    #[test]
    fn test_sources_section_is_optional() {
        let config = Config::from_toml_str(
            r#"
            [paths]
            raw_news_file = "data/raw.csv"
            analyzed_news_file = "data/analyzed.csv"
            [query]
            topic = "rust"
            [alerts]
            positive_threshold = 0.3
            negative_threshold = -0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.sources.page_size, 50);
        assert_eq!(config.sources.newsapi_base_url, "https://newsapi.org");
    }

    #[test]
    fn test_missing_thresholds_section_fails() {
        let err = Config::from_toml_str(
            r#"
            [paths]
            raw_news_file = "a.csv"
            analyzed_news_file = "b.csv"
            [query]
            topic = "rust"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_credentials_resolve_when_all_present() {
        let env = full_env();
        let creds = Credentials::from_lookup(lookup_in(&env)).unwrap();
        assert_eq!(creds.news_api_key, "news-key");
        assert_eq!(creds.twitter_bearer_token, "bearer");
    }

    #[test]
    fn test_each_missing_credential_is_fatal() {
        for key in [NEWS_API_KEY, GNEWS_API_KEY, TWITTER_BEARER_TOKEN, SLACK_WEBHOOK_URL] {
            let mut env = full_env();
            env.remove(key);
            let err = Credentials::from_lookup(lookup_in(&env)).unwrap_err();
            assert!(err.to_string().contains(key), "error should name {}", key);
        }
    }

    #[test]
    fn test_blank_credential_is_fatal() {
        let mut env = full_env();
        env.insert(GNEWS_API_KEY, " \r ");
        assert!(Credentials::from_lookup(lookup_in(&env)).is_err());
    }

    #[test]
    fn test_webhook_must_be_url() {
        let mut env = full_env();
        env.insert(SLACK_WEBHOOK_URL, "not-a-url");
        assert!(Credentials::from_lookup(lookup_in(&env)).is_err());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = Config::load(Path::new("config.toml")).unwrap();
        config.alerts.positive_threshold = -0.5;
        config.alerts.negative_threshold = 0.5;
        let creds = Credentials::from_lookup(lookup_in(&full_env())).unwrap();
        assert!(Settings::new(config, creds).is_err());
    }

    #[test]
    fn test_unsupported_default_horizon_rejected() {
        let mut config = Config::load(Path::new("config.toml")).unwrap();
        config.forecast.default_horizon_days = 10;
        let creds = Credentials::from_lookup(lookup_in(&full_env())).unwrap();
        assert!(Settings::new(config, creds).is_err());
    }

    const PATHS: &str = "[paths]\nraw_news_file = \"data/raw.csv\"\nanalyzed_news_file = \"data/analyzed.csv\"\n";
    const QUERY: &str = "[query]\ntopic = \"rust\"\n";
    const ALERTS: &str = "[alerts]\npositive_threshold = 0.3\nnegative_threshold = -0.3\n";

    #[test]
    fn test_each_missing_required_setting_is_fatal() {
        let cases = [
            ("raw_news_file", PATHS.replace("raw_news_file = \"data/raw.csv\"\n", "")),
            ("analyzed_news_file", PATHS.replace("analyzed_news_file = \"data/analyzed.csv\"\n", "")),
            ("topic", "[query]\n".to_string()),
        ];
        for (field, section) in cases {
            let toml = if field == "topic" {
                format!("{}{}{}", PATHS, section, ALERTS)
            } else {
                format!("{}{}{}", section, QUERY, ALERTS)
            };
            assert!(Config::from_toml_str(&toml).is_err(), "missing {} should fail", field);
        }
        let complete = format!("{}{}{}", PATHS, QUERY, ALERTS);
        assert!(Config::from_toml_str(&complete).is_ok());
    }

    #[test]
    fn test_blank_or_colliding_settings_rejected() {
        let cases: [(&str, fn(&mut Config)); 4] = [
            ("blank topic", |c| c.query.topic = "   ".into()),
            ("blank raw path", |c| c.paths.raw_news_file = PathBuf::new()),
            ("blank analyzed path", |c| c.paths.analyzed_news_file = PathBuf::new()),
            ("identical paths", |c| c.paths.analyzed_news_file = c.paths.raw_news_file.clone()),
        ];
        for (name, mutate) in cases {
            let mut config = Config::load(Path::new("config.toml")).unwrap();
            mutate(&mut config);
            let creds = Credentials::from_lookup(lookup_in(&full_env())).unwrap();
            assert!(Settings::new(config, creds).is_err(), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::from_lookup(lookup_in(&full_env())).unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("news-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
