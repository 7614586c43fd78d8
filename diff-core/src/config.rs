//! Layered configuration for the diff viewer.
//!
//! Precedence, lowest first:
//! 1. Built-in defaults ([`ConfigLoader::default_config`])
//! 2. `config.toml` (`~/.snitch/config.toml` unless a path is given)
//! 3. `SNITCH_DIFF_*` environment variables
//!
//! Command line flags are applied on top by the binary.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use snitch_diff_client::HttpDiffApiConfig;
use thiserror::Error;

use crate::labels::LabelRules;
use crate::layout::LayoutConfig;
use crate::session::DEFAULT_NODE_PAGE_SIZE;
use crate::session::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_ENV_PREFIX: &str = "SNITCH_DIFF";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Fully merged configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub node_page_size: usize,
    /// `0` disables the timeout.
    pub request_timeout_secs: u64,
    pub csrf_token: Option<String>,
    pub labels: LabelRules,
    pub layout: LayoutConfig,
}

impl Default for DiffConfig {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

impl DiffConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn http_config(&self) -> HttpDiffApiConfig {
        HttpDiffApiConfig {
            server_url: self.server_url.clone(),
            request_timeout: self.request_timeout(),
            csrf_token: self.csrf_token.clone(),
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "server_url",
                format!("'{}' is not an http(s) URL", self.server_url),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("poll_interval_ms", "must be at least 1"));
        }
        if self.node_page_size == 0 {
            return Err(ConfigError::invalid("node_page_size", "must be at least 1"));
        }
        Ok(())
    }
}

/// On-disk shape: every key optional, unknown keys ignored.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server_url: Option<String>,
    poll_interval_ms: Option<u64>,
    node_page_size: Option<usize>,
    request_timeout_secs: Option<u64>,
    csrf_token: Option<String>,
    labels: Option<BTreeMap<String, String>>,
    layout: Option<LayoutConfig>,
}

pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    env_prefix: String,
    env_vars: Option<HashMap<String, String>>,
    server_url: Option<String>,
    skip_file: bool,
    skip_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_vars: None,
            server_url: None,
            skip_file: false,
            skip_env: false,
        }
    }

    /// Read this file instead of `~/.snitch/config.toml`. Unlike the
    /// default location, an explicit file must exist.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Use these variables instead of the process environment.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Command-line server URL. Applied last, before validation.
    pub fn with_server_url(mut self, server_url: Option<String>) -> Self {
        self.server_url = server_url;
        self
    }

    pub fn skip_file_layer(mut self) -> Self {
        self.skip_file = true;
        self
    }

    pub fn skip_env_layer(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn load(self) -> Result<DiffConfig, ConfigError> {
        let mut config = Self::default_config();

        if !self.skip_file {
            let file = match &self.config_file {
                Some(path) => Self::load_from_file(path, true)?,
                None => match default_config_path() {
                    Some(path) => Self::load_from_file(&path, false)?,
                    None => {
                        tracing::warn!("cannot determine home directory; skipping config file");
                        FileConfig::default()
                    }
                },
            };
            Self::merge_file(&mut config, file);
        }

        if !self.skip_env {
            let vars = match self.env_vars {
                Some(vars) => vars,
                None => std::env::vars().collect(),
            };
            Self::apply_env_overrides(&mut config, &self.env_prefix, &vars)?;
        }

        if let Some(server_url) = self.server_url {
            config.server_url = server_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> DiffConfig {
        DiffConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(3000),
            node_page_size: DEFAULT_NODE_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            csrf_token: None,
            labels: LabelRules::default(),
            layout: LayoutConfig::default(),
        }
    }

    fn load_from_file(path: &Path, required: bool) -> Result<FileConfig, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                return Ok(FileConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `[labels]` entries are merged over the defaults; every other key
    /// replaces the default when present.
    fn merge_file(base: &mut DiffConfig, file: FileConfig) {
        if let Some(url) = file.server_url {
            base.server_url = url;
        }
        if let Some(ms) = file.poll_interval_ms {
            base.poll_interval_ms = ms;
        }
        if let Some(size) = file.node_page_size {
            base.node_page_size = size;
        }
        if let Some(secs) = file.request_timeout_secs {
            base.request_timeout_secs = secs;
        }
        if file.csrf_token.is_some() {
            base.csrf_token = file.csrf_token;
        }
        if let Some(labels) = file.labels {
            base.labels.extend(labels);
        }
        if let Some(layout) = file.layout {
            base.layout = layout;
        }
    }

    fn apply_env_overrides(
        config: &mut DiffConfig,
        prefix: &str,
        vars: &HashMap<String, String>,
    ) -> Result<(), ConfigError> {
        let get = |name: &str| {
            let key = format!("{prefix}_{name}");
            vars.get(&key).map(|v| (key, v.trim().to_string()))
        };

        if let Some((_, url)) = get("SERVER_URL") {
            config.server_url = url;
        }
        if let Some((key, value)) = get("POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("NODE_PAGE_SIZE") {
            config.node_page_size = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number(&key, &value)?;
        }
        if let Some((_, token)) = get("CSRF_TOKEN") {
            config.csrf_token = (!token.is_empty()).then_some(token);
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("'{value}' is not a non-negative integer")))
}

/// `~/.snitch/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".snitch").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn defaults_only() {
        let config = ConfigLoader::new().skip_file_layer().skip_env_layer().load().unwrap();
        assert_eq!(config.server_url, "http://localhost:8000");
        assert_eq!(config.poll_interval(), Duration::from_millis(3000));
        assert_eq!(config.node_page_size, 500);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.labels.property_for("Host"), Some("hostname"));
        assert_eq!(config, DiffConfig::default());
    }

    #[test]
    fn file_overrides_defaults_and_merges_labels() {
        let file = write_config(
            r#"
server_url = "https://snitch.example:8443"
node_page_size = 100
request_timeout_secs = 0

[labels]
Host = "fqdn"
Container = "name"

[layout]
indent = 2
"#,
        );

        let config = ConfigLoader::new()
            .with_config_file(file.path())
            .with_env_vars(no_env())
            .load()
            .unwrap();

        assert_eq!(config.server_url, "https://snitch.example:8443");
        assert_eq!(config.node_page_size, 100);
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.labels.property_for("Host"), Some("fqdn"));
        assert_eq!(config.labels.property_for("Container"), Some("name"));
        assert_eq!(config.labels.property_for("GitRepo"), Some("path"));
        assert_eq!(config.layout.indent, 2);
        assert_eq!(config.layout.margin, LayoutConfig::default().margin);
    }

    #[test]
    fn env_overrides_file() {
        let file = write_config("server_url = \"http://from-file:8000\"\npoll_interval_ms = 1000\n");

        let config = ConfigLoader::new()
            .with_config_file(file.path())
            .with_env_vars([
                ("SNITCH_DIFF_SERVER_URL", "http://from-env:9000"),
                ("SNITCH_DIFF_NODE_PAGE_SIZE", " 250 "),
                ("SNITCH_DIFF_CSRF_TOKEN", "tok"),
                ("UNRELATED", "x"),
            ])
            .load()
            .unwrap();

        assert_eq!(config.server_url, "http://from-env:9000");
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.node_page_size, 250);
        assert_eq!(config.csrf_token.as_deref(), Some("tok"));
        assert_eq!(config.http_config().csrf_token.as_deref(), Some("tok"));
    }

    #[test]
    fn cli_server_url_replaces_invalid_file_value() {
        let file = write_config("server_url = \"snitch:8000\"\n");

        let config = ConfigLoader::new()
            .with_config_file(file.path())
            .with_env_vars([("SNITCH_DIFF_SERVER_URL", "also-bad")])
            .with_server_url(Some("http://from-cli:8000".to_string()))
            .load()
            .unwrap();
        assert_eq!(config.server_url, "http://from-cli:8000");

        let err = ConfigLoader::new()
            .with_config_file(file.path())
            .with_env_vars(no_env())
            .with_server_url(None)
            .load()
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::Invalid { key, .. } if key == "server_url"),
            "{err}"
        );
    }

    #[test]
    fn custom_env_prefix() {
        let config = ConfigLoader::new()
            .skip_file_layer()
            .with_env_prefix("DIFF")
            .with_env_vars([("DIFF_POLL_INTERVAL_MS", "250")])
            .load()
            .unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars([("SNITCH_DIFF_NODE_PAGE_SIZE", "0")])
            .load()
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::Invalid { key, .. } if key == "node_page_size"),
            "{err}"
        );
    }

    #[test]
    fn malformed_env_number_is_rejected() {
        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars([("SNITCH_DIFF_POLL_INTERVAL_MS", "soon")])
            .load()
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::Invalid { key, .. } if key == "SNITCH_DIFF_POLL_INTERVAL_MS"),
            "{err}"
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new()
            .with_config_file(dir.path().join("absent.toml"))
            .skip_env_layer()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigLoader::load_from_file(&dir.path().join("config.toml"), false).unwrap();
        let mut config = ConfigLoader::default_config();
        ConfigLoader::merge_file(&mut config, file);
        assert_eq!(config, ConfigLoader::default_config());
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let file = write_config("node_page_size = \"many\"");
        let err = ConfigLoader::new()
            .with_config_file(file.path())
            .skip_env_layer()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }), "{err}");
    }

    #[test]
    fn non_http_server_url_is_rejected() {
        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars([("SNITCH_DIFF_SERVER_URL", "ftp://snitch")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }
}
