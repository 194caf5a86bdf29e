//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Deployment-time settings (notably the proxy upstream host) arrive either
//! from `clipcue.yaml` or from `CLIPCUE`-prefixed environment variables,
//! e.g. `CLIPCUE__PROXY__UPSTREAM_HOST=backend.example.app`. Environment
//! values win over file values, and `${VAR}` placeholders inside string
//! values are expanded before deserialisation.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use clipcue_extract::SiteProfile;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

fn default_listen() -> String {
    "127.0.0.1:8787".into()
}
fn default_endpoint() -> String {
    "https://proxy.hizs.top/api/".into()
}

/// Top-level configuration for the Clipcue binaries.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClipcueConfig {
    pub proxy: ProxyConfig,
    pub comment_api: CommentApiConfig,
    /// Site-specific extraction overrides; defaults describe douyin.com.
    pub site: SiteProfile,
}

/// Settings for the request-forwarding proxy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Local address the proxy binds to.
    pub listen: String,
    /// Origin requests are forwarded to. A bare host implies `https://`;
    /// a full `http(s)://` origin is used as-is.
    pub upstream_host: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            upstream_host: None,
        }
    }
}

/// Settings for the comment-generation API collaborator.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CommentApiConfig {
    /// Base URL of the API; the client posts to `<endpoint>generate`.
    pub endpoint: String,
    /// Optional ingress token, sent as a bearer credential.
    pub auth_token: Option<String>,
}

impl Default for CommentApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auth_token: None,
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ClipcueConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ClipcueConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipcueConfigLoader {
    /// Start with sensible defaults: `CLIPCUE` env overrides, file optional.
    ///
    /// ```
    /// use clipcue_config::ClipcueConfigLoader;
    ///
    /// let config = ClipcueConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.proxy.listen, "127.0.0.1:8787");
    /// assert!(config.proxy.upstream_host.is_none());
    /// assert_eq!(config.site.host, "douyin.com");
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("CLIPCUE").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use clipcue_config::ClipcueConfigLoader;
    ///
    /// let cfg = ClipcueConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// proxy:
    ///   upstream_host: "backend.example.app"
    /// comment_api:
    ///   endpoint: "https://comments.example.com/api/"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.proxy.upstream_host.as_deref(), Some("backend.example.app"));
    /// assert_eq!(cfg.comment_api.endpoint, "https://comments.example.com/api/");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config.
    ///
    /// The loader combines YAML sources with `CLIPCUE`-prefixed environment
    /// variables and expands `${VAR}` placeholders before materialising
    /// strongly typed structs.
    pub fn load(self) -> Result<ClipcueConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Convert to serde_json::Value first so placeholders can be expanded
        // regardless of where they appear in the tree.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ClipcueConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
