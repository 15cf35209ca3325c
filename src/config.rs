use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8001/api";

/// Everything a suite run needs to know about its target.
///
/// Built once by `main` and handed to the runner; every field may be
/// overridden from a TOML file, missing fields keep their defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Root under which `/` and `/status` are resolved (e.g. `http://localhost:8001/api`).
    pub base_url: String,
    /// Origin sent with the CORS preflight.
    pub origin: String,
    /// Method requested in `Access-Control-Request-Method`.
    pub request_method: String,
    /// `client_name` posted when creating a status check.
    pub client_name: String,
    /// Expected `message` field of the health endpoint.
    pub expected_message: String,
    pub alive_timeout_secs: u64,
    /// Status codes that count as "the server is up".
    pub alive_statuses: Vec<u16>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            origin: "http://localhost:3000".to_string(),
            request_method: "GET".to_string(),
            client_name: "Portfolio Test Client".to_string(),
            expected_message: "Hello World".to_string(),
            alive_timeout_secs: 10,
            alive_statuses: vec![200, 404, 405],
        }
    }
}

impl SuiteConfig {
    /// Replace the base URL, dropping trailing slashes so paths join cleanly.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Load probe configuration from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<SuiteConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

fn parse_config(content: &str) -> anyhow::Result<SuiteConfig> {
    let config: SuiteConfig = toml::from_str(content)?;
    let base_url = config.base_url.clone();
    Ok(config.with_base_url(&base_url))
}

/// Resolve the effective configuration: defaults, then the optional file, then the CLI override.
pub fn resolve(config_path: Option<&Path>, base_url: Option<&str>) -> anyhow::Result<SuiteConfig> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => SuiteConfig::default(),
    };
    Ok(match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = SuiteConfig::default();
        assert_eq!(cfg.base_url, "http://localhost:8001/api");
        assert_eq!(cfg.alive_statuses, vec![200, 404, 405]);
        assert_eq!(cfg.alive_timeout_secs, 10);
        assert_eq!(cfg.expected_message, "Hello World");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = parse_config("base_url = \"http://staging:9000/api/\"\nclient_name = \"Acme\"\n").unwrap();
        assert_eq!(cfg.base_url, "http://staging:9000/api");
        assert_eq!(cfg.client_name, "Acme");
        assert_eq!(cfg.origin, "http://localhost:3000");
        assert_eq!(cfg.alive_statuses, vec![200, 404, 405]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = parse_config("base_uri = \"http://x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_base_url_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://from-file/api\"").unwrap();
        writeln!(file, "alive_timeout_secs = 3").unwrap();

        let cfg = resolve(Some(file.path()), Some("http://from-cli/api//")).unwrap();
        assert_eq!(cfg.base_url, "http://from-cli/api");
        assert_eq!(cfg.alive_timeout_secs, 3);
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let err = load_config(Path::new("/nonexistent/probe.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/probe.toml"));
    }
}
