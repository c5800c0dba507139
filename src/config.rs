use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub api_url: String,
    /// Result cap applied when a task input carries no `max_results`.
    pub max_results: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub max_papers_per_query: usize,
    pub request_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            search: SearchConfig {
                api_url: DEFAULT_ARXIV_API_URL.to_string(),
                max_results: DEFAULT_MAX_RESULTS,
                timeout_secs: 30,
            },
            http: HttpConfig {
                user_agent: default_user_agent(),
            },
            pipeline: PipelineConfig {
                max_papers_per_query: 5,
                request_delay_ms: 1000,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            server: ServerConfig {
                port: parse_or(&lookup, "PORT", defaults.server.port)?,
                host: lookup("HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: lookup("ALLOWED_ORIGINS")
                    .map(|raw| {
                        raw.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.server.cors_allowed_origins),
            },
            search: SearchConfig {
                api_url: lookup("ARXIV_API_URL").unwrap_or(defaults.search.api_url),
                max_results: parse_count_or(&lookup, "ARXIV_MAX_RESULTS", defaults.search.max_results)?,
                timeout_secs: parse_or(&lookup, "ARXIV_TIMEOUT_SECS", defaults.search.timeout_secs)?,
            },
            http: HttpConfig {
                user_agent: lookup("HTTP_USER_AGENT").unwrap_or(defaults.http.user_agent),
            },
            pipeline: PipelineConfig {
                max_papers_per_query: parse_count_or(
                    &lookup,
                    "PIPELINE_MAX_PAPERS",
                    defaults.pipeline.max_papers_per_query,
                )?,
                request_delay_ms: parse_or(
                    &lookup,
                    "PIPELINE_REQUEST_DELAY_MS",
                    defaults.pipeline.request_delay_ms,
                )?,
            },
        })
    }
}

fn default_user_agent() -> String {
    format!("paper-agents/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected.
fn parse_count_or<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value == 0 {
        anyhow::bail!("invalid value for {key}: must be at least 1");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.search.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.search.api_url, DEFAULT_ARXIV_API_URL);
        assert_eq!(config.server.port, 3000);
        assert!(config.http.user_agent.starts_with("paper-agents/"));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("ARXIV_MAX_RESULTS", "25"),
            ("ARXIV_API_URL", "http://localhost:9999/api/query"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test"),
            ("PIPELINE_REQUEST_DELAY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.search.max_results, 25);
        assert_eq!(config.search.api_url, "http://localhost:9999/api/query");
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.pipeline.request_delay_ms, 0);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("ARXIV_MAX_RESULTS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("ARXIV_MAX_RESULTS"));
    }

    #[test]
    fn test_zero_caps_are_rejected() {
        for key in ["ARXIV_MAX_RESULTS", "PIPELINE_MAX_PAPERS"] {
            let err = Config::from_lookup(lookup_from(&[(key, "0")])).unwrap_err();
            assert!(err.to_string().contains(key));
        }

        // Zero delay is a valid setting.
        let config = Config::from_lookup(lookup_from(&[("PIPELINE_REQUEST_DELAY_MS", "0")])).unwrap();
        assert_eq!(config.pipeline.request_delay_ms, 0);
    }
}
