//! Host configuration.
//!
//! Every option is a CLI flag that also reads an environment variable, so
//! the host runs unchanged from a shell, a compose file or a test.

use std::collections::HashSet;
use std::time::Duration;

use crate::core::FallbackPolicy;
use crate::error::StartupError;
use crate::llm::provider::{OpenAiConfig, DEEPSEEK_BASE_URL, DEEPSEEK_DEFAULT_MODEL};
use crate::planner::DEFAULT_PROMPT_LIMIT;

pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

#[derive(Debug, Clone, clap::Args)]
pub struct HostArgs {
    /// Completion-service API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Completion-service base URL (requests go to <url>/chat/completions)
    #[arg(long, default_value = DEEPSEEK_BASE_URL, env = "MCP_HOST_LLM_URL")]
    pub llm_url: String,

    /// Completion model
    #[arg(long, default_value = DEEPSEEK_DEFAULT_MODEL, env = "MCP_HOST_LLM_MODEL")]
    pub llm_model: String,

    /// Completion request timeout in seconds
    #[arg(long, default_value = "60", env = "MCP_HOST_LLM_TIMEOUT")]
    pub llm_timeout: u64,

    /// Backend tool-servers in priority order: name=url,name=url
    #[arg(long, env = "MCP_HOST_BACKENDS")]
    pub backends: Option<String>,

    /// Users backend address, used when --backends is not given
    #[arg(long, default_value = "http://0.0.0.0:8090", env = "USERS_MCP_SERVER_ADDR")]
    pub users_addr: String,

    /// Calculator backend address, used when --backends is not given
    #[arg(long, default_value = "http://0.0.0.0:9000", env = "CALC_MCP_SERVER_ADDR")]
    pub calc_addr: String,

    /// Path of the MCP endpoint on every backend
    #[arg(long, default_value = "/mcp", env = "MCP_HOST_MCP_PATH")]
    pub mcp_path: String,

    /// Connection attempts per backend at startup
    #[arg(long, default_value = "5", env = "MCP_HOST_CONNECT_ATTEMPTS")]
    pub connect_attempts: u32,

    /// Delay between connection attempts in milliseconds
    #[arg(long, default_value = "1000", env = "MCP_HOST_CONNECT_DELAY_MS")]
    pub connect_delay_ms: u64,

    /// Per-query deadline in seconds
    #[arg(long, env = "MCP_HOST_QUERY_TIMEOUT")]
    pub query_timeout: Option<u64>,

    /// Maximum size of the rendered system prompt in bytes
    #[arg(long, default_value_t = DEFAULT_PROMPT_LIMIT, env = "MCP_HOST_PROMPT_LIMIT")]
    pub prompt_limit: usize,

    /// Fallback policy: transport | any
    #[arg(long, default_value = "transport", env = "MCP_HOST_FALLBACK")]
    pub fallback: FallbackPolicy,
}

/// One backend as configured: a name and the full MCP endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub name: String,
    pub url: String,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub llm: OpenAiConfig,
    /// Priority order.
    pub backends: Vec<BackendEndpoint>,
    pub connect_attempts: u32,
    pub connect_delay: Duration,
    pub query_timeout: Option<Duration>,
    pub prompt_limit: usize,
    pub fallback: FallbackPolicy,
}

impl HostArgs {
    pub fn into_config(self) -> Result<HostConfig, StartupError> {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StartupError::MissingCredential(API_KEY_ENV.to_string()))?;

        if self.prompt_limit == 0 {
            return Err(StartupError::InvalidConfig(
                "prompt limit must be greater than zero".to_string(),
            ));
        }
        if self.llm_url.trim().is_empty() {
            return Err(StartupError::InvalidConfig(
                "completion-service URL is empty".to_string(),
            ));
        }

        let pairs = match self.backends.as_deref() {
            Some(list) => parse_backends(list)?,
            None => vec![
                ("users".to_string(), self.users_addr.trim().to_string()),
                ("calc".to_string(), self.calc_addr.trim().to_string()),
            ],
        };
        let backends = pairs
            .into_iter()
            .map(|(name, address)| BackendEndpoint {
                url: endpoint_url(&address, &self.mcp_path),
                name,
            })
            .collect();

        Ok(HostConfig {
            llm: OpenAiConfig {
                api_key,
                base_url: self.llm_url.trim().trim_end_matches('/').to_string(),
                default_model: self.llm_model,
                timeout: Duration::from_secs(self.llm_timeout),
            },
            backends,
            connect_attempts: self.connect_attempts,
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            query_timeout: self.query_timeout.map(Duration::from_secs),
            prompt_limit: self.prompt_limit,
            fallback: self.fallback,
        })
    }
}

/// Parses `name=url,name=url` into ordered pairs.
pub fn parse_backends(input: &str) -> Result<Vec<(String, String)>, StartupError> {
    let mut seen = HashSet::new();
    let mut backends = Vec::new();

    for pair in input.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (name, url) = pair.split_once('=').ok_or_else(|| {
            StartupError::InvalidConfig(format!("backend '{pair}' is not of the form name=url"))
        })?;
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(StartupError::InvalidConfig(format!(
                "backend '{pair}' has an empty name or url"
            )));
        }
        if !seen.insert(name.to_string()) {
            return Err(StartupError::InvalidConfig(format!(
                "backend '{name}' is configured twice"
            )));
        }
        backends.push((name.to_string(), url.to_string()));
    }

    if backends.is_empty() {
        return Err(StartupError::InvalidConfig(
            "no backends configured".to_string(),
        ));
    }
    Ok(backends)
}

fn endpoint_url(address: &str, path: &str) -> String {
    let base = address.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() || path == "/" {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        host: HostArgs,
    }

    fn args(extra: &[&str]) -> HostArgs {
        let mut argv = vec!["mcp-host", "--api-key", "sk-test"];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().host
    }

    #[test]
    fn test_parse_backends_keeps_order() {
        let parsed = parse_backends("go=http://a:8090, python=http://b:9000,").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("go".to_string(), "http://a:8090".to_string()),
                ("python".to_string(), "http://b:9000".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_backends_rejects_bad_input() {
        assert!(parse_backends("").is_err());
        assert!(parse_backends(" , ").is_err());
        assert!(parse_backends("go").is_err());
        assert!(parse_backends("=http://a").is_err());
        assert!(parse_backends("go=http://a,go=http://b").is_err());
    }

    #[test]
    fn test_default_backends_get_mcp_path() {
        let mut host = args(&[]);
        host.backends = None;
        host.users_addr = "http://users:8090/".into();
        host.calc_addr = "http://calc:9000".into();
        host.mcp_path = "/mcp".into();
        let config = host.into_config().unwrap();
        assert_eq!(
            config.backends,
            vec![
                BackendEndpoint {
                    name: "users".into(),
                    url: "http://users:8090/mcp".into()
                },
                BackendEndpoint {
                    name: "calc".into(),
                    url: "http://calc:9000/mcp".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let mut host = args(&[]);
        host.api_key = None;
        assert!(matches!(
            host.into_config(),
            Err(StartupError::MissingCredential(ref name)) if name == API_KEY_ENV
        ));

        let mut host = args(&[]);
        host.api_key = Some("   ".into());
        assert!(matches!(
            host.into_config(),
            Err(StartupError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_flags_override_defaults() {
        let host = args(&[
            "--backends",
            "a=http://a:1",
            "--mcp-path",
            "rpc",
            "--fallback",
            "any",
            "--query-timeout",
            "30",
            "--llm-url",
            "http://llm.local/v1/",
        ]);
        let config = host.into_config().unwrap();
        assert_eq!(config.backends[0].url, "http://a:1/rpc");
        assert_eq!(config.fallback, FallbackPolicy::AnyFailure);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.llm.base_url, "http://llm.local/v1");
    }

    #[test]
    fn test_zero_prompt_limit_rejected() {
        let mut host = args(&[]);
        host.prompt_limit = 0;
        assert!(matches!(host.into_config(), Err(StartupError::InvalidConfig(_))));
    }
}
