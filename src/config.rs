//! Configuration module for environment variables and application settings

use std::env;
use anyhow::{Context, Result, anyhow};
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// Azure OpenAI chat completion settings
    pub llm: LlmConfig,

    /// Amadeus flight data settings
    pub amadeus: AmadeusConfig,

    /// Exchange rate provider settings
    pub exchange: ExchangeConfig,

    /// Server configuration
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct AmadeusConfig {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Read at startup, no request currently needs it
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Timeout applied to every outbound HTTP call
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when any of the Azure OpenAI endpoint, key or deployment is unset,
    /// so the server never starts without a usable completion provider.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (endpoint, api_key, deployment) = match (
            non_empty("AZURE_OPENAI_ENDPOINT"),
            non_empty("AZURE_OPENAI_KEY"),
            non_empty("AZURE_OPENAI_DEPLOYMENT_NAME"),
        ) {
            (Some(endpoint), Some(key), Some(deployment)) => (endpoint, key, deployment),
            _ => {
                return Err(anyhow!(
                    "AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_KEY, and AZURE_OPENAI_DEPLOYMENT_NAME must be set as environment variables."
                ));
            }
        };

        let endpoint = Url::parse(&endpoint)
            .with_context(|| format!("AZURE_OPENAI_ENDPOINT is not a valid URL: {}", endpoint))?;

        let port = non_empty("PORT")
            .or_else(|| non_empty("SERVER_PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            llm: LlmConfig {
                endpoint,
                api_key,
                deployment,
                api_version: non_empty("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| "2024-02-15-preview".to_string()),
            },

            amadeus: AmadeusConfig {
                base_url: non_empty("AMADEUS_BASE_URL")
                    .unwrap_or_else(|| "https://test.api.amadeus.com".to_string()),
                client_id: non_empty("AMADEUS_API_KEY"),
                client_secret: non_empty("AMADEUS_API_SECRET"),
            },

            exchange: ExchangeConfig {
                base_url: non_empty("EXCHANGE_API_BASE_URL")
                    .unwrap_or_else(|| "https://api.exchangerate-api.com".to_string()),
                api_key: non_empty("EXCHANGE_API_KEY"),
            },

            server: ServerConfig {
                host: non_empty("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                request_timeout_secs: non_empty("HTTP_TIMEOUT_SECS")
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            },
        })
    }
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
        move |key: &str| map.get(key).cloned()
    }

    const LLM_VARS: [(&str, &str); 3] = [
        ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/"),
        ("AZURE_OPENAI_KEY", "secret"),
        ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt35turbo16k"),
    ];

    #[test]
    fn test_missing_llm_settings_fail_fast() {
        let err = Config::from_lookup(lookup_from(&LLM_VARS[..2])).unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_DEPLOYMENT_NAME"));

        let mut blank = LLM_VARS.to_vec();
        blank[1] = ("AZURE_OPENAI_KEY", "  ");
        assert!(Config::from_lookup(lookup_from(&blank)).is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&LLM_VARS)).unwrap();

        assert_eq!(config.llm.deployment, "gpt35turbo16k");
        assert_eq!(config.llm.api_version, "2024-02-15-preview");
        assert_eq!(config.amadeus.base_url, "https://test.api.amadeus.com");
        assert!(config.amadeus.client_id.is_none());
        assert_eq!(config.exchange.base_url, "https://api.exchangerate-api.com");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 30);
    }

    #[test]
    fn test_port_prefers_platform_variable() {
        let mut vars = LLM_VARS.to_vec();
        vars.push(("SERVER_PORT", "8080"));
        vars.push(("PORT", "5000"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut vars = LLM_VARS.to_vec();
        vars[0] = ("AZURE_OPENAI_ENDPOINT", "not a url");
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());
    }
}
