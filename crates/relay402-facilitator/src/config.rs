use std::collections::HashMap;
use std::env;
use std::time::Duration;

use relay402::{Network, NetworkFamily};
use url::Url;

pub const DEFAULT_PORT: u16 = 4021;
pub const DEFAULT_RATE_LIMIT_RPM: u32 = 120;
const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 60_000;

/// Deployment environment, from `FACILITATOR_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// A resolved RPC endpoint for one network.
#[derive(Debug, Clone)]
pub struct RpcEndpoint {
    pub url: Url,
    /// True when the operator overrode the built-in default.
    pub custom: bool,
}

#[derive(Clone)]
pub struct FacilitatorConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Server port
    pub port: u16,
    /// EVM settlement key (None = EVM family unsupported)
    pub evm_private_key: Option<String>,
    /// SVM fee-payer key (None = SVM family unsupported)
    pub svm_private_key: Option<String>,
    /// Per-network RPC endpoints, resolved for every known network at load
    rpc_endpoints: HashMap<Network, RpcEndpoint>,
    /// Bound on individual RPC reads
    pub rpc_timeout: Duration,
    /// Bound on settlement confirmation
    pub settle_timeout: Duration,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics (None = endpoint disabled)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for FacilitatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorConfig")
            .field("environment", &self.environment)
            .field("port", &self.port)
            .field(
                "evm_private_key",
                &self.evm_private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "svm_private_key",
                &self.svm_private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("rpc_endpoints", &self.rpc_endpoints)
            .field("rpc_timeout", &self.rpc_timeout)
            .field("settle_timeout", &self.settle_timeout)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Environment variable that overrides `network`'s RPC endpoint,
/// e.g. `RPC_URL_BASE_SEPOLIA` for base-sepolia.
pub fn rpc_override_var(network: Network) -> String {
    format!("RPC_URL_{}", network.id().to_uppercase().replace('-', "_"))
}

impl FacilitatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. `from_env`
    /// feeds it process variables; tests feed it maps.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let evm_private_key = lookup("EVM_PRIVATE_KEY").filter(|s| !s.is_empty());
        let svm_private_key = lookup("SVM_PRIVATE_KEY").filter(|s| !s.is_empty());

        // Refuse to start a facilitator that could not settle anything.
        if evm_private_key.is_none() && svm_private_key.is_none() {
            return Err(ConfigError::NoCredentials);
        }

        let environment = match lookup("FACILITATOR_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidValue("FACILITATOR_ENV", other.to_string()))
            }
        };

        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT)?;
        let rate_limit_rpm = parse_or_default(&lookup, "RATE_LIMIT_RPM", DEFAULT_RATE_LIMIT_RPM)?;
        let rpc_timeout = Duration::from_millis(parse_or_default(
            &lookup,
            "RPC_TIMEOUT_MS",
            DEFAULT_RPC_TIMEOUT_MS,
        )?);
        let settle_timeout = Duration::from_millis(parse_or_default(
            &lookup,
            "SETTLE_TIMEOUT_MS",
            DEFAULT_SETTLE_TIMEOUT_MS,
        )?);

        let allowed_origins: Vec<String> = match lookup("ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => Vec::new(),
        };
        if environment == Environment::Production {
            if allowed_origins.is_empty() {
                return Err(ConfigError::MissingOrigins);
            }
            if allowed_origins.iter().any(|o| o == "*") {
                return Err(ConfigError::InvalidValue("ALLOWED_ORIGINS", "*".to_string()));
            }
        }

        let mut rpc_endpoints = HashMap::with_capacity(Network::ALL.len());
        for network in Network::ALL {
            let var = rpc_override_var(network);
            let (raw, custom) = match lookup(&var).filter(|s| !s.is_empty()) {
                Some(url) => (url, true),
                None => (network.default_rpc_url().to_string(), false),
            };
            let url = Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(var, raw))?;
            rpc_endpoints.insert(network, RpcEndpoint { url, custom });
        }

        let metrics_token = lookup("METRICS_TOKEN").filter(|s| !s.is_empty());

        Ok(Self {
            environment,
            port,
            evm_private_key,
            svm_private_key,
            rpc_endpoints,
            rpc_timeout,
            settle_timeout,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
        })
    }

    /// Whether payments on `family` networks can be served.
    pub fn family_configured(&self, family: NetworkFamily) -> bool {
        match family {
            NetworkFamily::Evm => self.evm_private_key.is_some(),
            NetworkFamily::Svm => self.svm_private_key.is_some(),
        }
    }

    /// RPC endpoint for `network`. Every known network gets one at load
    /// time, override or default.
    pub fn rpc_endpoint(&self, network: Network) -> &RpcEndpoint {
        &self.rpc_endpoints[&network]
    }
}

fn parse_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no payment credentials configured: set EVM_PRIVATE_KEY and/or SVM_PRIVATE_KEY")]
    NoCredentials,

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("invalid RPC URL in {0}: {1}")]
    InvalidUrl(String, String),

    #[error("ALLOWED_ORIGINS must list explicit origins when FACILITATOR_ENV=production")]
    MissingOrigins,
}
