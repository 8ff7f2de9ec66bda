//! Concurrent RPC health probes for every credentialed network.
//!
//! Each probe builds its own client and catches its own failures, so
//! one dead endpoint cannot mask or delay another network's result.

use std::collections::BTreeMap;
use std::time::Instant;

use alloy::providers::Provider;
use futures::future::join_all;
use relay402::{Network, SchemeError};
use serde::Serialize;

use crate::config::FacilitatorConfig;
use crate::error::FacilitatorError;
use crate::metrics;
use crate::provisioner::{self, VerifyClient};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkHealth {
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub networks: BTreeMap<String, NetworkHealth>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.networks.values().all(|n| n.healthy)
    }
}

async fn block_height(
    config: &FacilitatorConfig,
    network: Network,
) -> Result<u64, FacilitatorError> {
    match provisioner::provision_verify_client(config, network)? {
        VerifyClient::Evm(provider) => {
            let height = tokio::time::timeout(config.rpc_timeout, provider.get_block_number())
                .await
                .map_err(|_| SchemeError::Timeout("getBlockNumber".to_string()))
                .and_then(|r| {
                    r.map_err(|e| SchemeError::Chain(format!("getBlockNumber failed: {e}")))
                })?;
            Ok(height)
        }
        VerifyClient::Svm(signer) => Ok(signer.block_height(config.rpc_timeout).await?),
    }
}

async fn probe(config: &FacilitatorConfig, network: Network) -> NetworkHealth {
    let started = Instant::now();
    let result = block_height(config, network).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let health = match result {
        // A zero height means the endpoint answered without a usable chain.
        Ok(height) if height > 0 => NetworkHealth {
            healthy: true,
            latency_ms,
            error: None,
        },
        Ok(_) => NetworkHealth {
            healthy: false,
            latency_ms,
            error: Some("endpoint reported block height 0".to_string()),
        },
        Err(e) => NetworkHealth {
            healthy: false,
            latency_ms,
            error: Some(e.to_string()),
        },
    };

    let label = if health.healthy { "ok" } else { "fail" };
    metrics::RPC_PROBES
        .with_label_values(&[network.id(), label])
        .inc();
    if let Some(error) = &health.error {
        tracing::warn!(network = %network, latency_ms, error = %error, "rpc probe failed");
    }
    health
}

/// Probe every network whose family has credentials, concurrently.
pub async fn check_all(config: &FacilitatorConfig) -> HealthReport {
    let probes = Network::ALL
        .into_iter()
        .filter(|network| config.family_configured(network.family()))
        .map(|network| async move { (network.id().to_string(), probe(config, network).await) });

    HealthReport {
        networks: join_all(probes).await.into_iter().collect(),
    }
}
