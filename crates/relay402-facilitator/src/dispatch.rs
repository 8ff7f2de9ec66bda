//! Request dispatch: classify the network, check family credentials,
//! provision an identity, invoke the scheme, normalize failures.
//!
//! Validation failures never reach an RPC endpoint: classification and
//! the credential check run before any client is constructed. Settle
//! outcomes are logged in full here and never retried.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use relay402::{
    evm, svm, Network, PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse,
};
use sha2::{Digest, Sha256};

use crate::config::FacilitatorConfig;
use crate::error::FacilitatorError;
use crate::metrics;
use crate::provisioner::{self, SettleSigner, VerifyClient};

/// The one place a wire network identifier becomes a [`Network`].
fn classify(id: &str) -> Result<Network, FacilitatorError> {
    Ok(id.parse::<Network>()?)
}

/// Stable fingerprint of a payment payload, used to key the in-flight
/// settlement table.
pub fn payload_fingerprint(payload: &PaymentPayload) -> Result<[u8; 32], FacilitatorError> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|e| FacilitatorError::MalformedRequest(format!("payload not hashable: {e}")))?;
    Ok(Sha256::digest(&bytes).into())
}

/// Exclusive claim on one payment's settlement, released on drop so an
/// error path can never leave a payment permanently stuck.
struct SettlementClaim<'a> {
    in_flight: &'a DashMap<[u8; 32], ()>,
    fingerprint: [u8; 32],
}

impl Drop for SettlementClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.fingerprint);
    }
}

pub struct Dispatcher {
    config: Arc<FacilitatorConfig>,
    in_flight: DashMap<[u8; 32], ()>,
}

impl Dispatcher {
    pub fn new(config: Arc<FacilitatorConfig>) -> Self {
        Self {
            config,
            in_flight: DashMap::new(),
        }
    }

    pub async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, FacilitatorError> {
        let started = Instant::now();
        let network = match classify(&requirements.network) {
            Ok(network) => network,
            Err(e) => {
                metrics::VERIFY_REQUESTS
                    .with_label_values(&["unknown", "rejected"])
                    .inc();
                return Err(e);
            }
        };
        let custom_rpc = self.config.rpc_endpoint(network).custom;

        let result = self.verify_on(network, payload, requirements).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) => {
                let label = if outcome.is_valid { "valid" } else { "invalid" };
                metrics::VERIFY_REQUESTS
                    .with_label_values(&[network.id(), label])
                    .inc();
                tracing::info!(
                    network = %network,
                    custom_rpc,
                    elapsed_ms,
                    valid = outcome.is_valid,
                    reason = outcome.invalid_reason.as_deref().unwrap_or(""),
                    "verification complete"
                );
            }
            Err(e) => {
                metrics::VERIFY_REQUESTS
                    .with_label_values(&[network.id(), "error"])
                    .inc();
                tracing::warn!(
                    network = %network,
                    custom_rpc,
                    elapsed_ms,
                    error = %e,
                    "verification error"
                );
            }
        }
        result
    }

    async fn verify_on(
        &self,
        network: Network,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, FacilitatorError> {
        let family = network.family();
        if !self.config.family_configured(family) {
            return Err(FacilitatorError::CredentialsNotConfigured(family));
        }
        match provisioner::provision_verify_client(&self.config, network)? {
            VerifyClient::Evm(provider) => Ok(evm::verify(
                &provider,
                network,
                payload,
                requirements,
                self.config.rpc_timeout,
            )
            .await?),
            VerifyClient::Svm(signer) => {
                Ok(svm::verify(&signer, payload, requirements, self.config.rpc_timeout).await?)
            }
        }
    }

    pub async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, FacilitatorError> {
        let started = Instant::now();
        let network = match classify(&requirements.network) {
            Ok(network) => network,
            Err(e) => {
                metrics::SETTLE_REQUESTS
                    .with_label_values(&["unknown", "rejected"])
                    .inc();
                return Err(e);
            }
        };
        let custom_rpc = self.config.rpc_endpoint(network).custom;

        let result = self.settle_on(network, payload, requirements).await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        match &result {
            Ok(outcome) => {
                let label = if outcome.success { "settled" } else { "failed" };
                metrics::SETTLE_REQUESTS
                    .with_label_values(&[network.id(), label])
                    .inc();
                metrics::SETTLE_LATENCY
                    .with_label_values(&[label])
                    .observe(elapsed.as_secs_f64());
                tracing::info!(
                    network = %network,
                    custom_rpc,
                    elapsed_ms,
                    success = outcome.success,
                    transaction = outcome.transaction.as_deref().unwrap_or(""),
                    payer = outcome.payer.as_deref().unwrap_or(""),
                    reason = outcome.error_reason.as_deref().unwrap_or(""),
                    "settlement complete"
                );
            }
            Err(e) => {
                metrics::SETTLE_REQUESTS
                    .with_label_values(&[network.id(), "error"])
                    .inc();
                metrics::SETTLE_LATENCY
                    .with_label_values(&["error"])
                    .observe(elapsed.as_secs_f64());
                tracing::warn!(
                    network = %network,
                    custom_rpc,
                    elapsed_ms,
                    error = %e,
                    "settlement error"
                );
            }
        }
        result
    }

    async fn settle_on(
        &self,
        network: Network,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, FacilitatorError> {
        let family = network.family();
        if !self.config.family_configured(family) {
            return Err(FacilitatorError::CredentialsNotConfigured(family));
        }

        // Claim is held across the whole settlement attempt.
        let _claim = self.claim_settlement(payload)?;

        match provisioner::provision_settle_signer(&self.config, network)? {
            SettleSigner::Evm(provider) => Ok(evm::settle(
                &provider,
                network,
                payload,
                requirements,
                self.config.rpc_timeout,
                self.config.settle_timeout,
            )
            .await?),
            SettleSigner::Svm(signer) => {
                Ok(svm::settle(&signer, payload, requirements, self.config.settle_timeout).await?)
            }
        }
    }

    fn claim_settlement(
        &self,
        payload: &PaymentPayload,
    ) -> Result<SettlementClaim<'_>, FacilitatorError> {
        use dashmap::mapref::entry::Entry;
        let fingerprint = payload_fingerprint(payload)?;
        match self.in_flight.entry(fingerprint) {
            Entry::Occupied(_) => Err(FacilitatorError::SettlementInFlight),
            Entry::Vacant(v) => {
                v.insert(());
                Ok(SettlementClaim {
                    in_flight: &self.in_flight,
                    fingerprint,
                })
            }
        }
    }
}
