//! SVM "exact" scheme: fee-payer signing and submission of
//! client-built Solana transactions.
//!
//! The client serializes a transaction whose fee payer is the
//! facilitator's keypair and leaves the fee-payer signature slot empty.
//! Verification simulates the transaction; settlement signs slot zero
//! and submits it.

use std::time::Duration;

use base64::Engine;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;

use crate::error::SchemeError;
use crate::payment::{PaymentPayload, PaymentRequirements};
use crate::response::{SettleResponse, VerifyResponse};

/// Decode a base58 secret into a Solana keypair.
pub fn keypair_from_base58(secret: &str) -> Result<Keypair, SchemeError> {
    let bytes = bs58::decode(secret)
        .into_vec()
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid base58 secret: {e}")))?;
    if bytes.len() != 64 {
        return Err(SchemeError::InvalidPayload(format!(
            "secret key must be 64 bytes, got {}",
            bytes.len()
        )));
    }
    Keypair::from_bytes(&bytes)
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid secret key: {e}")))
}

/// Fee-payer address for a base58 secret, without holding on to the key.
pub fn fee_payer_from_base58(secret: &str) -> Result<String, SchemeError> {
    Ok(keypair_from_base58(secret)?.pubkey().to_string())
}

fn decode_transaction(encoded: &str) -> Result<VersionedTransaction, SchemeError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid base64 transaction: {e}")))?;
    bincode::deserialize(&bytes)
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid transaction encoding: {e}")))
}

/// A fee-payer identity bound to one network's RPC endpoint.
pub struct SvmSigner {
    keypair: Keypair,
    pubkey: Pubkey,
    rpc: RpcClient,
}

impl std::fmt::Debug for SvmSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvmSigner")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

impl SvmSigner {
    pub fn from_base58(secret: &str, rpc_url: &str) -> Result<Self, SchemeError> {
        let keypair = keypair_from_base58(secret)?;
        let pubkey = keypair.pubkey();
        let rpc = RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());
        Ok(SvmSigner { keypair, pubkey, rpc })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    pub fn address(&self) -> String {
        self.pubkey.to_string()
    }

    /// Current block height at the signer's endpoint, bounded by `timeout`.
    pub async fn block_height(&self, timeout: Duration) -> Result<u64, SchemeError> {
        tokio::time::timeout(timeout, self.rpc.get_block_height())
            .await
            .map_err(|_| SchemeError::Timeout("getBlockHeight".to_string()))?
            .map_err(|e| SchemeError::Chain(format!("getBlockHeight failed: {e}")))
    }
}

/// Check that the transaction's fee payer is the facilitator's key.
/// The inner `Err` is an invalid-reason string, not an operational error.
fn check_fee_payer(
    tx: &VersionedTransaction,
    signer: &SvmSigner,
) -> Result<Result<(), &'static str>, SchemeError> {
    if tx.signatures.is_empty() {
        return Err(SchemeError::InvalidPayload(
            "transaction has no signature slots".to_string(),
        ));
    }
    let fee_payer = tx
        .message
        .static_account_keys()
        .first()
        .ok_or_else(|| SchemeError::InvalidPayload("transaction has no accounts".to_string()))?;
    if *fee_payer != signer.pubkey {
        return Ok(Err("fee payer does not match facilitator"));
    }
    Ok(Ok(()))
}

/// Verify an SVM payment by simulating it at the signer's endpoint.
pub async fn verify(
    signer: &SvmSigner,
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    rpc_timeout: Duration,
) -> Result<VerifyResponse, SchemeError> {
    if let Some(reason) = payload.pairing_error(requirements) {
        return Ok(VerifyResponse::invalid(reason));
    }

    let p = payload.svm()?;
    let tx = decode_transaction(&p.transaction)?;
    if let Err(reason) = check_fee_payer(&tx, signer)? {
        return Ok(VerifyResponse::invalid(reason));
    }

    let sim = tokio::time::timeout(rpc_timeout, signer.rpc.simulate_transaction(&tx))
        .await
        .map_err(|_| SchemeError::Timeout("simulateTransaction".to_string()))?
        .map_err(|e| SchemeError::Chain(format!("simulateTransaction failed: {e}")))?;

    if let Some(err) = sim.value.err {
        return Ok(VerifyResponse::invalid(format!("simulation failed: {err}")));
    }

    tracing::info!(
        network = %payload.network,
        fee_payer = %signer.pubkey,
        "payment verification succeeded"
    );

    // The paying wallet is buried in the token instruction, not the fee
    // payer slot, so no payer is reported for SVM payments.
    Ok(VerifyResponse {
        is_valid: true,
        invalid_reason: None,
        payer: None,
    })
}

/// Settle an SVM payment: sign the fee-payer slot and submit.
pub async fn settle(
    signer: &SvmSigner,
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    settle_timeout: Duration,
) -> Result<SettleResponse, SchemeError> {
    if let Some(reason) = payload.pairing_error(requirements) {
        return Ok(SettleResponse::failed(reason, None, &payload.network));
    }

    let p = payload.svm()?;
    let mut tx = decode_transaction(&p.transaction)?;
    if let Err(reason) = check_fee_payer(&tx, signer)? {
        return Ok(SettleResponse::failed(reason, None, &payload.network));
    }

    let message_bytes = tx.message.serialize();
    tx.signatures[0] = signer.keypair.sign_message(&message_bytes);

    let signature = tokio::time::timeout(
        settle_timeout,
        signer.rpc.send_and_confirm_transaction(&tx),
    )
    .await
    .map_err(|_| SchemeError::Timeout("sendTransaction".to_string()))?
    .map_err(|e| SchemeError::Chain(format!("sendTransaction failed: {e}")))?;

    tracing::info!(
        network = %payload.network,
        fee_payer = %signer.pubkey,
        signature = %signature,
        "payment settled"
    );

    Ok(SettleResponse::settled(
        signature.to_string(),
        None,
        &payload.network,
    ))
}
