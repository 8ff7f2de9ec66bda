//! EVM "exact" scheme: verification and settlement of EIP-3009
//! `transferWithAuthorization` payments.
//!
//! Replay protection is the token contract's own `authorizationState`: a
//! settled nonce is marked used on-chain, so the facilitator keeps no state.

use std::time::Duration;

use alloy::primitives::{Address, Signature, B256, U256};
use alloy::providers::Provider;
use alloy::sol_types::Eip712Domain;

use crate::eip712;
use crate::error::SchemeError;
use crate::network::Network;
use crate::payment::{EvmAuthorization, PaymentPayload, PaymentRequirements};
use crate::response::{SettleResponse, VerifyResponse};
use crate::{Eip3009Token, TransferWithAuthorization};

/// Authorizations expiring within this many seconds are rejected at
/// verification time so a follow-up settlement still lands inside the
/// validity window.
const EXPIRY_GRACE_SECS: u64 = 6;

/// Authorization fields parsed out of their wire encoding.
struct ParsedAuthorization {
    auth: TransferWithAuthorization,
    value: U256,
    valid_after: u64,
    valid_before: u64,
}

fn parse_authorization(a: &EvmAuthorization) -> Result<ParsedAuthorization, SchemeError> {
    let value = a
        .value
        .parse::<U256>()
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid value: {e}")))?;
    let valid_after = a
        .valid_after
        .parse::<u64>()
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid validAfter: {e}")))?;
    let valid_before = a
        .valid_before
        .parse::<u64>()
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid validBefore: {e}")))?;

    Ok(ParsedAuthorization {
        auth: TransferWithAuthorization {
            from: a.from,
            to: a.to,
            value,
            validAfter: U256::from(valid_after),
            validBefore: U256::from(valid_before),
            nonce: a.nonce,
        },
        value,
        valid_after,
        valid_before,
    })
}

fn parse_address(field: &str, raw: &str) -> Result<Address, SchemeError> {
    raw.parse::<Address>()
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid {field} address: {e}")))
}

fn decode_signature(signature: &str) -> Result<Vec<u8>, SchemeError> {
    alloy::hex::decode(signature.strip_prefix("0x").unwrap_or(signature))
        .map_err(|e| SchemeError::Signature(format!("invalid hex signature: {e}")))
}

/// EIP-712 domain for the requirements' asset: name/version from
/// `extra`, chain id from the registry.
fn signing_domain(
    requirements: &PaymentRequirements,
    network: Network,
    token: Address,
) -> Result<Eip712Domain, SchemeError> {
    let chain_id = network.chain_id().ok_or_else(|| {
        SchemeError::InvalidPayload(format!("{network} is not an EVM network"))
    })?;
    let name = requirements
        .extra
        .as_ref()
        .and_then(|e| e.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or(eip712::DEFAULT_DOMAIN_NAME);
    let version = requirements
        .extra
        .as_ref()
        .and_then(|e| e.get("version"))
        .and_then(|v| v.as_str())
        .unwrap_or(eip712::DEFAULT_DOMAIN_VERSION);
    Ok(eip712::authorization_domain(name, version, chain_id, token))
}

fn now_unix() -> Result<u64, SchemeError> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| SchemeError::Chain(format!("system time error: {e}")))
}

/// Query the token balance of `owner`, bounded by `timeout`.
pub async fn balance_of<P: Provider>(
    provider: &P,
    token: Address,
    owner: Address,
    timeout: Duration,
) -> Result<U256, SchemeError> {
    let contract = Eip3009Token::new(token, provider);
    tokio::time::timeout(timeout, contract.balanceOf(owner).call())
        .await
        .map_err(|_| SchemeError::Timeout("balanceOf".to_string()))?
        .map_err(|e| SchemeError::Chain(format!("balanceOf failed: {e}")))
}

/// Query whether `nonce` has already been used by `authorizer`.
pub async fn authorization_state<P: Provider>(
    provider: &P,
    token: Address,
    authorizer: Address,
    nonce: alloy::primitives::FixedBytes<32>,
    timeout: Duration,
) -> Result<bool, SchemeError> {
    let contract = Eip3009Token::new(token, provider);
    tokio::time::timeout(timeout, contract.authorizationState(authorizer, nonce).call())
        .await
        .map_err(|_| SchemeError::Timeout("authorizationState".to_string()))?
        .map_err(|e| SchemeError::Chain(format!("authorizationState failed: {e}")))
}

/// Verify an EVM payment authorization against its requirements.
///
/// Checks run cheapest-first: pairing, wire parsing, validity window,
/// signature recovery, recipient/amount match, then the two on-chain reads
/// (balance and authorization state). Semantic failures come back as
/// `isValid: false` with a reason; only transport and parse problems error.
pub async fn verify<P: Provider>(
    provider: &P,
    network: Network,
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    rpc_timeout: Duration,
) -> Result<VerifyResponse, SchemeError> {
    if let Some(reason) = payload.pairing_error(requirements) {
        return Ok(VerifyResponse::invalid(reason));
    }

    let p = payload.evm()?;
    let parsed = parse_authorization(&p.authorization)?;
    let token = parse_address("asset", &requirements.asset)?;
    let pay_to = parse_address("payTo", &requirements.pay_to)?;
    let required = requirements
        .max_amount_required
        .parse::<U256>()
        .map_err(|e| SchemeError::InvalidPayload(format!("invalid maxAmountRequired: {e}")))?;

    let now = now_unix()?;
    if now < parsed.valid_after {
        return Ok(VerifyResponse::invalid("authorization not yet valid"));
    }
    if now + EXPIRY_GRACE_SECS > parsed.valid_before {
        return Ok(VerifyResponse::invalid("authorization expired"));
    }

    let domain = signing_domain(requirements, network, token)?;
    let sig_bytes = decode_signature(&p.signature)?;
    let recovered = eip712::recover_signer(&parsed.auth, &sig_bytes, &domain)?;
    if recovered != p.authorization.from {
        return Ok(VerifyResponse::invalid("invalid signature"));
    }

    let payer = p.authorization.from;
    if p.authorization.to != pay_to {
        return Ok(VerifyResponse::invalid_with_payer(
            "recipient does not match payTo",
            payer.to_string(),
        ));
    }
    if parsed.value < required {
        return Ok(VerifyResponse::invalid_with_payer(
            "authorized amount below required",
            payer.to_string(),
        ));
    }

    let balance = balance_of(provider, token, payer, rpc_timeout).await?;
    if balance < parsed.value {
        return Ok(VerifyResponse::invalid_with_payer(
            "insufficient balance",
            payer.to_string(),
        ));
    }

    let used = authorization_state(provider, token, payer, p.authorization.nonce, rpc_timeout).await?;
    if used {
        return Ok(VerifyResponse::invalid_with_payer(
            "authorization nonce already used",
            payer.to_string(),
        ));
    }

    tracing::info!(
        network = %network,
        payer = %payer,
        amount = %parsed.value,
        "payment verification succeeded"
    );

    Ok(VerifyResponse::valid(payer.to_string()))
}

/// Settle an EVM payment: re-verify, then submit
/// `transferWithAuthorization` from the facilitator's funded signer.
///
/// The submission is bounded by `rpc_timeout` and the receipt wait by
/// `settle_timeout`. A reverted receipt is a failed settlement, not an
/// error.
pub async fn settle<P: Provider>(
    provider: &P,
    network: Network,
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    rpc_timeout: Duration,
    settle_timeout: Duration,
) -> Result<SettleResponse, SchemeError> {
    let check = verify(provider, network, payload, requirements, rpc_timeout).await?;
    if !check.is_valid {
        return Ok(SettleResponse::failed(
            check.invalid_reason.unwrap_or_else(|| "verification failed".to_string()),
            check.payer,
            network.id(),
        ));
    }

    let p = payload.evm()?;
    let parsed = parse_authorization(&p.authorization)?;
    let token = parse_address("asset", &requirements.asset)?;
    let sig_bytes = decode_signature(&p.signature)?;
    let sig = Signature::from_raw(&sig_bytes)
        .map_err(|e| SchemeError::Signature(format!("invalid signature: {e}")))?;

    let v: u8 = 27 + sig.v() as u8;
    let r = B256::from(sig.r());
    let s = B256::from(sig.s());

    let contract = Eip3009Token::new(token, provider);
    let call = contract.transferWithAuthorization(
        p.authorization.from,
        p.authorization.to,
        parsed.value,
        parsed.auth.validAfter,
        parsed.auth.validBefore,
        p.authorization.nonce,
        v,
        r,
        s,
    );

    let pending = tokio::time::timeout(rpc_timeout, call.send())
        .await
        .map_err(|_| SchemeError::Timeout("transferWithAuthorization send".to_string()))?
        .map_err(|e| SchemeError::Chain(format!("transferWithAuthorization send failed: {e}")))?;

    let receipt = tokio::time::timeout(settle_timeout, pending.get_receipt())
        .await
        .map_err(|_| SchemeError::Timeout("transferWithAuthorization receipt".to_string()))?
        .map_err(|e| SchemeError::Chain(format!("transferWithAuthorization receipt failed: {e}")))?;

    let payer = p.authorization.from.to_string();
    if !receipt.status() {
        return Ok(SettleResponse::failed(
            "transferWithAuthorization reverted",
            Some(payer),
            network.id(),
        ));
    }

    tracing::info!(
        network = %network,
        payer = %p.authorization.from,
        amount = %parsed.value,
        tx = %receipt.transaction_hash,
        "payment settled"
    );

    Ok(SettleResponse::settled(
        receipt.transaction_hash.to_string(),
        Some(payer),
        network.id(),
    ))
}
