//! Wire types for payment payloads and requirements.
//!
//! Field names follow the x402 wire format (camelCase). Addresses and
//! amounts stay as strings at this layer because their formats differ by
//! family; the per-family operations parse them.

use alloy::primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};

/// Protocol version this implementation speaks.
pub const X402_VERSION: u8 = 1;

/// The only scheme currently implemented.
pub const SCHEME_EXACT: &str = "exact";

/// What a resource server requires to consider a request paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    /// Network id, classified through the registry at dispatch time.
    pub network: String,
    /// Required amount in the asset's base units, as a decimal string.
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// Recipient address in the network's native format.
    pub pay_to: String,
    pub max_timeout_seconds: u64,
    /// Asset (token) address in the network's native format.
    pub asset: String,
    /// Scheme-specific extras: EIP-712 domain `{name, version}` for EVM,
    /// `{feePayer}` for SVM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// A signed payment authorization submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    pub payload: ExactPaymentPayload,
}

/// Family-specific payload body. Untagged: the EVM shape carries
/// `signature` + `authorization`, the SVM shape a single `transaction`
/// field, so the variants never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExactPaymentPayload {
    Evm(ExactEvmPayload),
    Svm(ExactSvmPayload),
}

/// EVM "exact" payload: an EIP-712 signature over an EIP-3009
/// TransferWithAuthorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    /// 65-byte r||s||v signature, 0x-prefixed hex.
    pub signature: String,
    pub authorization: EvmAuthorization,
}

/// The EIP-3009 authorization tuple as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmAuthorization {
    pub from: Address,
    pub to: Address,
    /// Amount in token base units, decimal string.
    pub value: String,
    /// Unix seconds, decimal string.
    pub valid_after: String,
    /// Unix seconds, decimal string.
    pub valid_before: String,
    pub nonce: FixedBytes<32>,
}

/// SVM "exact" payload: a base64-encoded, partially signed transaction
/// whose fee payer is the facilitator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactSvmPayload {
    pub transaction: String,
}

impl PaymentPayload {
    /// Scheme/version/network pairing checks shared by both families.
    /// Returns the invalid-reason string, or `None` when the pairing holds.
    pub fn pairing_error(&self, requirements: &PaymentRequirements) -> Option<&'static str> {
        if self.x402_version != X402_VERSION {
            return Some("unsupported x402 version");
        }
        if self.scheme != SCHEME_EXACT || requirements.scheme != SCHEME_EXACT {
            return Some("unsupported scheme");
        }
        if self.network != requirements.network {
            return Some("network mismatch between payload and requirements");
        }
        None
    }

    /// The EVM payload body, or an error if this payload is SVM-shaped.
    pub fn evm(&self) -> Result<&ExactEvmPayload, crate::SchemeError> {
        match &self.payload {
            ExactPaymentPayload::Evm(p) => Ok(p),
            ExactPaymentPayload::Svm(_) => Err(crate::SchemeError::InvalidPayload(
                "expected an EVM payload body for an EVM network".to_string(),
            )),
        }
    }

    /// The SVM payload body, or an error if this payload is EVM-shaped.
    pub fn svm(&self) -> Result<&ExactSvmPayload, crate::SchemeError> {
        match &self.payload {
            ExactPaymentPayload::Svm(p) => Ok(p),
            ExactPaymentPayload::Evm(_) => Err(crate::SchemeError::InvalidPayload(
                "expected an SVM payload body for an SVM network".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evm_payload_json() -> serde_json::Value {
        serde_json::json!({
            "x402Version": 1,
            "scheme": "exact",
            "network": "base-sepolia",
            "payload": {
                "signature": "0x1b2c",
                "authorization": {
                    "from": "0x857b06519E91e3A54538791bDbb0E22373e36b66",
                    "to": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                    "value": "10000",
                    "validAfter": "1740672089",
                    "validBefore": "1740672154",
                    "nonce": "0xf3746613c2d920b5fdabc0856f2aeb2d4f88ee6037b8cc5d04a71a4462f13480"
                }
            }
        })
    }

    #[test]
    fn evm_payload_deserializes_into_the_evm_variant() {
        let payload: PaymentPayload = serde_json::from_value(evm_payload_json()).unwrap();
        assert_eq!(payload.network, "base-sepolia");
        let evm = payload.evm().unwrap();
        assert_eq!(evm.authorization.value, "10000");
        assert!(payload.svm().is_err());
    }

    #[test]
    fn svm_payload_deserializes_into_the_svm_variant() {
        let payload: PaymentPayload = serde_json::from_value(serde_json::json!({
            "x402Version": 1,
            "scheme": "exact",
            "network": "solana-devnet",
            "payload": { "transaction": "AQAB" }
        }))
        .unwrap();
        let svm = payload.svm().unwrap();
        assert_eq!(svm.transaction, "AQAB");
        assert!(payload.evm().is_err());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let result: Result<PaymentPayload, _> = serde_json::from_value(serde_json::json!({
            "scheme": "exact",
            "network": "base-sepolia",
            "payload": { "transaction": "AQAB" }
        }));
        assert!(result.is_err()); // no x402Version
    }

    #[test]
    fn requirements_use_camel_case_on_the_wire() {
        let requirements = PaymentRequirements {
            scheme: "exact".to_string(),
            network: "sepolia".to_string(),
            max_amount_required: "1000".to_string(),
            resource: "https://api.example.com/data".to_string(),
            description: String::new(),
            mime_type: String::new(),
            output_schema: None,
            pay_to: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".to_string(),
            max_timeout_seconds: 60,
            asset: "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238".to_string(),
            extra: None,
        };
        let json = serde_json::to_value(&requirements).unwrap();
        assert!(json.get("maxAmountRequired").is_some());
        assert!(json.get("payTo").is_some());
        assert!(json.get("maxTimeoutSeconds").is_some());
        assert!(json.get("outputSchema").is_none()); // skipped when absent
    }

    #[test]
    fn pairing_rejects_mismatched_network_and_scheme() {
        let payload: PaymentPayload = serde_json::from_value(evm_payload_json()).unwrap();
        let mut requirements: PaymentRequirements = serde_json::from_value(serde_json::json!({
            "scheme": "exact",
            "network": "base-sepolia",
            "maxAmountRequired": "10000",
            "resource": "https://example.com",
            "description": "",
            "mimeType": "",
            "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
            "maxTimeoutSeconds": 60,
            "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
        }))
        .unwrap();

        assert_eq!(payload.pairing_error(&requirements), None);

        requirements.network = "sepolia".to_string();
        assert_eq!(
            payload.pairing_error(&requirements),
            Some("network mismatch between payload and requirements")
        );

        requirements.network = "base-sepolia".to_string();
        requirements.scheme = "subscription".to_string();
        assert_eq!(payload.pairing_error(&requirements), Some("unsupported scheme"));
    }
}
