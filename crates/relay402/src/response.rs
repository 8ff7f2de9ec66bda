use serde::{Deserialize, Serialize};

/// Outcome of a verification request.
///
/// `payer` is the recovered payer address for EVM verifications; SVM
/// verifications leave it unset (the payer is buried in scheme-specific
/// instruction data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResponse {
    pub fn valid(payer: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            payer: Some(payer.into()),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            payer: None,
        }
    }

    pub fn invalid_with_payer(reason: impl Into<String>, payer: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            payer: Some(payer.into()),
        }
    }
}

/// Outcome of a settlement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Transaction hash (EVM) or signature (SVM), if one was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub network: String,
}

impl SettleResponse {
    pub fn settled(transaction: impl Into<String>, payer: Option<String>, network: &str) -> Self {
        Self {
            success: true,
            error_reason: None,
            payer,
            transaction: Some(transaction.into()),
            network: network.to_string(),
        }
    }

    pub fn failed(reason: impl Into<String>, payer: Option<String>, network: &str) -> Self {
        Self {
            success: false,
            error_reason: Some(reason.into()),
            payer,
            transaction: None,
            network: network.to_string(),
        }
    }
}

/// One advertised (scheme, network) capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    /// SVM kinds carry `{"feePayer": ...}` so clients can build
    /// transactions the facilitator will sponsor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Body of the capability announcement endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedResponse {
    pub kinds: Vec<SupportedKind>,
}
