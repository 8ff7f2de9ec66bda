use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use relay402::{NetworkFamily, SchemeError, UnknownNetwork};

/// Caller-facing failure taxonomy. Every request error funnels into one
/// of these variants, and the [`ResponseError`] impl below is the only
/// place where variants turn into HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// Request body failed validation, or the scheme rejected the payload
    #[error("{0}")]
    MalformedRequest(String),

    /// Network identifier not in the registry
    #[error(transparent)]
    UnsupportedNetwork(#[from] UnknownNetwork),

    /// Network recognized but its family has no configured secret
    #[error("{0} payments not supported")]
    CredentialsNotConfigured(NetworkFamily),

    /// A secret is configured but could not be turned into a signer
    #[error("{0} signer unavailable")]
    InvalidCredentials(NetworkFamily),

    /// An RPC call exceeded its deadline
    #[error("{0} timed out")]
    NetworkTimeout(String),

    /// An RPC call failed outright
    #[error("upstream RPC failure: {0}")]
    NetworkUnavailable(String),

    /// The same payment is already being settled
    #[error("settlement already in progress for this payment")]
    SettlementInFlight,
}

impl From<SchemeError> for FacilitatorError {
    fn from(e: SchemeError) -> Self {
        match e {
            SchemeError::Timeout(op) => FacilitatorError::NetworkTimeout(op),
            SchemeError::Chain(msg) => FacilitatorError::NetworkUnavailable(msg),
            SchemeError::Signature(_) | SchemeError::InvalidPayload(_) => {
                FacilitatorError::MalformedRequest(e.to_string())
            }
        }
    }
}

impl ResponseError for FacilitatorError {
    fn status_code(&self) -> StatusCode {
        match self {
            FacilitatorError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            FacilitatorError::UnsupportedNetwork(_) => StatusCode::BAD_REQUEST,
            FacilitatorError::CredentialsNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            FacilitatorError::InvalidCredentials(_) => StatusCode::SERVICE_UNAVAILABLE,
            FacilitatorError::NetworkTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            FacilitatorError::NetworkUnavailable(_) => StatusCode::BAD_GATEWAY,
            FacilitatorError::SettlementInFlight => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn unsupported_network_keeps_the_registry_message() {
        let err = FacilitatorError::from(UnknownNetwork("unknown-chain".to_string()));
        assert_eq!(err.to_string(), "Unsupported network: unknown-chain");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_family_credentials_name_the_family() {
        let err = FacilitatorError::CredentialsNotConfigured(NetworkFamily::Svm);
        assert_eq!(err.to_string(), "SVM payments not supported");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn scheme_errors_map_by_kind() {
        let timeout = FacilitatorError::from(SchemeError::Timeout("balanceOf".to_string()));
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.to_string(), "balanceOf timed out");

        let chain = FacilitatorError::from(SchemeError::Chain("connection refused".to_string()));
        assert_eq!(chain.status_code(), StatusCode::BAD_GATEWAY);

        let payload =
            FacilitatorError::from(SchemeError::InvalidPayload("bad value".to_string()));
        assert_eq!(payload.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(payload.to_string(), "invalid payload: bad value");
    }

    #[actix_rt::test]
    async fn error_bodies_are_a_single_error_field() {
        let response = FacilitatorError::SettlementInFlight.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "settlement already in progress for this payment"})
        );
    }
}
