use actix_web::{get, post, web, HttpRequest, HttpResponse};
use relay402::{NetworkFamily, PaymentPayload, PaymentRequirements};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::FacilitatorError;
use crate::health;
use crate::metrics;
use crate::state::AppState;
use crate::supported;

pub const SERVICE_NAME: &str = "relay402-facilitator";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_payload: PaymentPayload,
    pub payment_requirements: PaymentRequirements,
}

fn parse_request(body: &[u8]) -> Result<PaymentRequest, FacilitatorError> {
    serde_json::from_slice(body)
        .map_err(|e| FacilitatorError::MalformedRequest(format!("invalid request body: {e}")))
}

/// Constant-time byte comparison that does not leak input lengths or
/// content. Both inputs are hashed to fixed-length digests first, so
/// timing reveals neither length nor bytes.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

/// Process liveness and which payment families this deployment serves.
/// Touches no RPC endpoint.
#[get("/health")]
pub async fn health_live(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "evm": state.config.family_configured(NetworkFamily::Evm),
        "svm": state.config.family_configured(NetworkFamily::Svm),
    }))
}

/// Probe every credentialed network's RPC endpoint concurrently.
#[get("/health/rpc")]
pub async fn health_rpc(state: web::Data<AppState>) -> HttpResponse {
    let report = health::check_all(&state.config).await;
    let healthy = report.all_healthy();
    let body = serde_json::json!({
        "status": if healthy { "ok" } else { "degraded" },
        "networks": report.networks,
    });
    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

#[post("/verify")]
pub async fn verify(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, FacilitatorError> {
    let request = parse_request(&body)?;
    let outcome = state
        .dispatcher
        .verify(&request.payment_payload, &request.payment_requirements)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/settle")]
pub async fn settle(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, FacilitatorError> {
    let request = parse_request(&body)?;
    let outcome = state
        .dispatcher
        .settle(&request.payment_payload, &request.payment_requirements)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/supported")]
pub async fn supported_endpoint(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(supported::supported_kinds(&state.config))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.config.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| constant_time_eq(t.as_bytes(), token.as_bytes()))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "valid bearer token required for /metrics"
                }));
            }
        }
        None => {
            return HttpResponse::Forbidden().json(serde_json::json!({
                "error": "set METRICS_TOKEN to enable /metrics"
            }));
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
