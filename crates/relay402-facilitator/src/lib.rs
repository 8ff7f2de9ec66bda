//! x402 facilitator: verifies payment authorizations and settles on-chain.
//!
//! The facilitator receives verify and settle requests from resource
//! servers, classifies the target network, provisions the matching
//! credentialed identity, and executes the payment's scheme. Scheme
//! logic lives in the core [`relay402`] crate; this crate provides the
//! HTTP server, configuration, and request dispatch.
//!
//! # Modules
//!
//! - [`routes`]: HTTP endpoints (health, supported, verify, settle, metrics)
//! - [`config`]: Environment-derived [`FacilitatorConfig`](config::FacilitatorConfig)
//! - [`dispatch`]: Network-classifying verify/settle pipeline
//! - [`provisioner`]: Per-request RPC clients and signers
//! - [`health`]: Concurrent per-network RPC probes
//! - [`metrics`]: Prometheus metrics for verify/settle operations

pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod metrics;
pub mod provisioner;
pub mod routes;
pub mod state;
pub mod supported;
