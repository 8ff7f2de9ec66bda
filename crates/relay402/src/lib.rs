//! x402 payment protocol core for a multi-network facilitator.
//!
//! A facilitator sits between a client that signs payment payloads and a
//! resource server that wants to be paid without running chain
//! infrastructure. This crate provides the protocol pieces the facilitator
//! needs:
//!
//! - Wire types for payment payloads, requirements, and responses
//!   ([`PaymentPayload`], [`PaymentRequirements`], [`VerifyResponse`],
//!   [`SettleResponse`])
//! - The network registry ([`Network`], [`NetworkFamily`]), the single
//!   source of truth for which chains exist and how they are classified
//! - Per-family verify/settle operations: [`evm`] implements the "exact"
//!   scheme over EIP-3009 `transferWithAuthorization`, [`svm`] over
//!   fee-payer-sponsored Solana transactions
//!
//! The HTTP surface (dispatch, health checks, capability announcement) lives
//! in the companion `relay402-facilitator` crate.

pub mod eip712;
pub mod error;
pub mod evm;
pub mod network;
pub mod payment;
pub mod response;
pub mod svm;

use alloy::sol;

// EIP-3009 authorization struct. The sol! macro derives SolStruct, which
// provides eip712_signing_hash() with the canonical type hash.
sol! {
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

// The subset of the EIP-3009 token surface the facilitator touches.
// authorizationState is the on-chain replay guard: once an authorization
// nonce settles, the contract reports it used.
sol! {
    #[sol(rpc)]
    interface Eip3009Token {
        function balanceOf(address owner) external view returns (uint256);
        function authorizationState(address authorizer, bytes32 nonce) external view returns (bool);
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }
}

// Re-exports
pub use error::SchemeError;
pub use network::{Network, NetworkFamily, UnknownNetwork};
pub use payment::{
    EvmAuthorization, ExactEvmPayload, ExactPaymentPayload, ExactSvmPayload, PaymentPayload,
    PaymentRequirements, SCHEME_EXACT, X402_VERSION,
};
pub use response::{SettleResponse, SupportedKind, SupportedResponse, VerifyResponse};
pub use svm::SvmSigner;
