use thiserror::Error;

/// Errors from the per-family verify/settle operations.
///
/// Semantic verification outcomes ("signature does not recover", "balance
/// too low") are NOT errors; they come back as `VerifyResponse` /
/// `SettleResponse` with a reason. This enum covers the cases where the
/// operation itself could not run to a conclusion.
#[derive(Error, Debug)]
pub enum SchemeError {
    /// Signature bytes could not be parsed or recovered.
    #[error("signature error: {0}")]
    Signature(String),

    /// An RPC call or on-chain operation failed.
    #[error("chain error: {0}")]
    Chain(String),

    /// The payload or requirements could not be interpreted for this family.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A network call exceeded its configured bound.
    #[error("{0} timed out")]
    Timeout(String),
}
