//! Per-request identities: read clients for verification, funded
//! signers for settlement.
//!
//! Construction never dials the endpoint. Key parsing failures are
//! logged with their cause and surfaced to callers as a generic
//! "signer unavailable" so secret material never leaks into responses.

use alloy::network::EthereumWallet;
use alloy::providers::{
    fillers::{
        BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    Identity, ProviderBuilder, RootProvider,
};
use alloy::signers::local::PrivateKeySigner;
use relay402::{Network, NetworkFamily, SvmSigner};

use crate::config::FacilitatorConfig;
use crate::error::FacilitatorError;

/// Concrete provider type from `ProviderBuilder::new().wallet(...).connect_http(...)`.
pub type WalletProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider,
>;

/// Read-side identity for one network. The SVM side carries the
/// fee-payer keypair because verification checks the transaction's fee
/// payer slot against it.
#[derive(Debug)]
pub enum VerifyClient {
    Evm(RootProvider),
    Svm(SvmSigner),
}

/// Settlement identity for one network.
#[derive(Debug)]
pub enum SettleSigner {
    Evm(WalletProvider),
    Svm(SvmSigner),
}

fn evm_signer(config: &FacilitatorConfig) -> Result<PrivateKeySigner, FacilitatorError> {
    let key = config
        .evm_private_key
        .as_deref()
        .ok_or(FacilitatorError::CredentialsNotConfigured(NetworkFamily::Evm))?;
    key.parse().map_err(|e| {
        tracing::error!(error = %e, "EVM private key rejected by signer");
        FacilitatorError::InvalidCredentials(NetworkFamily::Evm)
    })
}

/// SVM fee-payer signer bound to `network`'s RPC endpoint.
pub fn svm_signer(
    config: &FacilitatorConfig,
    network: Network,
) -> Result<SvmSigner, FacilitatorError> {
    let key = config
        .svm_private_key
        .as_deref()
        .ok_or(FacilitatorError::CredentialsNotConfigured(NetworkFamily::Svm))?;
    let endpoint = config.rpc_endpoint(network);
    SvmSigner::from_base58(key, endpoint.url.as_str()).map_err(|e| {
        tracing::error!(error = %e, "SVM private key rejected by signer");
        FacilitatorError::InvalidCredentials(NetworkFamily::Svm)
    })
}

/// Read-side client for one network. Even the EVM read path requires
/// the family to be credentialed: an uncredentialed family is not
/// served at all, verification included.
pub fn provision_verify_client(
    config: &FacilitatorConfig,
    network: Network,
) -> Result<VerifyClient, FacilitatorError> {
    let family = network.family();
    if !config.family_configured(family) {
        return Err(FacilitatorError::CredentialsNotConfigured(family));
    }
    match family {
        NetworkFamily::Evm => {
            let endpoint = config.rpc_endpoint(network);
            Ok(VerifyClient::Evm(RootProvider::new_http(
                endpoint.url.clone(),
            )))
        }
        NetworkFamily::Svm => Ok(VerifyClient::Svm(svm_signer(config, network)?)),
    }
}

pub fn provision_settle_signer(
    config: &FacilitatorConfig,
    network: Network,
) -> Result<SettleSigner, FacilitatorError> {
    match network.family() {
        NetworkFamily::Evm => {
            let signer = evm_signer(config)?;
            let endpoint = config.rpc_endpoint(network);
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(endpoint.url.clone());
            Ok(SettleSigner::Evm(provider))
        }
        NetworkFamily::Svm => Ok(SettleSigner::Svm(svm_signer(config, network)?)),
    }
}

/// Address of the configured EVM settlement signer, for startup logs
/// and capability announcements.
pub fn evm_signer_address(config: &FacilitatorConfig) -> Result<String, FacilitatorError> {
    Ok(evm_signer(config)?.address().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;

    const TEST_EVM_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config_from(pairs: Vec<(&'static str, String)>) -> FacilitatorConfig {
        FacilitatorConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn evm_read_client_needs_no_svm_credentials() {
        let config = config_from(vec![("EVM_PRIVATE_KEY", TEST_EVM_KEY.to_string())]);
        let client = provision_verify_client(&config, Network::Sepolia).unwrap();
        assert!(matches!(client, VerifyClient::Evm(_)));
    }

    #[test]
    fn svm_client_without_credentials_is_a_credential_failure() {
        let config = config_from(vec![("EVM_PRIVATE_KEY", TEST_EVM_KEY.to_string())]);
        let err = provision_verify_client(&config, Network::SolanaDevnet).unwrap_err();
        assert!(matches!(
            err,
            FacilitatorError::CredentialsNotConfigured(NetworkFamily::Svm)
        ));
    }

    #[test]
    fn evm_read_client_without_evm_credentials_is_refused() {
        let keypair = Keypair::new();
        let config = config_from(vec![("SVM_PRIVATE_KEY", keypair.to_base58_string())]);
        let err = provision_verify_client(&config, Network::Sepolia).unwrap_err();
        assert!(matches!(
            err,
            FacilitatorError::CredentialsNotConfigured(NetworkFamily::Evm)
        ));
    }

    #[test]
    fn svm_signer_binds_the_keypair_to_the_network() {
        let keypair = Keypair::new();
        let config = config_from(vec![("SVM_PRIVATE_KEY", keypair.to_base58_string())]);
        let signer = svm_signer(&config, Network::Solana).unwrap();
        assert_eq!(signer.pubkey(), keypair.pubkey());
    }

    #[test]
    fn malformed_evm_key_is_reported_generically() {
        let config = config_from(vec![("EVM_PRIVATE_KEY", "0xnot-a-key".to_string())]);
        let err = provision_settle_signer(&config, Network::Base).unwrap_err();
        assert!(matches!(
            err,
            FacilitatorError::InvalidCredentials(NetworkFamily::Evm)
        ));
        assert_eq!(err.to_string(), "EVM signer unavailable");
    }

    #[test]
    fn short_svm_key_is_reported_generically() {
        let short = bs58::encode([3u8; 32]).into_string();
        let config = config_from(vec![("SVM_PRIVATE_KEY", short)]);
        let err = provision_settle_signer(&config, Network::SolanaDevnet).unwrap_err();
        assert!(matches!(
            err,
            FacilitatorError::InvalidCredentials(NetworkFamily::Svm)
        ));
    }

    #[test]
    fn settle_signer_address_matches_the_key() {
        let config = config_from(vec![("EVM_PRIVATE_KEY", TEST_EVM_KEY.to_string())]);
        // First anvil dev account.
        assert_eq!(
            evm_signer_address(&config).unwrap(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }
}
