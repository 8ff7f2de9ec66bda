//! Capability announcement: the scheme/network pairs this deployment
//! can actually serve, derived from which credentials are configured.

use relay402::{
    svm, Network, NetworkFamily, SupportedKind, SupportedResponse, SCHEME_EXACT, X402_VERSION,
};

use crate::config::FacilitatorConfig;

fn family_networks(family: NetworkFamily) -> impl Iterator<Item = Network> {
    Network::ALL
        .into_iter()
        .filter(move |network| network.family() == family)
}

/// Announced kinds. A family with no credential is absent; a family
/// whose signer cannot be derived is omitted too, without hiding the
/// other family's rows.
pub fn supported_kinds(config: &FacilitatorConfig) -> SupportedResponse {
    let mut kinds = Vec::new();

    if config.family_configured(NetworkFamily::Evm) {
        for network in family_networks(NetworkFamily::Evm) {
            kinds.push(SupportedKind {
                x402_version: X402_VERSION,
                scheme: SCHEME_EXACT.to_string(),
                network: network.id().to_string(),
                extra: None,
            });
        }
    }

    if let Some(key) = config.svm_private_key.as_deref() {
        match svm::fee_payer_from_base58(key) {
            Ok(fee_payer) => {
                for network in family_networks(NetworkFamily::Svm) {
                    kinds.push(SupportedKind {
                        x402_version: X402_VERSION,
                        scheme: SCHEME_EXACT.to_string(),
                        network: network.id().to_string(),
                        extra: Some(serde_json::json!({ "feePayer": fee_payer })),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SVM fee payer unavailable, omitting SVM networks");
            }
        }
    }

    SupportedResponse { kinds }
}
