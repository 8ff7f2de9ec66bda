//! EIP-712 domain construction and signature recovery for EIP-3009
//! authorizations.
//!
//! The signing domain is the token contract's: its `name` and `version`
//! travel in the payment requirements (`extra.name` / `extra.version`), the
//! chain id comes from the network registry, and the verifying contract is
//! the asset address.

use alloy::primitives::{Address, Signature, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};

use crate::error::SchemeError;
use crate::TransferWithAuthorization;

/// Domain name used when the requirements carry no `extra.name`.
pub const DEFAULT_DOMAIN_NAME: &str = "USD Coin";

/// Domain version used when the requirements carry no `extra.version`.
pub const DEFAULT_DOMAIN_VERSION: &str = "2";

/// Build the EIP-712 domain for an authorization.
pub fn authorization_domain(
    name: &str,
    version: &str,
    chain_id: u64,
    token: Address,
) -> Eip712Domain {
    Eip712Domain {
        name: Some(std::borrow::Cow::Owned(name.to_string())),
        version: Some(std::borrow::Cow::Owned(version.to_string())),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(token),
        salt: None,
    }
}

/// Compute the EIP-712 signing hash for an authorization under a domain.
pub fn signing_hash(auth: &TransferWithAuthorization, domain: &Eip712Domain) -> B256 {
    auth.eip712_signing_hash(domain)
}

/// secp256k1 curve order N / 2; signatures with s > this are malleable (EIP-2).
const SECP256K1_N_DIV_2: U256 = U256::from_limbs([
    0xBFD25E8CD0364140,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0x7FFFFFFFFFFFFFFF,
]);

/// Recover the signer of an authorization.
/// Rejects high-s signatures to prevent malleability (EIP-2).
pub fn recover_signer(
    auth: &TransferWithAuthorization,
    signature_bytes: &[u8],
    domain: &Eip712Domain,
) -> Result<Address, SchemeError> {
    if signature_bytes.len() != 65 {
        return Err(SchemeError::Signature(format!(
            "signature must be 65 bytes, got {}",
            signature_bytes.len()
        )));
    }

    let sig = Signature::from_raw(signature_bytes)
        .map_err(|e| SchemeError::Signature(format!("invalid signature: {e}")))?;

    if sig.s() > SECP256K1_N_DIV_2 {
        return Err(SchemeError::Signature(
            "high-s signature rejected (EIP-2 malleability)".to_string(),
        ));
    }

    let hash = auth.eip712_signing_hash(domain);
    sig.recover_address_from_prehash(&hash)
        .map_err(|e| SchemeError::Signature(format!("recovery failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, FixedBytes};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    fn test_domain() -> Eip712Domain {
        authorization_domain(
            DEFAULT_DOMAIN_NAME,
            DEFAULT_DOMAIN_VERSION,
            84532,
            address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
        )
    }

    #[test]
    fn sign_and_recover_round_trip() {
        let signer = PrivateKeySigner::random();
        let auth = TransferWithAuthorization {
            from: signer.address(),
            to: Address::ZERO,
            value: U256::from(1000u64),
            validAfter: U256::ZERO,
            validBefore: U256::from(u64::MAX),
            nonce: FixedBytes::ZERO,
        };

        let domain = test_domain();
        let sig = signer.sign_hash_sync(&signing_hash(&auth, &domain)).unwrap();
        let recovered = recover_signer(&auth, &sig.as_bytes(), &domain).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn tampered_value_recovers_a_different_address() {
        let signer = PrivateKeySigner::random();
        let mut auth = TransferWithAuthorization {
            from: signer.address(),
            to: Address::ZERO,
            value: U256::from(1000u64),
            validAfter: U256::ZERO,
            validBefore: U256::from(u64::MAX),
            nonce: FixedBytes::ZERO,
        };

        let domain = test_domain();
        let sig = signer.sign_hash_sync(&signing_hash(&auth, &domain)).unwrap();

        auth.value = U256::from(2000u64);
        let recovered = recover_signer(&auth, &sig.as_bytes(), &domain).unwrap();
        assert_ne!(recovered, signer.address());
    }

    #[test]
    fn wrong_length_signatures_are_rejected() {
        let auth = TransferWithAuthorization {
            from: Address::ZERO,
            to: Address::ZERO,
            value: U256::ZERO,
            validAfter: U256::ZERO,
            validBefore: U256::ZERO,
            nonce: FixedBytes::ZERO,
        };
        let err = recover_signer(&auth, &[0u8; 64], &test_domain()).unwrap_err();
        assert!(err.to_string().contains("65 bytes"));
    }

    #[test]
    fn high_s_signatures_are_rejected() {
        // r = 1, s = N/2 + 1, v = 27
        let mut bytes = [0u8; 65];
        bytes[31] = 1;
        let high_s =
            alloy::hex::decode("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a1")
                .unwrap();
        bytes[32..64].copy_from_slice(&high_s);
        bytes[64] = 27;

        let auth = TransferWithAuthorization {
            from: Address::ZERO,
            to: Address::ZERO,
            value: U256::ZERO,
            validAfter: U256::ZERO,
            validBefore: U256::ZERO,
            nonce: FixedBytes::ZERO,
        };
        let err = recover_signer(&auth, &bytes, &test_domain()).unwrap_err();
        assert!(err.to_string().contains("high-s"));
    }
}
