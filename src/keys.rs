//! Identity keys, counterparty key derivation, and P2PKH scripts.
//!
//! Reaction payouts are paid to a key derived from the recipient's identity
//! key under the well-known "anyone" root (private scalar 1). Anyone who
//! knows the derivation prefix and suffix can recompute the key, so the
//! payout can be checked without any private material.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{FieldBytes, ProjectivePoint, PublicKey, Scalar, U256};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Key derivation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Not a hex SEC1 secp256k1 public key.
    #[error("invalid public key encoding")]
    InvalidPublicKey,

    /// Derivation landed on the point at infinity.
    #[error("derived key is the identity point")]
    DegenerateKey,
}

/// Protocol under which payout keys are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutProtocol {
    /// Security level (0, 1 or 2).
    pub security_level: u8,
    /// Protocol name; normalized to trimmed lower case when invoiced.
    pub protocol_name: String,
}

impl PayoutProtocol {
    /// Invoice string binding protocol and key id: `<level>-<name>-<key id>`.
    #[must_use]
    pub fn invoice_number(&self, key_id: &str) -> String {
        format!(
            "{}-{}-{}",
            self.security_level,
            self.protocol_name.trim().to_lowercase(),
            key_id
        )
    }
}

impl Default for PayoutProtocol {
    fn default() -> Self {
        Self {
            security_level: 2,
            protocol_name: "3241645161d8".to_string(),
        }
    }
}

/// Parses a hex SEC1 public key (compressed or uncompressed).
///
/// # Errors
///
/// Returns [`KeyError::InvalidPublicKey`] if the string is not hex or does
/// not encode a point on the curve.
pub fn parse_identity_key(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Derives the public key a counterparty receives under `key_id`, computed
/// from the "anyone" root.
///
/// `shared = counterparty · 1`, `h = HMAC-SHA256(compressed(shared), invoice)`,
/// `derived = counterparty + h·G`.
///
/// # Errors
///
/// Returns [`KeyError::DegenerateKey`] if the sum is the identity point.
pub fn derive_counterparty_key(
    counterparty: &PublicKey,
    protocol: &PayoutProtocol,
    key_id: &str,
) -> Result<PublicKey, KeyError> {
    let invoice = protocol.invoice_number(key_id);
    let shared_secret = counterparty.to_encoded_point(true);

    let mut mac = HmacSha256::new_from_slice(shared_secret.as_bytes())
        .map_err(|_| KeyError::InvalidPublicKey)?;
    mac.update(invoice.as_bytes());
    let digest: FieldBytes = mac.finalize().into_bytes();
    let tweak = <Scalar as Reduce<U256>>::reduce_bytes(&digest);

    let derived = counterparty.to_projective() + ProjectivePoint::GENERATOR * tweak;
    PublicKey::from_affine(derived.to_affine()).map_err(|_| KeyError::DegenerateKey)
}

/// RIPEMD-160 of SHA-256.
#[must_use]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

/// Standard single-signature locking script paying the compressed key.
#[must_use]
pub fn p2pkh_locking_script(key: &PublicKey) -> Vec<u8> {
    let compressed = key.to_encoded_point(true);
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
    script.extend_from_slice(&hash160(compressed.as_bytes()));
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// Hex of the compressed SEC1 encoding.
#[must_use]
pub fn to_compressed_hex(key: &PublicKey) -> String {
    hex::encode(key.to_encoded_point(true).as_bytes())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use k256::SecretKey;

    /// Compressed encoding of the curve generator.
    const GENERATOR_HEX: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn key(seed: u8) -> PublicKey {
        let Ok(secret) = SecretKey::from_slice(&[seed; 32]) else {
            panic!("valid secret");
        };
        secret.public_key()
    }

    #[test]
    fn parses_compressed_and_uncompressed() {
        let Ok(parsed) = parse_identity_key(GENERATOR_HEX) else {
            panic!("generator is a valid key");
        };
        assert_eq!(to_compressed_hex(&parsed), GENERATOR_HEX);

        let uncompressed = hex::encode(key(9).to_encoded_point(false).as_bytes());
        assert_eq!(parse_identity_key(&uncompressed), Ok(key(9)));
    }

    #[test]
    fn rejects_garbage_keys() {
        assert!(parse_identity_key("").is_err());
        assert!(parse_identity_key("not hex").is_err());
        assert!(parse_identity_key(&"05".repeat(33)).is_err());
        assert!(parse_identity_key(GENERATOR_HEX.get(..64).unwrap_or_default()).is_err());
    }

    #[test]
    fn invoice_number_normalizes_protocol_name() {
        let protocol = PayoutProtocol {
            security_level: 2,
            protocol_name: "  Forum Payouts ".to_string(),
        };
        assert_eq!(protocol.invoice_number("a b"), "2-forum payouts-a b");
    }

    #[test]
    fn derivation_is_deterministic() {
        let recipient = key(7);
        let protocol = PayoutProtocol::default();
        let first = derive_counterparty_key(&recipient, &protocol, "prefix suffix");
        let second = derive_counterparty_key(&recipient, &protocol, "prefix suffix");
        assert!(first.is_ok());
        assert_eq!(first, second);
    }

    #[test]
    fn derivation_depends_on_key_id_and_recipient() {
        let protocol = PayoutProtocol::default();
        let base = derive_counterparty_key(&key(7), &protocol, "a b");
        let other_id = derive_counterparty_key(&key(7), &protocol, "a c");
        let other_recipient = derive_counterparty_key(&key(8), &protocol, "a b");
        assert_ne!(base, other_id);
        assert_ne!(base, other_recipient);
        assert_ne!(base, Ok(key(7)));
    }

    #[test]
    fn derived_key_matches_definition() {
        let recipient = key(3);
        let protocol = PayoutProtocol::default();
        let Ok(derived) = derive_counterparty_key(&recipient, &protocol, "x y") else {
            panic!("derivation failed");
        };

        let Ok(mut mac) =
            HmacSha256::new_from_slice(recipient.to_encoded_point(true).as_bytes())
        else {
            panic!("hmac accepts any key length");
        };
        mac.update(b"2-3241645161d8-x y");
        let tweak = <Scalar as Reduce<U256>>::reduce_bytes(&mac.finalize().into_bytes());
        let expected = recipient.to_projective() + ProjectivePoint::GENERATOR * tweak;
        assert_eq!(derived.to_projective(), expected);
    }

    #[test]
    fn p2pkh_script_layout() {
        let script = p2pkh_locking_script(&key(5));
        assert_eq!(script.len(), 25);
        assert_eq!(script.get(..3), Some([OP_DUP, OP_HASH160, 20].as_slice()));
        assert_eq!(script.get(23..), Some([OP_EQUALVERIFY, OP_CHECKSIG].as_slice()));
    }

    #[test]
    fn hash160_of_empty_input() {
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
