//! EC key generation, message signing, and signature verification.
//!
//! Keys travel as opaque PEM blobs (PKCS#8 for private keys, SPKI for
//! public keys) so callers never handle curve-specific types. Signatures
//! are DER-encoded ECDSA over a SHA-256 digest of the message.

use elliptic_curve::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use k256::ecdsa::signature::{DigestSigner, DigestVerifier};
use once_cell::sync::OnceCell;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{ChainError, Result};

/// Curve used when the caller does not name one.
pub const DEFAULT_CURVE: &str = "secp256k1";

/// A private/public key pair in PEM encoding.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub privkey_pem: Vec<u8>,
    pub pubkey_pem: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Curve {
    Secp256k1,
    NistP256,
}

impl Curve {
    fn from_name(name: &str) -> Result<Curve> {
        match name {
            "secp256k1" => Ok(Curve::Secp256k1),
            "prime256v1" | "secp256r1" | "P-256" => Ok(Curve::NistP256),
            other => Err(ChainError::Crypto(format!("unsupported curve: {other}"))),
        }
    }
}

static CRYPTO_INIT: OnceCell<()> = OnceCell::new();

/// Initializes the crypto subsystem. Safe to call repeatedly; only the
/// first call does any work.
pub fn crypto_init() -> Result<()> {
    CRYPTO_INIT
        .get_or_try_init(|| {
            let mut probe = [0u8; 32];
            OsRng
                .try_fill_bytes(&mut probe)
                .map_err(|e| ChainError::Crypto(format!("entropy source unavailable: {e}")))?;
            Ok(())
        })
        .map(|_| ())
}

/// Releases process-wide crypto resources. The underlying providers hold
/// no global state, so this is a no-op kept for lifecycle symmetry with
/// [`crypto_init`]; call it at most once near process exit.
pub fn crypto_shutdown() {}

/// Generates a fresh EC key pair on the named curve.
pub fn generate_ec_keypair(curve_name: &str) -> Result<KeyPair> {
    match Curve::from_name(curve_name)? {
        Curve::Secp256k1 => {
            let secret = k256::SecretKey::random(&mut OsRng);
            let privkey_pem = secret
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| ChainError::Crypto(format!("private key encoding failed: {e}")))?;
            let pubkey_pem = secret
                .public_key()
                .to_public_key_pem(LineEnding::LF)
                .map_err(|e| ChainError::Crypto(format!("public key encoding failed: {e}")))?;
            Ok(KeyPair {
                privkey_pem: privkey_pem.as_bytes().to_vec(),
                pubkey_pem: pubkey_pem.into_bytes(),
            })
        }
        Curve::NistP256 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            let privkey_pem = secret
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| ChainError::Crypto(format!("private key encoding failed: {e}")))?;
            let pubkey_pem = secret
                .public_key()
                .to_public_key_pem(LineEnding::LF)
                .map_err(|e| ChainError::Crypto(format!("public key encoding failed: {e}")))?;
            Ok(KeyPair {
                privkey_pem: privkey_pem.as_bytes().to_vec(),
                pubkey_pem: pubkey_pem.into_bytes(),
            })
        }
    }
}

/// Generates a key pair on the default curve.
pub fn generate_default_keypair() -> Result<KeyPair> {
    generate_ec_keypair(DEFAULT_CURVE)
}

/// Signs `message` with the PEM private key; returns a DER signature.
///
/// Key-parse failures are fatal to the caller, per the signing contract.
pub fn sign_message(privkey_pem: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let pem = std::str::from_utf8(privkey_pem)
        .map_err(|_| ChainError::Crypto("private key is not valid PEM text".to_string()))?;

    if let Ok(secret) = k256::SecretKey::from_pkcs8_pem(pem) {
        let signing_key = k256::ecdsa::SigningKey::from(&secret);
        let signature: k256::ecdsa::Signature = signing_key
            .try_sign_digest(prehash(message))
            .map_err(|e| ChainError::Crypto(format!("signing failed: {e}")))?;
        return Ok(signature.to_der().as_bytes().to_vec());
    }

    if let Ok(secret) = p256::SecretKey::from_pkcs8_pem(pem) {
        let signing_key = p256::ecdsa::SigningKey::from(&secret);
        let signature: p256::ecdsa::Signature = signing_key
            .try_sign_digest(prehash(message))
            .map_err(|e| ChainError::Crypto(format!("signing failed: {e}")))?;
        return Ok(signature.to_der().as_bytes().to_vec());
    }

    Err(ChainError::Crypto(
        "unable to parse private key PEM".to_string(),
    ))
}

/// Verifies a DER signature against the PEM public key and message.
///
/// Never fails: unparseable keys and ill-formed signatures return `false`.
pub fn verify_message(pubkey_pem: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(pem) = std::str::from_utf8(pubkey_pem) else {
        return false;
    };

    if let Ok(public) = k256::PublicKey::from_public_key_pem(pem) {
        let Ok(signature) = k256::ecdsa::Signature::from_der(signature) else {
            return false;
        };
        let verifying_key = k256::ecdsa::VerifyingKey::from(&public);
        return verifying_key.verify_digest(prehash(message), &signature).is_ok();
    }

    if let Ok(public) = p256::PublicKey::from_public_key_pem(pem) {
        let Ok(signature) = p256::ecdsa::Signature::from_der(signature) else {
            return false;
        };
        let verifying_key = p256::ecdsa::VerifyingKey::from(&public);
        return verifying_key.verify_digest(prehash(message), &signature).is_ok();
    }

    false
}

fn prehash(message: &[u8]) -> Sha256 {
    let mut digest = Sha256::new();
    digest.update(message);
    digest
}
