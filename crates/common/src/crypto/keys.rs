use pem::{EncodeConfig, LineEnding, Pem};
use rand::{CryptoRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use super::legacy;

/// PEM tag for PKCS#1 private keys
pub const PRIVATE_KEY_TAG: &str = "RSA PRIVATE KEY";
/// PEM tag written for public keys. The body is PKIX (SubjectPublicKeyInfo).
pub const PUBLIC_KEY_TAG: &str = "RSA PUBLIC KEY";
/// PEM tag for PKIX public keys written by other tools
pub const PKIX_PUBLIC_KEY_TAG: &str = "PUBLIC KEY";
/// PEM tag for X.509 certificates
pub const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Default modulus size for generated key pairs
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Errors that can occur while generating, encoding or decoding keys
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("key generation failed: {0}")]
    Generation(#[source] rsa::Error),
    #[error("key encoding failed: {0}")]
    Encoding(String),
    #[error("private key does not match its public key: {0}")]
    Inconsistent(#[source] rsa::Error),
}

fn encode_pem(tag: &str, contents: &[u8]) -> String {
    let block = Pem::new(tag, contents);
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

fn parse_blocks(bytes: &[u8]) -> Result<Vec<Pem>, KeyError> {
    let blocks = pem::parse_many(bytes)
        .map_err(|e| KeyError::InvalidKeyFormat(format!("failed to parse PEM: {e}")))?;
    if blocks.is_empty() {
        return Err(KeyError::InvalidKeyFormat("no PEM block found".into()));
    }
    Ok(blocks)
}

/// An RSA key pair as loaded from a key store.
///
/// The public half is always present. The private half is present when the
/// material came from a private key, and absent when only a public key or a
/// certificate was distributed. When present it is validated against the
/// public half on construction.
#[derive(Debug, Clone)]
pub struct KeyPair {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl KeyPair {
    /// Generate a new key pair with a `bits` sized modulus
    pub fn generate<R>(rng: &mut R, bits: usize) -> Result<Self, KeyError>
    where
        R: CryptoRng + RngCore,
    {
        let private = RsaPrivateKey::new(rng, bits).map_err(KeyError::Generation)?;
        Ok(Self::from_private(private))
    }

    /// Build a pair from a private key, deriving the public half
    pub fn from_private(private: RsaPrivateKey) -> Self {
        Self {
            public: private.to_public_key(),
            private: Some(private),
        }
    }

    /// Build a public-only pair
    pub fn from_public(public: RsaPublicKey) -> Self {
        Self {
            public,
            private: None,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private.as_ref()
    }

    /// Size of the modulus in bits
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    /// Encode the pair as PEM: the PKCS#1 private key when present,
    /// otherwise the PKIX public key.
    pub fn to_pem(&self) -> Result<String, KeyError> {
        match &self.private {
            Some(private) => private_key_to_pem(private),
            None => public_key_to_pem(&self.public),
        }
    }

    /// Parse a pair from PEM key material.
    ///
    /// A private key block yields a full pair. Otherwise the first public key
    /// or certificate block yields a public-only pair.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, KeyError> {
        match private_key_from_pem(bytes) {
            Ok(private) => Ok(Self::from_private(private)),
            Err(_) => public_key_from_pem(bytes).map(Self::from_public),
        }
    }
}

/// Encode a private key as a PKCS#1 `RSA PRIVATE KEY` block
pub fn private_key_to_pem(private: &RsaPrivateKey) -> Result<String, KeyError> {
    let der = private
        .to_pkcs1_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(encode_pem(PRIVATE_KEY_TAG, der.as_bytes()))
}

/// Encode a public key as a PKIX block
pub fn public_key_to_pem(public: &RsaPublicKey) -> Result<String, KeyError> {
    let der = public
        .to_public_key_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(encode_pem(PUBLIC_KEY_TAG, der.as_bytes()))
}

/// Decode the first `RSA PRIVATE KEY` block in `bytes`.
///
/// Blocks carrying legacy `Proc-Type: 4,ENCRYPTED` headers are decrypted with
/// an empty passphrase before parsing.
///
/// # Errors
///
/// Returns [`KeyError::InvalidKeyFormat`] if there is no such block or its
/// contents are not a PKCS#1 key.
pub fn private_key_from_pem(bytes: &[u8]) -> Result<RsaPrivateKey, KeyError> {
    let blocks = parse_blocks(bytes)?;
    let block = blocks
        .iter()
        .find(|block| block.tag() == PRIVATE_KEY_TAG)
        .ok_or_else(|| KeyError::InvalidKeyFormat("no RSA PRIVATE KEY block found".into()))?;

    let private = if legacy::is_encrypted(block) {
        tracing::warn!("decrypting legacy encrypted private key with an empty passphrase");
        let der = legacy::decrypt_block(block, b"")?;
        RsaPrivateKey::from_pkcs1_der(&der)
    } else {
        RsaPrivateKey::from_pkcs1_der(block.contents())
    }
    .map_err(|e| KeyError::InvalidKeyFormat(format!("not a PKCS#1 private key: {e}")))?;

    private.validate().map_err(KeyError::Inconsistent)?;
    Ok(private)
}

/// Extract the RSA public key embedded in a DER encoded X.509 certificate
pub fn public_key_from_certificate_der(der: &[u8]) -> Result<RsaPublicKey, KeyError> {
    let cert = Certificate::from_der(der)
        .map_err(|e| KeyError::InvalidKeyFormat(format!("invalid certificate: {e}")))?;
    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| KeyError::InvalidKeyFormat(format!("invalid certificate key: {e}")))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| KeyError::InvalidKeyFormat(format!("certificate key is not RSA: {e}")))
}

/// Extract the RSA public key from the first `CERTIFICATE` block in `bytes`
pub fn public_key_from_certificate(bytes: &[u8]) -> Result<RsaPublicKey, KeyError> {
    let blocks = parse_blocks(bytes)?;
    let block = blocks
        .iter()
        .find(|block| block.tag() == CERTIFICATE_TAG)
        .ok_or_else(|| KeyError::InvalidKeyFormat("no CERTIFICATE block found".into()))?;
    public_key_from_certificate_der(block.contents())
}

/// Decode public key material.
///
/// Accepts, in order of preference within `bytes`: a certificate, a public
/// key block (PKIX, or PKCS#1 under the `RSA PUBLIC KEY` tag), or a private
/// key from which the public half is derived.
pub fn public_key_from_pem(bytes: &[u8]) -> Result<RsaPublicKey, KeyError> {
    let blocks = parse_blocks(bytes)?;

    for block in &blocks {
        match block.tag() {
            CERTIFICATE_TAG => return public_key_from_certificate_der(block.contents()),
            PKIX_PUBLIC_KEY_TAG => {
                return RsaPublicKey::from_public_key_der(block.contents())
                    .map_err(|e| KeyError::InvalidKeyFormat(format!("invalid public key: {e}")))
            }
            PUBLIC_KEY_TAG => {
                return RsaPublicKey::from_public_key_der(block.contents())
                    .or_else(|_| RsaPublicKey::from_pkcs1_der(block.contents()))
                    .map_err(|e| KeyError::InvalidKeyFormat(format!("invalid public key: {e}")))
            }
            _ => {}
        }
    }

    if blocks.iter().any(|block| block.tag() == PRIVATE_KEY_TAG) {
        return private_key_from_pem(bytes).map(|private| private.to_public_key());
    }

    Err(KeyError::InvalidKeyFormat(
        "no certificate, public key or private key block found".into(),
    ))
}
