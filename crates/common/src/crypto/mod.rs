//! Cryptographic primitives for postcrypt
//!
//! - **Envelope encryption**: every payload is sealed with AES-256-GCM under
//!   a fresh single-use session key, and the session key is wrapped with
//!   RSA-OAEP (SHA-256) for the recipient's public key. See [`hybrid`].
//! - **Key material**: RSA key pairs are persisted as PEM. Private keys are
//!   PKCS#1, public keys PKIX, or an X.509 certificate when only a
//!   certificate is distributed. See [`keys`].
//!
//! # Nonce Invariant
//!
//! The GCM nonce is always zero and never transmitted. This is sound only
//! because a [`SessionKey`] seals exactly one plaintext: it is generated per
//! call, consumed by [`SessionKey::seal`], and never stored or cached.

pub mod hybrid;
pub mod keys;
mod legacy;
mod session;

pub use hybrid::{decrypt, encrypt, EncryptedBlob};
pub use keys::{
    private_key_from_pem, private_key_to_pem, public_key_from_certificate, public_key_from_pem,
    public_key_to_pem, KeyError, KeyPair, DEFAULT_KEY_BITS,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use session::{SessionKey, OAEP_LABEL, SESSION_KEY_SIZE, TAG_SIZE};

/// Errors raised while sealing or opening an envelope
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),
    #[error("failed to unwrap session key (wrong private key): {0}")]
    KeyMismatch(#[source] rsa::Error),
    #[error("authentication failed: ciphertext was corrupted or sealed for another key")]
    AuthenticationFailure,
    #[error("unwrapped session key has {0} bytes, expected 32")]
    InvalidSessionKey(usize),
    #[error("failed to wrap session key: {0}")]
    Encryption(#[source] rsa::Error),
    #[error("payload of {0} bytes is too large to seal")]
    PayloadTooLarge(usize),
    #[error("wrapped session key of {0} bytes does not fit the length prefix")]
    WrappedKeyTooLarge(usize),
}
