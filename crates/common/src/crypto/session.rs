//! Single-use AES-256-GCM session keys
//!
//! Every sealed payload gets its own freshly generated [`SessionKey`]. Because a
//! key encrypts exactly one plaintext and is then dropped, the GCM nonce is
//! fixed to all zeroes and never transmitted. Both [`SessionKey::seal`] and
//! [`SessionKey::open`] take `self` by value so a key cannot be used twice.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::{CryptoRng, RngCore};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::CryptoError;

/// Size of the AES-256 session key in bytes
pub const SESSION_KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Domain separation label used for RSA-OAEP wrapping of session keys.
pub const OAEP_LABEL: &str = "9c96d939c7f30920e17c18d7e97cc7e85a2f03d78c6b563ff38964ee02477d94";

// Safe only because a session key never seals more than one plaintext.
const ZERO_NONCE: [u8; NONCE_SIZE] = [0; NONCE_SIZE];

fn oaep() -> Oaep {
    Oaep::new_with_label::<Sha256, _>(OAEP_LABEL)
}

/// A 256-bit symmetric key that lives for exactly one seal or open.
pub struct SessionKey(Zeroizing<[u8; SESSION_KEY_SIZE]>);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    /// Draw a fresh key from `rng`.
    pub fn generate<R>(rng: &mut R) -> Self
    where
        R: CryptoRng + RngCore,
    {
        let mut key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
        rng.fill_bytes(&mut key[..]);
        Self(key)
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SESSION_KEY_SIZE {
            return Err(CryptoError::InvalidSessionKey(bytes.len()));
        }
        let mut key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Wrap this key for `recipient` with RSA-OAEP (SHA-256, fixed label).
    pub fn wrap<R>(&self, rng: &mut R, recipient: &RsaPublicKey) -> Result<Vec<u8>, CryptoError>
    where
        R: CryptoRng + RngCore,
    {
        recipient
            .encrypt(rng, oaep(), &self.0[..])
            .map_err(CryptoError::Encryption)
    }

    /// Recover a key previously produced by [`SessionKey::wrap`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyMismatch`] when `private_key` is not the
    /// counterpart of the key used for wrapping, or the wrapped bytes are
    /// corrupted.
    pub fn unwrap<R>(
        rng: &mut R,
        private_key: &RsaPrivateKey,
        wrapped: &[u8],
    ) -> Result<Self, CryptoError>
    where
        R: CryptoRng + RngCore,
    {
        let bytes = Zeroizing::new(
            private_key
                .decrypt_blinded(rng, oaep(), wrapped)
                .map_err(CryptoError::KeyMismatch)?,
        );
        Self::from_slice(&bytes)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0[..]))
    }

    /// Encrypt `plaintext`, returning `ciphertext || tag`. Consumes the key.
    pub fn seal(self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .encrypt(Nonce::from_slice(&ZERO_NONCE), plaintext)
            .map_err(|_| CryptoError::PayloadTooLarge(plaintext.len()))
    }

    /// Decrypt and authenticate `ciphertext || tag`. Consumes the key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AuthenticationFailure`] if the tag does not
    /// verify (wrong key, corruption or tampering).
    pub fn open(self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .decrypt(Nonce::from_slice(&ZERO_NONCE), sealed)
            .map_err(|_| CryptoError::AuthenticationFailure)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seal_open() {
        let mut rng = StdRng::seed_from_u64(7);
        let key = SessionKey::generate(&mut rng);
        let copy = SessionKey::from_slice(&key.0[..]).unwrap();

        let sealed = key.seal(b"hello").unwrap();
        assert_eq!(sealed.len(), 5 + TAG_SIZE);
        assert_eq!(copy.open(&sealed).unwrap(), b"hello");
    }

    #[test]
    fn test_fresh_keys_differ() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = SessionKey::generate(&mut rng);
        let b = SessionKey::generate(&mut rng);
        assert_ne!(a.0[..], b.0[..]);

        // Same plaintext under two keys must not produce the same ciphertext
        // even though the nonce is fixed.
        assert_ne!(a.seal(b"same").unwrap(), b.seal(b"same").unwrap());
    }

    #[test]
    fn test_open_with_other_key_fails() {
        let mut rng = StdRng::seed_from_u64(11);
        let sealed = SessionKey::generate(&mut rng).seal(b"secret").unwrap();
        let other = SessionKey::generate(&mut rng);
        assert!(matches!(
            other.open(&sealed),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_from_slice_rejects_bad_length() {
        assert!(matches!(
            SessionKey::from_slice(&[0u8; 16]),
            Err(CryptoError::InvalidSessionKey(16))
        ));
    }
}
