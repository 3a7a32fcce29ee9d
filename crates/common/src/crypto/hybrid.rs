//! RSA-OAEP + AES-256-GCM envelope encryption
//!
//! # Wire Format
//!
//! ```text
//! [ rsa_len: u16 BE ][ RSA-OAEP(session key): rsa_len bytes ][ AES-GCM ciphertext || tag ]
//! ```
//!
//! The GCM nonce is not part of the blob: it is always zero, see
//! [`SessionKey`](super::SessionKey).

use rand::{CryptoRng, RngCore};
use rsa::{RsaPrivateKey, RsaPublicKey};

use super::session::{SessionKey, TAG_SIZE};
use super::CryptoError;

/// Size of the big-endian length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// A borrowed view over a serialized envelope.
///
/// Construction through [`EncryptedBlob::parse`] guarantees the length
/// prefix is consistent with the buffer and the sealed segment is large
/// enough to hold a GCM tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedBlob<'a> {
    wrapped_key: &'a [u8],
    sealed: &'a [u8],
}

impl<'a> EncryptedBlob<'a> {
    /// Split `bytes` into its wrapped-key and sealed segments.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedCiphertext`] if the buffer is shorter
    /// than the length prefix, shorter than the advertised RSA segment, or
    /// leaves fewer than [`TAG_SIZE`] bytes for the sealed payload.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, CryptoError> {
        if bytes.len() < LENGTH_PREFIX_SIZE {
            return Err(CryptoError::MalformedCiphertext(format!(
                "{} bytes is shorter than the length prefix",
                bytes.len()
            )));
        }
        let rsa_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let rest = &bytes[LENGTH_PREFIX_SIZE..];
        if rest.len() < rsa_len {
            return Err(CryptoError::MalformedCiphertext(format!(
                "wrapped key needs {} bytes, only {} remain",
                rsa_len,
                rest.len()
            )));
        }
        let (wrapped_key, sealed) = rest.split_at(rsa_len);
        if sealed.len() < TAG_SIZE {
            return Err(CryptoError::MalformedCiphertext(format!(
                "sealed payload is {} bytes, shorter than the {} byte tag",
                sealed.len(),
                TAG_SIZE
            )));
        }
        Ok(Self {
            wrapped_key,
            sealed,
        })
    }

    /// The RSA-OAEP wrapped session key
    pub fn wrapped_key(&self) -> &'a [u8] {
        self.wrapped_key
    }

    /// The AES-GCM ciphertext with its tag appended
    pub fn sealed(&self) -> &'a [u8] {
        self.sealed
    }

    /// Serialize the two segments into the wire format.
    pub fn encode(wrapped_key: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let rsa_len = u16::try_from(wrapped_key.len())
            .map_err(|_| CryptoError::WrappedKeyTooLarge(wrapped_key.len()))?;

        let mut out = Vec::with_capacity(LENGTH_PREFIX_SIZE + wrapped_key.len() + sealed.len());
        out.extend_from_slice(&rsa_len.to_be_bytes());
        out.extend_from_slice(wrapped_key);
        out.extend_from_slice(sealed);
        Ok(out)
    }
}

/// Encrypt `plaintext` for the holder of `public_key`.
///
/// A new session key is drawn from `rng` on every call and dropped once the
/// payload is sealed.
pub fn encrypt<R>(
    rng: &mut R,
    public_key: &RsaPublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError>
where
    R: CryptoRng + RngCore,
{
    let session_key = SessionKey::generate(rng);
    let wrapped_key = session_key.wrap(rng, public_key)?;
    let sealed = session_key.seal(plaintext)?;
    EncryptedBlob::encode(&wrapped_key, &sealed)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// # Errors
///
/// - [`CryptoError::MalformedCiphertext`] if the framing is inconsistent
/// - [`CryptoError::KeyMismatch`] if the session key cannot be unwrapped
/// - [`CryptoError::AuthenticationFailure`] if the GCM tag does not verify
pub fn decrypt<R>(
    rng: &mut R,
    private_key: &RsaPrivateKey,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError>
where
    R: CryptoRng + RngCore,
{
    let blob = EncryptedBlob::parse(ciphertext)?;
    let session_key = SessionKey::unwrap(rng, private_key, blob.wrapped_key())?;
    session_key.open(blob.sealed())
}
