//! Marker substitution over decoded documents
//!
//! [`Rewriter::rewrite`] walks a document depth-first through its mappings
//! and replaces every string value that parses as a [`Marker`]:
//!
//! - `op:encrypt` values become `op:decrypt` markers carrying the unpadded
//!   base64url [`EncryptedBlob`](crate::crypto::EncryptedBlob)
//! - `op:decrypt` values become the plaintext, standard base64 encoded unless
//!   plain output is enabled
//!
//! The walk builds a new tree and leaves the input alone, so a failure part
//! way through never leaves a half rewritten document behind. Sequences and
//! other scalars are copied through untouched.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::{CryptoRng, RngCore};
use serde_yaml::{Mapping, Value};

use crate::crypto::{
    self, private_key_from_pem, public_key_from_pem, CryptoError, EncryptedBlob, KeyError,
};
use crate::keystore::{KeyStore, KeyStoreError, ScopeError, SecretScope};
use crate::marker::{Marker, Operation};

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error(transparent)]
    MalformedReference(#[from] ScopeError),
    #[error("payload is not valid base64url: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
    #[error("decrypted value is not valid UTF-8 and cannot be written as plain text")]
    NonUtf8Plaintext,
    /// Any of the above, located at a key path inside a document
    #[error("at {path}: {source}")]
    At {
        path: String,
        #[source]
        source: Box<RewriteError>,
    },
}

impl RewriteError {
    fn at(self, path: &str) -> Self {
        RewriteError::At {
            path: path.to_string(),
            source: Box::new(self),
        }
    }

    /// The underlying error, without location
    pub fn kind(&self) -> &RewriteError {
        match self {
            RewriteError::At { source, .. } => source.kind(),
            other => other,
        }
    }
}

/// Decode a marker payload. Trailing padding is tolerated.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(payload.trim().trim_end_matches('='))
}

/// Encode ciphertext as a marker payload
pub fn encode_payload(ciphertext: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(ciphertext)
}

/// Rewrites markers using key material from `K`.
///
/// Every marker names its own key: an empty `secret:` is an empty local path
/// or a malformed cluster reference, never a fallback scope. Holds no
/// per-document state, so one rewriter serves any number of
/// documents.
#[derive(Debug, Clone)]
pub struct Rewriter<K> {
    keys: K,
    plain: bool,
}

impl<K: KeyStore> Rewriter<K> {
    pub fn new(keys: K) -> Self {
        Self { keys, plain: false }
    }

    /// Write decrypted values as text instead of base64
    pub fn plain(mut self, plain: bool) -> Self {
        self.plain = plain;
        self
    }

    /// Rewrite every marker in `document`, returning the new tree.
    ///
    /// The first failing marker aborts the whole pass.
    pub fn rewrite<R>(&self, document: &Value, rng: &mut R) -> Result<Value, RewriteError>
    where
        R: CryptoRng + RngCore,
    {
        match document {
            Value::Mapping(mapping) => Ok(Value::Mapping(self.rewrite_mapping(
                mapping,
                &mut Vec::new(),
                rng,
            )?)),
            other => Ok(other.clone()),
        }
    }

    fn rewrite_mapping<R>(
        &self,
        mapping: &Mapping,
        path: &mut Vec<String>,
        rng: &mut R,
    ) -> Result<Mapping, RewriteError>
    where
        R: CryptoRng + RngCore,
    {
        let mut rewritten = Mapping::with_capacity(mapping.len());
        for (key, value) in mapping {
            path.push(key_name(key));
            let value = match value {
                Value::Mapping(inner) => Value::Mapping(self.rewrite_mapping(inner, path, rng)?),
                Value::String(text) => match Marker::parse(text) {
                    Some(marker) => {
                        let location = path.join(".");
                        let replaced = self
                            .apply(&marker, rng)
                            .map_err(|err| err.at(&location))?;
                        tracing::debug!(
                            path = %location,
                            op = %marker.operation,
                            mode = %marker.mode,
                            "rewrote marker"
                        );
                        Value::String(replaced)
                    }
                    None => value.clone(),
                },
                other => other.clone(),
            };
            path.pop();
            rewritten.insert(key.clone(), value);
        }
        Ok(rewritten)
    }

    /// The replacement text for a single marker
    pub fn apply<R>(&self, marker: &Marker, rng: &mut R) -> Result<String, RewriteError>
    where
        R: CryptoRng + RngCore,
    {
        let scope = SecretScope::resolve(marker.mode, &marker.secret)?;
        match marker.operation {
            Operation::Encrypt => {
                let ciphertext = self.seal(&scope, marker.payload.as_bytes(), rng)?;
                Ok(marker.sealed(encode_payload(&ciphertext)).to_string())
            }
            Operation::Decrypt => {
                let ciphertext = decode_payload(&marker.payload)?;
                let plaintext = self.unseal(&scope, &ciphertext, rng)?;
                self.render(plaintext)
            }
        }
    }

    /// Encrypt `plaintext` for the public key held at `scope`
    pub fn seal<R>(
        &self,
        scope: &SecretScope,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, RewriteError>
    where
        R: CryptoRng + RngCore,
    {
        let material = self.keys.public_key_material(scope)?;
        let public_key = public_key_from_pem(&material)?;
        Ok(crypto::encrypt(rng, &public_key, plaintext)?)
    }

    /// Decrypt `ciphertext` with the private key held at `scope`.
    ///
    /// The blob framing is checked before any key is looked up.
    pub fn unseal<R>(
        &self,
        scope: &SecretScope,
        ciphertext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, RewriteError>
    where
        R: CryptoRng + RngCore,
    {
        EncryptedBlob::parse(ciphertext)?;
        let material = self.keys.private_key_material(scope)?;
        let private_key = private_key_from_pem(&material)?;
        Ok(crypto::decrypt(rng, &private_key, ciphertext)?)
    }

    fn render(&self, plaintext: Vec<u8>) -> Result<String, RewriteError> {
        if self.plain {
            String::from_utf8(plaintext).map_err(|_| RewriteError::NonUtf8Plaintext)
        } else {
            Ok(STANDARD.encode(plaintext))
        }
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_string(),
        _ => "?".to_string(),
    }
}
