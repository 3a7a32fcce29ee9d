use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use k8s_openapi::api::core::v1::Secret;

use super::manifest;
use super::provider::{KeyStore, KeyStoreError, SecretScope};
use crate::crypto::keys::PRIVATE_KEY_TAG;

const PEM_PREFIX: &str = "-----BEGIN";

/// What a local key file turned out to contain
enum KeyFile {
    /// A bare PEM file: the key material itself
    Pem(Vec<u8>),
    /// A serialized `Secret` manifest, as written by `init`
    Secret(Secret),
}

/// Key store reading key material from local files.
///
/// The file at a [`SecretScope::Local`] path is either a bare PEM file
/// (private key, public key, or certificate) or a `Secret` manifest holding
/// the key in one of the conventional fields. Each lookup reads and parses
/// the file once.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileKeyStore;

impl FileKeyStore {
    pub fn new() -> Self {
        Self
    }

    fn load(&self, scope: &SecretScope) -> Result<KeyFile, KeyStoreError> {
        let path = scope.path().ok_or_else(|| KeyStoreError::UnsupportedScope {
            backend: "file",
            scope: scope.to_string(),
        })?;
        let contents = read(path, scope)?;

        let text = String::from_utf8_lossy(&contents);
        if text.trim_start().starts_with(PEM_PREFIX) {
            tracing::debug!(path = %path.display(), "loaded PEM key file");
            return Ok(KeyFile::Pem(contents));
        }

        let secret =
            manifest::from_manifest(&contents).map_err(|source| KeyStoreError::Manifest {
                scope: scope.to_string(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "loaded secret manifest");
        Ok(KeyFile::Secret(secret))
    }
}

/// Whether `pem` holds a PKCS#1 private key block
fn has_private_key(pem: &[u8]) -> bool {
    pem::parse_many(pem)
        .map(|blocks| blocks.iter().any(|block| block.tag() == PRIVATE_KEY_TAG))
        .unwrap_or(false)
}

fn read(path: &Path, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
    fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => KeyStoreError::not_found(scope, "key file"),
        _ => KeyStoreError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

impl KeyStore for FileKeyStore {
    fn private_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        match self.load(scope)? {
            KeyFile::Pem(pem) if has_private_key(&pem) => Ok(pem),
            KeyFile::Pem(_) => Err(KeyStoreError::not_found(scope, "private key")),
            KeyFile::Secret(secret) => manifest::private_key_material(&secret)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| KeyStoreError::not_found(scope, "private key")),
        }
    }

    fn public_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        match self.load(scope)? {
            KeyFile::Pem(pem) => Ok(pem),
            KeyFile::Secret(secret) => manifest::public_key_material(&secret)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| KeyStoreError::not_found(scope, "public key")),
        }
    }
}
