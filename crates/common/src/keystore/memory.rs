use std::collections::HashMap;

use super::provider::{KeyStore, KeyStoreError, SecretScope};
use crate::crypto::{private_key_to_pem, public_key_to_pem, KeyError, KeyPair};

/// In-memory key store keyed by scope
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    private: HashMap<SecretScope, Vec<u8>>,
    public: HashMap<SecretScope, Vec<u8>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pair` under `scope`, encoding both halves as PEM
    pub fn insert_key_pair(&mut self, scope: SecretScope, pair: &KeyPair) -> Result<(), KeyError> {
        if let Some(private) = pair.private_key() {
            let pem = private_key_to_pem(private)?;
            self.private.insert(scope.clone(), pem.into_bytes());
        }
        let pem = public_key_to_pem(pair.public_key())?;
        self.public.insert(scope, pem.into_bytes());
        Ok(())
    }

    /// Register raw private key material under `scope`
    pub fn insert_private_material(&mut self, scope: SecretScope, material: Vec<u8>) {
        self.private.insert(scope, material);
    }

    /// Register raw public key material under `scope`
    pub fn insert_public_material(&mut self, scope: SecretScope, material: Vec<u8>) {
        self.public.insert(scope, material);
    }
}

impl KeyStore for MemoryKeyStore {
    fn private_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        self.private
            .get(scope)
            .cloned()
            .ok_or_else(|| KeyStoreError::not_found(scope, "private key"))
    }

    fn public_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        self.public
            .get(scope)
            .cloned()
            .ok_or_else(|| KeyStoreError::not_found(scope, "public key"))
    }
}
