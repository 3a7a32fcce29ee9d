use std::fmt;
use std::path::{Path, PathBuf};

use crate::marker::Mode;

/// Where a key pair lives, resolved from a marker's `mode` and `secret`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecretScope {
    /// A key file on the local filesystem
    Local(PathBuf),
    /// A named secret in a cluster namespace
    Cluster { namespace: String, name: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Cluster references must be exactly `namespace/name`
    #[error("malformed secret reference {0:?}: use namespace/secret")]
    MalformedReference(String),
}

/// Scope used by the whole-input commands (`enc`, `dec`, `init`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDefaults {
    /// Cluster namespace of the default secret
    pub namespace: String,
    /// Secret name in cluster mode, key file path in local mode
    pub secret: String,
}

impl ScopeDefaults {
    pub fn new(namespace: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            secret: secret.into(),
        }
    }

    /// The default scope for `mode`
    pub fn scope(&self, mode: Mode) -> SecretScope {
        match mode {
            Mode::Local => SecretScope::Local(PathBuf::from(&self.secret)),
            Mode::Cluster => SecretScope::Cluster {
                namespace: self.namespace.clone(),
                name: self.secret.clone(),
            },
        }
    }
}

impl SecretScope {
    /// Resolve a marker reference.
    ///
    /// In local mode the reference is a file path. In cluster mode it must
    /// split on `/` into exactly two non-empty parts, so an empty reference
    /// is malformed.
    pub fn resolve(mode: Mode, reference: &str) -> Result<SecretScope, ScopeError> {
        match mode {
            Mode::Local => Ok(SecretScope::Local(PathBuf::from(reference))),
            Mode::Cluster => {
                let parts: Vec<&str> = reference.split('/').collect();
                match parts.as_slice() {
                    [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
                        Ok(SecretScope::Cluster {
                            namespace: namespace.to_string(),
                            name: name.to_string(),
                        })
                    }
                    _ => Err(ScopeError::MalformedReference(reference.to_string())),
                }
            }
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            SecretScope::Local(_) => Mode::Local,
            SecretScope::Cluster { .. } => Mode::Cluster,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SecretScope::Local(path) => Some(path),
            SecretScope::Cluster { .. } => None,
        }
    }
}

impl fmt::Display for SecretScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretScope::Local(path) => write!(f, "{}", path.display()),
            SecretScope::Cluster { namespace, name } => write!(f, "{}/{}", namespace, name),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum KeyStoreError {
    /// The scope exists but holds no matching key material, or does not exist
    #[error("{what} not found in {scope}")]
    NotFound { scope: String, what: &'static str },
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid secret manifest in {scope}: {source}")]
    Manifest {
        scope: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("cluster lookup failed: {0}")]
    Cluster(#[from] kube::Error),
    #[error("no cluster key store available for {0}")]
    ClusterUnavailable(String),
    #[error("{backend} key store cannot resolve {scope}")]
    UnsupportedScope {
        backend: &'static str,
        scope: String,
    },
}

impl KeyStoreError {
    pub(crate) fn not_found(scope: &SecretScope, what: &'static str) -> Self {
        KeyStoreError::NotFound {
            scope: scope.to_string(),
            what,
        }
    }

    /// Whether the error means "no such key" rather than a backend failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, KeyStoreError::NotFound { .. })
    }
}

/// Lookup contract between the rewriter and wherever key material lives.
///
/// Implementations return raw PEM (or certificate) bytes and leave parsing
/// to [`crate::crypto::keys`]. Nothing is cached between calls.
pub trait KeyStore {
    /// PEM bytes containing the RSA private key for `scope`
    fn private_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError>;

    /// PEM bytes of a public key, certificate, or private key for `scope`
    fn public_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError>;
}

impl<T: KeyStore + ?Sized> KeyStore for &T {
    fn private_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        (**self).private_key_material(scope)
    }

    fn public_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        (**self).public_key_material(scope)
    }
}
