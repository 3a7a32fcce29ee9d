/**
 * Cryptographic types and operations.
 *  - Hybrid RSA-OAEP / AES-GCM envelopes
 *  - PEM key material, certificates, legacy
 *    encrypted key blocks
 */
pub mod crypto;
/**
 * Multi-document YAML stream codec.
 */
pub mod document;
/**
 * Resolving marker secret references to key
 *  material, locally or from a cluster.
 */
pub mod keystore;
/**
 * The `[op:..,mode:..,secret:..]payload` grammar.
 */
pub mod marker;
/**
 * Rewriting markers inside decoded documents.
 */
pub mod rewrite;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::build_info;
    pub use crate::crypto::{CryptoError, KeyError, KeyPair};
    pub use crate::document::{decode_stream, encode_stream, DocumentError};
    pub use crate::keystore::{
        ClusterKeyStore, FileKeyStore, KeyStore, KeyStoreError, Keyring, MemoryKeyStore,
        ScopeDefaults, SecretScope,
    };
    pub use crate::marker::{Marker, Mode, Operation};
    pub use crate::rewrite::{RewriteError, Rewriter};
    pub use crate::version::BuildInfo;
}
