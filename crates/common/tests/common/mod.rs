//! Shared helpers for the integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ::common::crypto::KeyPair;
use ::common::keystore::Keyring;
use ::common::rewrite::Rewriter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

/// Path of a checked-in fixture
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Key pair in `fixtures/key.pem`, also sealed in the other fixtures
pub fn fixture_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| {
        let pem = std::fs::read(fixture("key.pem")).unwrap();
        KeyPair::from_pem(&pem).unwrap()
    })
}

/// A freshly generated 1024-bit key pair, shared by every test in a binary
pub fn generated_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(42);
        KeyPair::generate(&mut rng, 1024).unwrap()
    })
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

/// Write `generated_key()` as a PEM file into a fresh temp dir
pub fn key_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("key.pem");
    std::fs::write(&path, generated_key().to_pem().unwrap()).unwrap();
    (dir, path)
}

/// Rewriter over local files only
pub fn local_rewriter() -> Rewriter<Keyring> {
    Rewriter::new(Keyring::local())
}
