//! Properties of the envelope format

mod common;

use ::common::crypto::{decrypt, encrypt, CryptoError, EncryptedBlob};
use ::common::marker::Marker;
use ::common::rewrite::{decode_payload, encode_payload};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trip(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
        let key = common::generated_key();
        let mut rng = common::rng();
        let private = key.private_key().unwrap();

        let sealed = encrypt(&mut rng, key.public_key(), &plaintext).unwrap();
        prop_assert_eq!(decrypt(&mut rng, private, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn prop_tampered_payload_is_rejected(
        plaintext in proptest::collection::vec(any::<u8>(), 1..256),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let key = common::generated_key();
        let mut rng = common::rng();
        let private = key.private_key().unwrap();

        let mut sealed = encrypt(&mut rng, key.public_key(), &plaintext).unwrap();
        let offset = {
            let blob = EncryptedBlob::parse(&sealed).unwrap();
            sealed.len() - blob.sealed().len()
        };
        let target = offset + position.index(sealed.len() - offset);
        sealed[target] ^= flip;

        prop_assert!(matches!(
            decrypt(&mut rng, private, &sealed),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn prop_payload_encoding_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let payload = encode_payload(&bytes);
        prop_assert!(payload.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        prop_assert_eq!(decode_payload(&payload).unwrap(), bytes);
    }

    #[test]
    fn prop_bracketed_text_is_not_a_marker(note in "[a-z ]{0,16}", rest in "[^\n]*") {
        let value = format!("[note:{note}]{rest}");
        prop_assert_eq!(Marker::parse(&value), None);
    }
}

#[test]
fn test_wrong_key_is_rejected() {
    let mut rng = common::rng();
    let sealed = encrypt(&mut rng, common::generated_key().public_key(), b"secret").unwrap();
    let other = common::fixture_key().private_key().unwrap();

    assert!(matches!(
        decrypt(&mut rng, other, &sealed),
        Err(CryptoError::KeyMismatch(_) | CryptoError::AuthenticationFailure)
    ));
}
