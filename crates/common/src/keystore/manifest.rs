//! Kubernetes `Secret` objects as key pair containers
//!
//! A key pair is persisted as an Opaque secret holding the PKCS#1 private key
//! under [`PRIVATE_KEY_FIELD`]. Secrets created by certificate tooling are
//! also understood: `tls.key` for the private key and `tls.crt` for a
//! certificate carrying the public key.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

/// Field holding the PEM private key in secrets created by `init`
pub const PRIVATE_KEY_FIELD: &str = "privatekey";
/// Private key field of `kubernetes.io/tls` secrets
pub const TLS_KEY_FIELD: &str = "tls.key";
/// Certificate field of `kubernetes.io/tls` secrets
pub const TLS_CERT_FIELD: &str = "tls.crt";

const OPAQUE: &str = "Opaque";

/// Build an Opaque secret from raw field values
pub fn new_secret(
    name: &str,
    namespace: Option<&str>,
    data: BTreeMap<String, Vec<u8>>,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: namespace.map(str::to_string),
            ..Default::default()
        },
        type_: Some(OPAQUE.to_string()),
        data: Some(
            data.into_iter()
                .map(|(key, value)| (key, ByteString(value)))
                .collect(),
        ),
        ..Default::default()
    }
}

/// Build the secret that stores a freshly generated private key
pub fn key_secret(name: &str, namespace: &str, private_key_pem: &str) -> Secret {
    let mut data = BTreeMap::new();
    data.insert(
        PRIVATE_KEY_FIELD.to_string(),
        private_key_pem.as_bytes().to_vec(),
    );
    new_secret(name, Some(namespace), data)
}

/// Render a secret as a YAML manifest
pub fn to_manifest(secret: &Secret) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(secret)
}

/// Parse a YAML (or JSON) secret manifest
pub fn from_manifest(bytes: &[u8]) -> Result<Secret, serde_yaml::Error> {
    serde_yaml::from_slice(bytes)
}

/// Look up `field` in `data`, falling back to `stringData`
pub fn field<'a>(secret: &'a Secret, field: &str) -> Option<&'a [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(field))
        .map(|value| value.0.as_slice())
        .or_else(|| {
            secret
                .string_data
                .as_ref()
                .and_then(|data| data.get(field))
                .map(|value| value.as_bytes())
        })
        .filter(|value| !value.is_empty())
}

/// PEM private key material stored in `secret`
pub fn private_key_material(secret: &Secret) -> Option<&[u8]> {
    field(secret, PRIVATE_KEY_FIELD).or_else(|| field(secret, TLS_KEY_FIELD))
}

/// Public key material stored in `secret`: the certificate when present,
/// otherwise the private key the public half is derived from.
pub fn public_key_material(secret: &Secret) -> Option<&[u8]> {
    field(secret, TLS_CERT_FIELD).or_else(|| private_key_material(secret))
}
