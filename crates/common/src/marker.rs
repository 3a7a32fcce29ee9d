//! Marker syntax embedded in manifest string values
//!
//! ```text
//! [op:<encrypt|decrypt>,mode:<local|cluster>,secret:<ref>]<payload>
//! ```
//!
//! The bracket holds exactly three comma separated `key:value` fields in the
//! fixed order `op`, `mode`, `secret`. `op` and `mode` values are word
//! characters; `secret` takes the rest of the bracket, so it may contain `/`,
//! `.` or `,`. The payload runs to the end of the value and is plaintext for
//! `encrypt` markers and unpadded base64url ciphertext for `decrypt` markers.
//!
//! Anything that does not fit this shape is not a marker. Parsing never
//! fails, it only declines.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// What the post-renderer should do with a marker's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
        }
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encrypt" => Ok(Operation::Encrypt),
            "decrypt" => Ok(Operation::Decrypt),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the key material referenced by a marker lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `secret` is a path to a local key file
    Local,
    /// `secret` is `namespace/name` of a cluster secret
    Cluster,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Local => "local",
            Mode::Cluster => "cluster",
        }
    }
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Mode::Local),
            "cluster" => Ok(Mode::Cluster),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub operation: Operation,
    pub mode: Mode,
    /// Opaque key reference, interpreted according to `mode`. Empty means
    /// the caller's default scope.
    pub secret: String,
    pub payload: String,
}

fn value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[([^\]]*)\](.*)$").expect("marker pattern is valid"))
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w+$").expect("word pattern is valid"))
}

/// Split `key:value` and check the key.
fn field<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = raw.split_once(':')?;
    (name == key).then_some(value)
}

fn word_field<T: FromStr>(raw: &str, key: &str) -> Option<T> {
    let value = field(raw, key)?;
    if !word_pattern().is_match(value) {
        return None;
    }
    value.parse().ok()
}

impl Marker {
    /// Parse `value` as a marker, or `None` if it is an ordinary string.
    pub fn parse(value: &str) -> Option<Marker> {
        let captures = value_pattern().captures(value)?;
        let instruction = captures.get(1)?.as_str();
        let payload = captures.get(2)?.as_str();

        let fields: Vec<&str> = instruction.splitn(3, ',').collect();
        let [op, mode, secret] = fields.as_slice() else {
            return None;
        };

        Some(Marker {
            operation: word_field(op, "op")?,
            mode: word_field(mode, "mode")?,
            secret: field(secret, "secret")?.to_string(),
            payload: payload.to_string(),
        })
    }

    /// The marker that replaces an encrypted value: always `op:decrypt`,
    /// keeping this marker's `mode` and `secret`.
    pub fn sealed(&self, ciphertext: String) -> Marker {
        Marker {
            operation: Operation::Decrypt,
            mode: self.mode,
            secret: self.secret.clone(),
            payload: ciphertext,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[op:{},mode:{},secret:{}]{}",
            self.operation, self.mode, self.secret, self.payload
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_encrypt_marker() {
        let marker = Marker::parse("[op:encrypt,mode:local,secret:./key.pem]hello").unwrap();
        assert_eq!(marker.operation, Operation::Encrypt);
        assert_eq!(marker.mode, Mode::Local);
        assert_eq!(marker.secret, "./key.pem");
        assert_eq!(marker.payload, "hello");
    }

    #[test]
    fn test_parse_cluster_marker() {
        let marker = Marker::parse("[op:decrypt,mode:cluster,secret:kube-system/keys]AbC-_9").unwrap();
        assert_eq!(marker.operation, Operation::Decrypt);
        assert_eq!(marker.mode, Mode::Cluster);
        assert_eq!(marker.secret, "kube-system/keys");
        assert_eq!(marker.payload, "AbC-_9");
    }

    #[test]
    fn test_secret_takes_rest_of_bracket() {
        let marker = Marker::parse("[op:encrypt,mode:local,secret:a,b:c/d.pem]x]y").unwrap();
        assert_eq!(marker.secret, "a,b:c/d.pem");
        assert_eq!(marker.payload, "x]y");
    }

    #[test]
    fn test_empty_secret_and_payload() {
        let marker = Marker::parse("[op:encrypt,mode:cluster,secret:]").unwrap();
        assert_eq!(marker.secret, "");
        assert_eq!(marker.payload, "");
    }

    #[test]
    fn test_non_markers() {
        for value in [
            "",
            "plain value",
            "[note: todo]fix me",
            "[op:encrypt]hello",
            "[op:encrypt,mode:local]hello",
            "[mode:local,op:encrypt,secret:k]hello",
            "[op:explode,mode:local,secret:k]hello",
            "[op:encrypt,mode:remote,secret:k]hello",
            "[op:en crypt,mode:local,secret:k]hello",
            " [op:encrypt,mode:local,secret:k]hello",
            "[op:encrypt,mode:local,secret:k]multi\nline",
            "prefix[op:encrypt,mode:local,secret:k]hello",
        ] {
            assert_eq!(Marker::parse(value), None, "{value:?} must not parse");
        }
    }

    #[test]
    fn test_sealed_flips_operation() {
        let marker = Marker::parse("[op:encrypt,mode:local,secret:./key.pem]hello").unwrap();
        let sealed = marker.sealed("Q0lQSEVS".to_string());
        assert_eq!(
            sealed.to_string(),
            "[op:decrypt,mode:local,secret:./key.pem]Q0lQSEVS"
        );

        let reparsed = Marker::parse(&sealed.to_string()).unwrap();
        assert_eq!(reparsed.operation, Operation::Decrypt);
        assert_eq!(reparsed.mode, marker.mode);
        assert_eq!(reparsed.secret, marker.secret);
    }

    fn marker_strategy() -> impl Strategy<Value = Marker> {
        (
            prop_oneof![Just(Operation::Encrypt), Just(Operation::Decrypt)],
            prop_oneof![Just(Mode::Local), Just(Mode::Cluster)],
            "[^\\]\n]*",
            "[^\n]*",
        )
            .prop_map(|(operation, mode, secret, payload)| Marker {
                operation,
                mode,
                secret,
                payload,
            })
    }

    proptest! {
        #[test]
        fn prop_format_parse_round_trip(marker in marker_strategy()) {
            prop_assert_eq!(Marker::parse(&marker.to_string()), Some(marker));
        }

        #[test]
        fn prop_unbracketed_values_are_not_markers(value in "[^\\[][^\n]*") {
            prop_assert_eq!(Marker::parse(&value), None);
        }
    }
}
