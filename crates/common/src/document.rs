//! Multi-document YAML streams, as produced by `helm template`

use serde::Deserialize;
use serde_yaml::Value;

const DOCUMENT_SEPARATOR: &str = "---\n";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to parse document {index}: {source}")]
    Parse {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to serialize document {index}: {source}")]
    Serialize {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Split `input` into its documents. Empty documents are dropped.
pub fn decode_stream(input: &str) -> Result<Vec<Value>, DocumentError> {
    let mut documents = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let value =
            Value::deserialize(document).map_err(|source| DocumentError::Parse { index, source })?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Serialize `documents`, each preceded by a `---` line
pub fn encode_stream(documents: &[Value]) -> Result<String, DocumentError> {
    let mut output = String::new();
    for (index, document) in documents.iter().enumerate() {
        let text = serde_yaml::to_string(document)
            .map_err(|source| DocumentError::Serialize { index, source })?;
        output.push_str(DOCUMENT_SEPARATOR);
        output.push_str(&text);
    }
    Ok(output)
}
