use clap::Args;
use rand::rngs::OsRng;

use common::rewrite::{decode_payload, RewriteError};

use crate::io::{read_input, write_output};

/// Decrypt base64url input with the default secret's private key
#[derive(Args, Debug, Clone)]
pub struct Dec;

#[derive(Debug, thiserror::Error)]
pub enum DecError {
    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
    #[error("input is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error(transparent)]
    Unseal(#[from] RewriteError),
}

#[async_trait::async_trait]
impl crate::op::Op for Dec {
    type Error = DecError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let input = read_input(&ctx.input).map_err(DecError::Read)?;
        let input = String::from_utf8_lossy(&input);
        let payload = input.trim();
        if payload.is_empty() {
            tracing::warn!("input is empty");
            return Ok(String::new());
        }

        let ciphertext = decode_payload(payload)?;
        let scope = ctx.default_scope();
        let plaintext = ctx.rewriter().unseal(&scope, &ciphertext, &mut OsRng)?;
        tracing::info!(%scope, bytes = plaintext.len(), "decrypted input");

        write_output(&ctx.output, &plaintext).map_err(DecError::Write)?;
        Ok(String::new())
    }
}
