use clap::Args;
use rand::rngs::OsRng;

use common::rewrite::{encode_payload, RewriteError};

use crate::io::{read_input, write_output};

/// Encrypt the whole input with the default secret's public key
#[derive(Args, Debug, Clone)]
pub struct Enc;

#[derive(Debug, thiserror::Error)]
pub enum EncError {
    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
    #[error(transparent)]
    Seal(#[from] RewriteError),
}

#[async_trait::async_trait]
impl crate::op::Op for Enc {
    type Error = EncError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = read_input(&ctx.input).map_err(EncError::Read)?;
        let scope = ctx.default_scope();
        let ciphertext = ctx.rewriter().seal(&scope, &plaintext, &mut OsRng)?;
        tracing::info!(%scope, bytes = plaintext.len(), "encrypted input");

        let mut payload = encode_payload(&ciphertext);
        payload.push('\n');
        write_output(&ctx.output, payload.as_bytes()).map_err(EncError::Write)?;
        Ok(String::new())
    }
}
