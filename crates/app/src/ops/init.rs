use std::path::Path;

use clap::Args;
use rand::rngs::OsRng;

use common::crypto::{KeyError, KeyPair};
use common::keystore::manifest;
use common::marker::Mode;

use crate::io::write_output;

/// Generate a key pair and emit it as a Secret manifest
#[derive(Args, Debug, Clone)]
pub struct Init {
    /// RSA modulus size in bits (defaults to key_bits from the config)
    #[arg(long)]
    pub bits: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("key generation failed: {0}")]
    Generate(#[from] KeyError),
    #[error("key generation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to render secret manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
}

/// Secret name for the default scope. A local key file is named after its
/// file stem.
fn secret_name(mode: Mode, secret: &str) -> String {
    match mode {
        Mode::Cluster => secret.to_string(),
        Mode::Local => Path::new(secret)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| secret.to_string()),
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bits = self.bits.unwrap_or(ctx.key_bits);
        tracing::info!(bits, "generating key pair");
        let pair = tokio::task::spawn_blocking(move || KeyPair::generate(&mut OsRng, bits)).await??;

        let name = secret_name(ctx.mode, &ctx.defaults.secret);
        let secret = manifest::key_secret(&name, &ctx.defaults.namespace, &pair.to_pem()?);
        let rendered = manifest::to_manifest(&secret)?;

        write_output(&ctx.output, rendered.as_bytes()).map_err(InitError::Write)?;
        tracing::info!(namespace = %ctx.defaults.namespace, %name, "wrote key secret");
        Ok(String::new())
    }
}
