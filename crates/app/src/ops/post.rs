use clap::Args;
use rand::rngs::OsRng;

use common::document::{decode_stream, encode_stream, DocumentError};
use common::rewrite::RewriteError;

use crate::io::{read_input, write_output};

/// Rewrite every marker in a manifest stream (the default command)
#[derive(Args, Debug, Clone, Default)]
pub struct Post;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
    #[error("input is not valid UTF-8")]
    NonUtf8Input(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("document {index}: {source}")]
    Rewrite {
        index: usize,
        #[source]
        source: RewriteError,
    },
}

#[async_trait::async_trait]
impl crate::op::Op for Post {
    type Error = PostError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let input = String::from_utf8(read_input(&ctx.input).map_err(PostError::Read)?)?;
        if input.trim().is_empty() {
            tracing::warn!("input is empty");
            return Ok(String::new());
        }

        let documents = decode_stream(&input)?;
        let rewriter = ctx.rewriter();
        let mut rng = OsRng;

        let mut rewritten = Vec::with_capacity(documents.len());
        for (index, document) in documents.iter().enumerate() {
            let document = rewriter
                .rewrite(document, &mut rng)
                .map_err(|source| PostError::Rewrite { index, source })?;
            tracing::info!(index, "rewrote document");
            rewritten.push(document);
        }

        write_output(&ctx.output, encode_stream(&rewritten)?.as_bytes())
            .map_err(PostError::Write)?;
        Ok(String::new())
    }
}
