use std::convert::Infallible;

use clap::Args;

use common::build_info;

/// Print build information
#[derive(Args, Debug, Clone)]
pub struct Version;

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let info = build_info!();
        tracing::debug!(revision = info.revision, profile = info.profile, "build info");
        Ok(info.to_string())
    }
}
