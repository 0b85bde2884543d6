use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::metadata::MetadataRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for MetadataRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let node = ctx.client.call(self.clone()).await?;
        let parent = node
            .parent
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        Ok(format!(
            "{} {} ({})\n  parent: {}\n  created: {}",
            node.fid, node.name, node.kind, parent, node.created_at
        ))
    }
}
