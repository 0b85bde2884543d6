use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::lineage::LineageRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for LineageRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;
        let output = response
            .lineage
            .iter()
            .map(|node| {
                if node.is_root() {
                    format!("{} <root>", node.fid)
                } else {
                    format!("{} {}", node.fid, node.name)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
