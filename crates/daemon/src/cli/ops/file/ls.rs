use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::children::ChildrenRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for ChildrenRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;

        if response.children.is_empty() {
            Ok("No children".to_string())
        } else {
            let output = response
                .children
                .iter()
                .map(|node| format!("{} {} ({})", node.fid, node.name, node.kind))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(output)
        }
    }
}
