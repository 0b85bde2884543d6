use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::return_node::ReturnRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for ReturnRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;
        Ok(format!("returned {}", response.fid))
    }
}
