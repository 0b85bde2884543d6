use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::rent::RentRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for RentRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let checkout = ctx.client.call(self.clone()).await?;
        let until = checkout
            .expires_at
            .map(|at| format!(" until {}", at))
            .unwrap_or_default();
        Ok(format!(
            "rented {} to {}{}",
            checkout.fid, checkout.holder, until
        ))
    }
}
