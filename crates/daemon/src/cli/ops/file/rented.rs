use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::rented::RentedRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for RentedRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;
        match response.checkout {
            Some(checkout) => {
                let until = checkout
                    .expires_at
                    .map(|at| format!(" until {}", at))
                    .unwrap_or_default();
                Ok(format!(
                    "{} rented by {} since {}{}",
                    response.fid, checkout.holder, checkout.acquired_at, until
                ))
            }
            None => Ok(format!("{} is available", response.fid)),
        }
    }
}
