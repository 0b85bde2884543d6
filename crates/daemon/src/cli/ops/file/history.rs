use stacks_daemon::http_server::api::client::ApiError;
use stacks_daemon::http_server::api::v1::storage::revisions::RevisionsRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for RevisionsRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;

        if response.revisions.is_empty() {
            Ok("No revisions".to_string())
        } else {
            let output = response
                .revisions
                .iter()
                .map(|rev| {
                    format!(
                        "v{} {} by {} [{}]",
                        rev.seq, rev.created_at, rev.creator, rev.content_ref
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            Ok(output)
        }
    }
}
