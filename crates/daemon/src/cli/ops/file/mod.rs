use clap::{Args, Subcommand};

pub mod history;
pub mod lineage;
pub mod ls;
pub mod meta;
pub mod rent;
pub mod rented;
pub mod return_node;

use crate::cli::op::Op;
use stacks_daemon::http_server::api::v1::storage::children::ChildrenRequest;
use stacks_daemon::http_server::api::v1::storage::lineage::LineageRequest;
use stacks_daemon::http_server::api::v1::storage::metadata::MetadataRequest;
use stacks_daemon::http_server::api::v1::storage::rent::RentRequest;
use stacks_daemon::http_server::api::v1::storage::rented::RentedRequest;
use stacks_daemon::http_server::api::v1::storage::return_node::ReturnRequest;
use stacks_daemon::http_server::api::v1::storage::revisions::RevisionsRequest;

crate::command_enum! {
    (Meta, MetadataRequest),
    (Ls, ChildrenRequest),
    (Lineage, LineageRequest),
    (History, RevisionsRequest),
    (Rent, RentRequest),
    (Return, ReturnRequest),
    (Rented, RentedRequest),
}

// Rename the generated Command to FileCommand for clarity
pub type FileCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct File {
    #[command(subcommand)]
    pub command: FileCommand,
}

#[async_trait::async_trait]
impl Op for File {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
