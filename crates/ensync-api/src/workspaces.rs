//! Workspace endpoints.

use async_trait::async_trait;
use ensync_domain::{CreateWorkspaceRequest, WorkspaceList};
use tokio_util::sync::CancellationToken;

use crate::client::{Client, Operation};
use crate::error::ApiResult;
use crate::params::ListParams;
use crate::request::ApiRequest;
use crate::service::WorkspaceService;

const WORKSPACE: &str = "workspace";

#[async_trait]
impl WorkspaceService for Client {
    async fn list_workspaces(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ApiResult<WorkspaceList> {
        let request = ApiRequest::get([WORKSPACE]).with_query(params.to_query());
        self.fetch(cancel, Operation::new("list workspaces"), request)
            .await
    }

    async fn create_workspace(&self, cancel: &CancellationToken, name: &str) -> ApiResult<()> {
        let operation = Operation::on("create workspace", name);
        let body = CreateWorkspaceRequest {
            name: name.to_string(),
        };
        let request = operation.prepare(ApiRequest::post([WORKSPACE]).with_json(&body))?;
        self.send(cancel, operation, request).await
    }
}
