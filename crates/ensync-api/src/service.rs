//! Operation traits implemented by [`crate::Client`].
//!
//! Command handlers depend on these traits rather than on the concrete client so
//! they can be exercised against alternative implementations.

use async_trait::async_trait;
use ensync_domain::{
    AccessKey, AccessKeyList, AccessKeyPermissions, CreateAccessKeyRequest, Event, EventList,
    Permissions, ServiceKeyPair, WorkspaceList,
};
use tokio_util::sync::CancellationToken;

use crate::error::ApiResult;
use crate::params::ListParams;

/// Event definition operations.
#[async_trait]
pub trait EventService: Send + Sync {
    /// `GET /event`.
    async fn list_events(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ApiResult<EventList>;

    /// `GET /event/{name}`.
    async fn get_event_by_name(&self, cancel: &CancellationToken, name: &str) -> ApiResult<Event>;

    /// `POST /event` with the event's name and payload.
    async fn create_event(&self, cancel: &CancellationToken, event: &Event) -> ApiResult<()>;

    /// `PUT /event/{id}` with the event's name and payload.
    async fn update_event(&self, cancel: &CancellationToken, event: &Event) -> ApiResult<()>;
}

/// Access key operations.
#[async_trait]
pub trait AccessKeyService: Send + Sync {
    /// `GET /access-key`.
    async fn list_access_keys(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ApiResult<AccessKeyList>;

    /// `GET /access-key/{id}`.
    async fn get_access_key(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> ApiResult<AccessKeyPermissions>;

    /// `POST /access-key`; the response carries the generated key.
    async fn create_access_key(
        &self,
        cancel: &CancellationToken,
        request: &CreateAccessKeyRequest,
    ) -> ApiResult<AccessKey>;

    /// `DELETE /access-key/{id}`.
    async fn delete_access_key(&self, cancel: &CancellationToken, id: &str) -> ApiResult<()>;

    /// `GET /access-key/{id}/permissions`.
    async fn get_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> ApiResult<AccessKeyPermissions>;

    /// `POST /access-key/{id}/permissions` with the send and receive lists only.
    async fn set_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        id: &str,
        permissions: &Permissions,
    ) -> ApiResult<()>;

    /// `PUT /access/service-key-pair`.
    async fn rotate_service_key_pair(
        &self,
        cancel: &CancellationToken,
        access_key: &str,
    ) -> ApiResult<ServiceKeyPair>;
}

/// Workspace operations.
#[async_trait]
pub trait WorkspaceService: Send + Sync {
    /// `GET /workspace`.
    async fn list_workspaces(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ApiResult<WorkspaceList>;

    /// `POST /workspace`.
    async fn create_workspace(&self, cancel: &CancellationToken, name: &str) -> ApiResult<()>;
}

/// Every operation plus control of the access key sent with them.
pub trait ApiService: EventService + AccessKeyService + WorkspaceService {
    /// Replace the access key used by subsequent calls.
    fn set_access_key(&self, access_key: &str);
}
