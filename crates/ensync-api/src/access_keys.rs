//! Access key, permission, and key rotation endpoints.

use async_trait::async_trait;
use ensync_domain::{
    AccessKey, AccessKeyList, AccessKeyPermissions, CreateAccessKeyRequest, Permissions,
    PermissionsUpdate, RotateServiceKeyPairRequest, ServiceKeyPair,
};
use tokio_util::sync::CancellationToken;

use crate::client::{Client, Operation};
use crate::error::ApiResult;
use crate::params::ListParams;
use crate::request::ApiRequest;
use crate::service::AccessKeyService;

const ACCESS_KEY: &str = "access-key";
const PERMISSIONS: &str = "permissions";
const SERVICE_KEY_PAIR: [&str; 2] = ["access", "service-key-pair"];

#[async_trait]
impl AccessKeyService for Client {
    async fn list_access_keys(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ApiResult<AccessKeyList> {
        let request = ApiRequest::get([ACCESS_KEY]).with_query(params.to_query());
        self.fetch(cancel, Operation::new("list access keys"), request)
            .await
    }

    async fn get_access_key(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> ApiResult<AccessKeyPermissions> {
        let request = ApiRequest::get([ACCESS_KEY, id]);
        self.fetch(cancel, Operation::on("get access key", id), request)
            .await
    }

    async fn create_access_key(
        &self,
        cancel: &CancellationToken,
        request: &CreateAccessKeyRequest,
    ) -> ApiResult<AccessKey> {
        let operation = Operation::on("create access key", request.name.as_str());
        let request = operation.prepare(ApiRequest::post([ACCESS_KEY]).with_json(request))?;
        self.fetch(cancel, operation, request).await
    }

    async fn delete_access_key(&self, cancel: &CancellationToken, id: &str) -> ApiResult<()> {
        let request = ApiRequest::delete([ACCESS_KEY, id]);
        self.send(cancel, Operation::on("delete access key", id), request)
            .await
    }

    async fn get_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> ApiResult<AccessKeyPermissions> {
        let request = ApiRequest::get([ACCESS_KEY, id, PERMISSIONS]);
        self.fetch(cancel, Operation::on("get access key permissions", id), request)
            .await
    }

    async fn set_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        id: &str,
        permissions: &Permissions,
    ) -> ApiResult<()> {
        let operation = Operation::on("set access key permissions", id);
        let request = operation.prepare(
            ApiRequest::post([ACCESS_KEY, id, PERMISSIONS])
                .with_json(&PermissionsUpdate::from(permissions)),
        )?;
        self.send(cancel, operation, request).await
    }

    async fn rotate_service_key_pair(
        &self,
        cancel: &CancellationToken,
        access_key: &str,
    ) -> ApiResult<ServiceKeyPair> {
        let operation = Operation::new("rotate service key pair");
        let body = RotateServiceKeyPairRequest {
            access_key: access_key.to_string(),
        };
        let request = operation.prepare(ApiRequest::put(SERVICE_KEY_PAIR).with_json(&body))?;
        self.fetch(cancel, operation, request).await
    }
}
