//! Event definition endpoints.

use async_trait::async_trait;
use ensync_domain::{Event, EventList, EventRequest};
use tokio_util::sync::CancellationToken;

use crate::client::{Client, Operation};
use crate::error::ApiResult;
use crate::params::ListParams;
use crate::request::ApiRequest;
use crate::service::EventService;

const EVENT: &str = "event";

#[async_trait]
impl EventService for Client {
    async fn list_events(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ApiResult<EventList> {
        let request = ApiRequest::get([EVENT]).with_query(params.to_query());
        self.fetch(cancel, Operation::new("list events"), request)
            .await
    }

    async fn get_event_by_name(&self, cancel: &CancellationToken, name: &str) -> ApiResult<Event> {
        let request = ApiRequest::get([EVENT, name]);
        self.fetch(cancel, Operation::on("get event", name), request)
            .await
    }

    async fn create_event(&self, cancel: &CancellationToken, event: &Event) -> ApiResult<()> {
        let operation = Operation::on("create event", event.name.as_str());
        let request = operation
            .prepare(ApiRequest::post([EVENT]).with_json(&EventRequest::from(event)))?;
        self.send(cancel, operation, request).await
    }

    async fn update_event(&self, cancel: &CancellationToken, event: &Event) -> ApiResult<()> {
        let operation = Operation::on("update event", event.id.as_str());
        let request = operation.prepare(
            ApiRequest::put([EVENT, event.id.as_str()]).with_json(&EventRequest::from(event)),
        )?;
        self.send(cancel, operation, request).await
    }
}
