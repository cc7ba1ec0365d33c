use ensync_api::EventService;
use ensync_api::params::EVENT_ORDER_FIELDS;
use ensync_domain::Event;

use crate::cli::{EventCreateArgs, EventGetArgs, EventUpdateArgs, ListArgs};
use crate::client::{AppContext, CliResult};
use crate::commands::{parse_json_object, require, warn_on_count_mismatch};
use crate::output::{render_event, render_event_list};

pub(crate) async fn handle_event_list(ctx: &AppContext, args: ListArgs) -> CliResult<()> {
    let params = args.to_params(EVENT_ORDER_FIELDS)?;
    let events = ctx.api.list_events(&ctx.cancel, &params).await?;
    warn_on_count_mismatch("events", &events);
    render_event_list(&events, ctx.output)
}

pub(crate) async fn handle_event_get(ctx: &AppContext, args: EventGetArgs) -> CliResult<()> {
    let name = require("name", &args.name)?;
    let event = ctx.api.get_event_by_name(&ctx.cancel, &name).await?;
    render_event(&event, ctx.output)
}

pub(crate) async fn handle_event_create(ctx: &AppContext, args: EventCreateArgs) -> CliResult<()> {
    let name = require("name", &args.name)?;
    let payload = parse_json_object("payload", &args.payload)?;
    ctx.api
        .create_event(&ctx.cancel, &Event::new(name.clone(), payload))
        .await?;
    println!("Event '{name}' created successfully");
    Ok(())
}

pub(crate) async fn handle_event_update(ctx: &AppContext, args: EventUpdateArgs) -> CliResult<()> {
    let id = require("id", &args.id)?;
    let name = require("name", &args.name)?;
    let payload = parse_json_object("payload", &args.payload)?;
    let event = Event {
        id: id.clone(),
        ..Event::new(name, payload)
    };
    ctx.api.update_event(&ctx.cancel, &event).await?;
    println!("Event '{id}' updated successfully");
    Ok(())
}
