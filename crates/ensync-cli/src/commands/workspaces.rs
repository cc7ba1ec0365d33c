use ensync_api::WorkspaceService;
use ensync_api::params::WORKSPACE_ORDER_FIELDS;

use crate::cli::{ListArgs, WorkspaceCreateArgs};
use crate::client::{AppContext, CliResult};
use crate::commands::{require, warn_on_count_mismatch};
use crate::output::render_workspace_list;

pub(crate) async fn handle_workspace_list(ctx: &AppContext, args: ListArgs) -> CliResult<()> {
    let params = args.to_params(WORKSPACE_ORDER_FIELDS)?;
    let workspaces = ctx.api.list_workspaces(&ctx.cancel, &params).await?;
    warn_on_count_mismatch("workspaces", &workspaces);
    render_workspace_list(&workspaces, ctx.output)
}

pub(crate) async fn handle_workspace_create(
    ctx: &AppContext,
    args: WorkspaceCreateArgs,
) -> CliResult<()> {
    let name = require("name", &args.name)?;
    ctx.api.create_workspace(&ctx.cancel, &name).await?;
    println!("Workspace '{name}' created successfully");
    Ok(())
}
