use ensync_api::AccessKeyService;
use ensync_api::params::ACCESS_KEY_ORDER_FIELDS;
use ensync_domain::{AccessKeyType, CreateAccessKeyRequest, Permissions};

use crate::cli::{
    AccessKeyCreateArgs, AccessKeyIdArgs, AccessKeyListArgs, KeyTypeArg, PermissionsSetArgs,
    RotateArgs,
};
use crate::client::{AppContext, CliResult};
use crate::commands::{parse_permissions, require, warn_on_count_mismatch};
use crate::output::{render_access_key, render_access_key_list, render_created_key, render_key_pair};

/// Query key used to filter listings by key value.
const FILTER_ACCESS_KEY: &str = "accessKey";

impl From<KeyTypeArg> for AccessKeyType {
    fn from(value: KeyTypeArg) -> Self {
        match value {
            KeyTypeArg::Service => Self::Service,
            KeyTypeArg::Account => Self::Account,
        }
    }
}

pub(crate) async fn handle_access_key_list(
    ctx: &AppContext,
    args: AccessKeyListArgs,
) -> CliResult<()> {
    let mut params = args.list.to_params(ACCESS_KEY_ORDER_FIELDS)?;
    if let Some(key) = args.key.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
        params = params.with_filter(FILTER_ACCESS_KEY, key);
    }
    let keys = ctx.api.list_access_keys(&ctx.cancel, &params).await?;
    warn_on_count_mismatch("access keys", &keys);
    render_access_key_list(&keys, ctx.output)
}

pub(crate) async fn handle_access_key_get(
    ctx: &AppContext,
    args: AccessKeyIdArgs,
) -> CliResult<()> {
    let id = require("id", &args.id)?;
    let key = ctx.api.get_access_key(&ctx.cancel, &id).await?;
    render_access_key(&key, ctx.output)
}

pub(crate) async fn handle_access_key_create(
    ctx: &AppContext,
    args: AccessKeyCreateArgs,
) -> CliResult<()> {
    let name = require("name", &args.name)?;
    let permissions = match args.permissions.as_deref() {
        Some(raw) => parse_permissions(raw)?,
        None => Permissions::default(),
    };
    let request = CreateAccessKeyRequest {
        key_type: args.key_type.into(),
        name,
        permissions,
    };
    let created = ctx.api.create_access_key(&ctx.cancel, &request).await?;
    render_created_key(&created, ctx.output)
}

pub(crate) async fn handle_access_key_delete(
    ctx: &AppContext,
    args: AccessKeyIdArgs,
) -> CliResult<()> {
    let id = require("id", &args.id)?;
    ctx.api.delete_access_key(&ctx.cancel, &id).await?;
    println!("Access key '{id}' deleted successfully");
    Ok(())
}

pub(crate) async fn handle_permissions_get(
    ctx: &AppContext,
    args: AccessKeyIdArgs,
) -> CliResult<()> {
    let id = require("id", &args.id)?;
    let key = ctx.api.get_access_key_permissions(&ctx.cancel, &id).await?;
    render_access_key(&key, ctx.output)
}

pub(crate) async fn handle_permissions_set(
    ctx: &AppContext,
    args: PermissionsSetArgs,
) -> CliResult<()> {
    let id = require("id", &args.id)?;
    let permissions = parse_permissions(&args.permissions)?;
    ctx.api
        .set_access_key_permissions(&ctx.cancel, &id, &permissions)
        .await?;
    println!("Permissions updated successfully");
    Ok(())
}

pub(crate) async fn handle_key_rotate(ctx: &AppContext, args: RotateArgs) -> CliResult<()> {
    let key = require("key", &args.key)?;
    let pair = ctx.api.rotate_service_key_pair(&ctx.cancel, &key).await?;
    render_key_pair(&pair, ctx.output)
}
