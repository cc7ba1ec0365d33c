//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ensync_api::params::{DEFAULT_LIMIT, DEFAULT_ORDER_BY};
use ensync_api::{ListParams, SortOrder};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;
use tracing::instrument::WithSubscriber as _;

use crate::client::{AppContext, CliError, CliResult, Runtime};
use crate::commands::{access_keys, events, version, workspaces};

/// Parses CLI arguments, executes the requested command, and reports failures
/// on standard error. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    if let Command::Version(args) = &cli.command {
        return version::handle_version(args);
    }

    let runtime = Runtime::from_cli(&cli)?;
    let cancel = CancellationToken::new();
    let ctx = AppContext::new(runtime.client, cancel.clone(), cli.output);
    let label = command_label(&cli.command);
    let span = tracing::dispatcher::with_default(&runtime.logger, || {
        tracing::info_span!("command", name = label, request_id = %runtime.request_id)
    });

    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let result = dispatch(cli.command, &ctx)
        .instrument(span)
        .with_subscriber(runtime.logger)
        .await;
    watcher.abort();
    result
}

pub(crate) async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Event(EventArgs { auth, command }) => {
            ctx.authenticate(auth.access_key.as_deref())?;
            match command {
                EventCommand::List(args) => events::handle_event_list(ctx, args).await,
                EventCommand::Get(args) => events::handle_event_get(ctx, args).await,
                EventCommand::Create(args) => events::handle_event_create(ctx, args).await,
                EventCommand::Update(args) => events::handle_event_update(ctx, args).await,
            }
        }
        Command::AccessKey(AccessKeyArgs { auth, command }) => {
            ctx.authenticate(auth.access_key.as_deref())?;
            match command {
                AccessKeyCommand::List(args) => {
                    access_keys::handle_access_key_list(ctx, args).await
                }
                AccessKeyCommand::Get(args) => access_keys::handle_access_key_get(ctx, args).await,
                AccessKeyCommand::Create(args) => {
                    access_keys::handle_access_key_create(ctx, args).await
                }
                AccessKeyCommand::Delete(args) => {
                    access_keys::handle_access_key_delete(ctx, args).await
                }
                AccessKeyCommand::Permissions(PermissionsCommand::Get(args)) => {
                    access_keys::handle_permissions_get(ctx, args).await
                }
                AccessKeyCommand::Permissions(PermissionsCommand::Set(args)) => {
                    access_keys::handle_permissions_set(ctx, args).await
                }
                AccessKeyCommand::Rotate(args) => access_keys::handle_key_rotate(ctx, args).await,
            }
        }
        Command::Workspace(WorkspaceArgs { auth, command }) => {
            ctx.authenticate(auth.access_key.as_deref())?;
            match command {
                WorkspaceCommand::List(args) => workspaces::handle_workspace_list(ctx, args).await,
                WorkspaceCommand::Create(args) => {
                    workspaces::handle_workspace_create(ctx, args).await
                }
            }
        }
        Command::Version(args) => version::handle_version(&args),
    }
}

#[derive(Parser)]
#[command(
    name = "ensync",
    version,
    about = "Manage events, access keys, and workspaces on the EnSync platform"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file (default: $HOME/.ensync/config.yaml)"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable debug logging")]
    pub(crate) debug: bool,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Json,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage event definitions
    Event(EventArgs),
    /// Manage access keys and their permissions
    AccessKey(AccessKeyArgs),
    /// Manage workspaces
    Workspace(WorkspaceArgs),
    /// Print version information
    Version(VersionArgs),
}

#[derive(Args, Default)]
pub(crate) struct AuthArgs {
    #[arg(
        long = "access-key",
        global = true,
        env = "ENSYNC_ACCESS_KEY",
        hide_env_values = true,
        help = "Access key for API authentication"
    )]
    pub(crate) access_key: Option<String>,
}

#[derive(Args)]
pub(crate) struct EventArgs {
    #[command(flatten)]
    pub(crate) auth: AuthArgs,
    #[command(subcommand)]
    pub(crate) command: EventCommand,
}

#[derive(Subcommand)]
pub(crate) enum EventCommand {
    /// List events
    List(ListArgs),
    /// Get an event by name
    Get(EventGetArgs),
    /// Create a new event
    Create(EventCreateArgs),
    /// Replace an event's name and payload
    Update(EventUpdateArgs),
}

#[derive(Args)]
pub(crate) struct EventGetArgs {
    #[arg(long, help = "Event name")]
    pub(crate) name: String,
}

#[derive(Args)]
pub(crate) struct EventCreateArgs {
    #[arg(long, help = "Event name")]
    pub(crate) name: String,
    #[arg(long, default_value = "{}", help = "Event payload as a JSON object")]
    pub(crate) payload: String,
}

#[derive(Args)]
pub(crate) struct EventUpdateArgs {
    #[arg(long, help = "Event identifier")]
    pub(crate) id: String,
    #[arg(long, help = "New event name")]
    pub(crate) name: String,
    #[arg(long, default_value = "{}", help = "Event payload as a JSON object")]
    pub(crate) payload: String,
}

#[derive(Args)]
pub(crate) struct AccessKeyArgs {
    #[command(flatten)]
    pub(crate) auth: AuthArgs,
    #[command(subcommand)]
    pub(crate) command: AccessKeyCommand,
}

#[derive(Subcommand)]
pub(crate) enum AccessKeyCommand {
    /// List access keys
    List(AccessKeyListArgs),
    /// Get an access key by identifier
    Get(AccessKeyIdArgs),
    /// Create a new access key with permissions
    Create(AccessKeyCreateArgs),
    /// Delete an access key
    Delete(AccessKeyIdArgs),
    /// Manage access key permissions
    #[command(subcommand)]
    Permissions(PermissionsCommand),
    /// Generate a new service key pair for an access key
    Rotate(RotateArgs),
}

#[derive(Args)]
pub(crate) struct AccessKeyListArgs {
    #[command(flatten)]
    pub(crate) list: ListArgs,
    #[arg(long, help = "Filter by access key")]
    pub(crate) key: Option<String>,
}

#[derive(Args)]
pub(crate) struct AccessKeyIdArgs {
    #[arg(long, alias = "key", help = "Access key identifier")]
    pub(crate) id: String,
}

#[derive(Args)]
pub(crate) struct AccessKeyCreateArgs {
    #[arg(long, help = "Display name")]
    pub(crate) name: String,
    #[arg(long = "type", value_enum, default_value_t = KeyTypeArg::Service, help = "Key type")]
    pub(crate) key_type: KeyTypeArg,
    #[arg(long, help = "Permissions as JSON, e.g. '{\"send\":[\"*\"],\"receive\":[]}'")]
    pub(crate) permissions: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum KeyTypeArg {
    #[value(alias = "service")]
    Service,
    #[value(alias = "account")]
    Account,
}

#[derive(Subcommand)]
pub(crate) enum PermissionsCommand {
    /// Get access key permissions
    Get(AccessKeyIdArgs),
    /// Replace access key permissions
    Set(PermissionsSetArgs),
}

#[derive(Args)]
pub(crate) struct PermissionsSetArgs {
    #[arg(long, alias = "key", help = "Access key identifier")]
    pub(crate) id: String,
    #[arg(long, help = "Permissions as JSON, e.g. '{\"send\":[\"orders\"],\"receive\":[\"*\"]}'")]
    pub(crate) permissions: String,
}

#[derive(Args)]
pub(crate) struct RotateArgs {
    #[arg(long, help = "Access key whose service key pair is regenerated")]
    pub(crate) key: String,
}

#[derive(Args)]
pub(crate) struct WorkspaceArgs {
    #[command(flatten)]
    pub(crate) auth: AuthArgs,
    #[command(subcommand)]
    pub(crate) command: WorkspaceCommand,
}

#[derive(Subcommand)]
pub(crate) enum WorkspaceCommand {
    /// List workspaces
    List(ListArgs),
    /// Create a new workspace
    Create(WorkspaceCreateArgs),
}

#[derive(Args)]
pub(crate) struct WorkspaceCreateArgs {
    #[arg(long, help = "Workspace name")]
    pub(crate) name: String,
}

#[derive(Args, Default)]
pub(crate) struct VersionArgs {
    #[arg(long, help = "Output as JSON")]
    pub(crate) json: bool,
}

/// Paging and sorting flags shared by list commands.
#[derive(Args, Clone, Debug)]
pub(crate) struct ListArgs {
    #[arg(long, default_value_t = 0, help = "Page index (0-based)")]
    pub(crate) page: u32,
    #[arg(long, default_value_t = DEFAULT_LIMIT, help = "Items per page (1-100)")]
    pub(crate) limit: u32,
    #[arg(long, default_value = "DESC", help = "Sort order (ASC or DESC)")]
    pub(crate) order: String,
    #[arg(long = "order-by", default_value = DEFAULT_ORDER_BY, help = "Field to order by")]
    pub(crate) order_by: String,
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            page: 0,
            limit: DEFAULT_LIMIT,
            order: SortOrder::Desc.as_str().to_string(),
            order_by: DEFAULT_ORDER_BY.to_string(),
        }
    }
}

impl ListArgs {
    /// Build list parameters, rejecting values the API would refuse.
    pub(crate) fn to_params(&self, allowed_order_by: &[&str]) -> CliResult<ListParams> {
        let order = self
            .order
            .parse::<SortOrder>()
            .map_err(|err| CliError::validation(err.to_string()))?;
        let params = ListParams {
            page_index: self.page,
            limit: self.limit,
            order,
            order_by: self.order_by.trim().to_string(),
            ..ListParams::default()
        };
        params
            .validate(allowed_order_by)
            .map_err(|err| CliError::validation(err.to_string()))?;
        Ok(params)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Json,
    Table,
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Event(args) => match args.command {
            EventCommand::List(_) => "event_list",
            EventCommand::Get(_) => "event_get",
            EventCommand::Create(_) => "event_create",
            EventCommand::Update(_) => "event_update",
        },
        Command::AccessKey(args) => match args.command {
            AccessKeyCommand::List(_) => "access_key_list",
            AccessKeyCommand::Get(_) => "access_key_get",
            AccessKeyCommand::Create(_) => "access_key_create",
            AccessKeyCommand::Delete(_) => "access_key_delete",
            AccessKeyCommand::Permissions(PermissionsCommand::Get(_)) => "permissions_get",
            AccessKeyCommand::Permissions(PermissionsCommand::Set(_)) => "permissions_set",
            AccessKeyCommand::Rotate(_) => "access_key_rotate",
        },
        Command::Workspace(args) => match args.command {
            WorkspaceCommand::List(_) => "workspace_list",
            WorkspaceCommand::Create(_) => "workspace_create",
        },
        Command::Version(_) => "version",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ensync_api::params::EVENT_ORDER_FIELDS;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn access_key_flag_is_accepted_after_the_leaf_command() {
        let cli = parse(&["ensync", "event", "list", "--access-key", "k-1", "--limit", "5"]);
        let Command::Event(EventArgs { auth, command }) = cli.command else {
            panic!("expected event command");
        };
        assert_eq!(auth.access_key.as_deref(), Some("k-1"));
        let EventCommand::List(list) = command else {
            panic!("expected list");
        };
        assert_eq!(list.limit, 5);
        assert_eq!(list.order, "DESC");
        assert_eq!(list.order_by, "createdAt");
    }

    #[test]
    fn global_flags_apply_anywhere() {
        let cli = parse(&[
            "ensync",
            "workspace",
            "create",
            "--name",
            "gms",
            "--debug",
            "--output",
            "table",
            "--config",
            "/tmp/ensync.yaml",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.output, OutputFormat::Table);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ensync.yaml")));
        assert_eq!(command_label(&cli.command), "workspace_create");
    }

    #[test]
    fn nested_permission_commands_parse() {
        let cli = parse(&[
            "ensync",
            "access-key",
            "permissions",
            "set",
            "--key",
            "ak-1",
            "--permissions",
            r#"{"send":["*"]}"#,
        ]);
        assert_eq!(command_label(&cli.command), "permissions_set");
        let Command::AccessKey(AccessKeyArgs {
            command: AccessKeyCommand::Permissions(PermissionsCommand::Set(args)),
            ..
        }) = cli.command
        else {
            panic!("expected permissions set");
        };
        assert_eq!(args.id, "ak-1");
    }

    #[test]
    fn key_type_accepts_either_case() {
        let cli = parse(&["ensync", "access-key", "create", "--name", "svc", "--type", "account"]);
        let Command::AccessKey(AccessKeyArgs {
            command: AccessKeyCommand::Create(args),
            ..
        }) = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(args.key_type, KeyTypeArg::Account);
    }

    #[test]
    fn required_flags_are_enforced() {
        assert!(Cli::try_parse_from(["ensync", "event", "get"]).is_err());
        assert!(Cli::try_parse_from(["ensync", "access-key", "rotate"]).is_err());
        assert!(Cli::try_parse_from(["ensync", "event", "list", "--limit", "-1"]).is_err());
    }

    #[test]
    fn list_args_are_validated_locally() {
        let args = ListArgs {
            order: "asc".into(),
            ..ListArgs::default()
        };
        let params = args.to_params(EVENT_ORDER_FIELDS).expect("valid params");
        assert_eq!(params.order, SortOrder::Asc);

        for invalid in [
            ListArgs {
                limit: 0,
                ..ListArgs::default()
            },
            ListArgs {
                limit: 101,
                ..ListArgs::default()
            },
            ListArgs {
                order: "sideways".into(),
                ..ListArgs::default()
            },
            ListArgs {
                order_by: "payload".into(),
                ..ListArgs::default()
            },
        ] {
            let err = args_error(&invalid);
            assert_eq!(err.exit_code(), 2);
        }
    }

    fn args_error(args: &ListArgs) -> CliError {
        match args.to_params(EVENT_ORDER_FIELDS) {
            Ok(params) => panic!("expected rejection, got {params:?}"),
            Err(err) => err,
        }
    }
}
