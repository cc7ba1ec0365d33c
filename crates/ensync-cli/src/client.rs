//! CLI error type, application context, and API client construction.

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::sync::Arc;

use ensync_api::{ApiError, ApiService, Client, RequestError};
use ensync_config::{ConfigError, ConfigLoader, Settings};
use ensync_telemetry::{LogFormat, LoggingConfig, build_dispatch, level_for};
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, debug};
use uuid::Uuid;

use crate::cli::{Cli, OutputFormat};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// API statuses that indicate a problem with the caller's input.
const INPUT_REJECTED_STATUSES: [u16; 3] = [400, 409, 422];

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        let rejected_input = matches!(
            error.request_error(),
            Some(RequestError::InvalidUrl { .. } | RequestError::Encode { .. })
        ) || error
            .status()
            .is_some_and(|status| INPUT_REJECTED_STATUSES.contains(&status));

        let error = anyhow::Error::new(error);
        if rejected_input {
            Self::Validation(format!("{error:#}"))
        } else {
            Self::Failure(error)
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Io { .. } => Self::Failure(error.into()),
            other => Self::Validation(format!("{:#}", anyhow::Error::new(other))),
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: Arc<dyn ApiService>,
    pub(crate) cancel: CancellationToken,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    pub(crate) fn new(
        api: impl ApiService + 'static,
        cancel: CancellationToken,
        output: OutputFormat,
    ) -> Self {
        Self {
            api: Arc::new(api),
            cancel,
            output,
        }
    }

    /// Validate the access key and install it on the client.
    pub(crate) fn authenticate(&self, access_key: Option<&str>) -> CliResult<()> {
        let access_key = access_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                CliError::validation(
                    "access key is required (pass --access-key or set ENSYNC_ACCESS_KEY)",
                )
            })?;
        self.api.set_access_key(access_key);
        Ok(())
    }
}

/// Logger and API client assembled from flags, configuration, and environment.
pub(crate) struct Runtime {
    pub(crate) client: Client,
    pub(crate) logger: Dispatch,
    pub(crate) request_id: String,
}

impl Runtime {
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let early = logger(cli.debug)?;
        let settings =
            tracing::dispatcher::with_default(&early, || load_settings(cli.config.as_deref()))?;
        let logger = if settings.debug && !cli.debug {
            logger(true)?
        } else {
            early
        };

        let request_id = Uuid::new_v4().to_string();
        let client = build_client(&settings, &request_id, logger.clone())?;
        Ok(Self {
            client,
            logger,
            request_id,
        })
    }
}

fn logger(debug: bool) -> CliResult<Dispatch> {
    let config = LoggingConfig {
        level: level_for(debug),
        format: LogFormat::infer(),
    };
    build_dispatch(&config).map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context("failed to set up logging"))
    })
}

pub(crate) fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    let loader = match path {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let settings = loader.load()?;
    debug!(
        path = %loader.config_path().display(),
        base_url = %settings.base_url,
        "configuration loaded"
    );
    Ok(settings)
}

pub(crate) fn build_client(
    settings: &Settings,
    request_id: &str,
    logger: Dispatch,
) -> CliResult<Client> {
    let mut builder = Client::builder(settings.base_url.clone())
        .rate_limit(
            settings.rate_limit.requests_per_second,
            settings.rate_limit.burst,
        )
        .default_header(HEADER_REQUEST_ID, request_id)
        .logger(logger);
    if let Some(timeout) = settings.timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context("failed to build API client"))
    })
}
