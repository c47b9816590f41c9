// # arpio-provider - Arpio provider driver
//
// This binary is a THIN integration layer: it reads one state file, runs one
// resource or data source operation and prints the resulting state. All
// provider logic lives in arpio-core; the HTTP client lives in
// arpio-client-http.
//
// ## Usage
//
// ```bash
// arpio-provider <create|read|update|delete> <resource_type> <state.json>
// arpio-provider read-data <data_source_type> <state.json>
// ```
//
// ## State File
//
// ```json
// {
//   "id": "",
//   "attributes": { "name": "site", "rpo": 60, ... },
//   "prior_attributes": null,
//   "provider": { "account_id": "..." }
// }
// ```
//
// `provider` is optional; unset provider arguments fall back to environment
// variables. The resulting state is printed to stdout as JSON.
//
// ## Configuration
//
// - `ARPIO_API_URL`, `ARPIO_API_KEY_ID`, `ARPIO_API_KEY_SECRET`, `ARPIO_ACCOUNT_ID`:
//   provider arguments
// - `ARPIO_DEBUG_WAIT`: seconds to sleep before configuring the client
// - `ARPIO_LOG_LEVEL`: trace, debug, info (default), warn or error
//
// ## Example
//
// ```bash
// export ARPIO_ACCOUNT_ID=your_account
// export ARPIO_API_KEY_ID=your_key_id
// export ARPIO_API_KEY_SECRET=your_key_secret
//
// arpio-provider create arpio_app app.json > app.state.json
// ```

use anyhow::{Context, Result};
use arpio_core::attr::{AttrMap, attr_map_from_json, attr_map_to_json};
use arpio_core::{Provider, ProviderMeta, ResourceData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Operation succeeded
/// - 1: Usage, state file or provider configuration error
/// - 2: The operation itself failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderExitCode {
    /// Operation succeeded
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Operation error
    OperationError = 2,
}

impl From<ProviderExitCode> for ExitCode {
    fn from(code: ProviderExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Operation requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Read,
    Update,
    Delete,
    ReadData,
}

impl Operation {
    fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "create" => Self::Create,
            "read" => Self::Read,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "read-data" => Self::ReadData,
            other => anyhow::bail!(
                "Unknown operation '{}'. Valid operations: create, read, update, delete, read-data",
                other
            ),
        })
    }

    /// Whether the operation plans attributes from configuration
    fn uses_configuration(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::ReadData)
    }
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Command {
    operation: Operation,
    type_name: String,
    state_path: PathBuf,
}

impl Command {
    fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [operation, type_name, state_path] => Ok(Self {
                operation: Operation::parse(operation)?,
                type_name: type_name.clone(),
                state_path: PathBuf::from(state_path),
            }),
            _ => anyhow::bail!(
                "Usage: arpio-provider <create|read|update|delete|read-data> <type> <state.json>"
            ),
        }
    }
}

/// State exchanged with the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    id: String,

    #[serde(default)]
    attributes: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    prior_attributes: Option<Value>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    provider: Value,
}

impl StateFile {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    Ok(match raw.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => anyhow::bail!(
            "ARPIO_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            raw
        ),
    })
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::from_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ProviderExitCode::ConfigError.into();
        }
    };

    let log_level = match parse_log_level(
        &env::var("ARPIO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
    ) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ProviderExitCode::ConfigError.into();
        }
    };

    // Logs go to stderr; stdout carries the resulting state
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ProviderExitCode::ConfigError.into();
    }

    let state = match StateFile::load(&command.state_path) {
        Ok(state) => state,
        Err(e) => {
            error!("{:#}", e);
            return ProviderExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ProviderExitCode::ConfigError.into();
        }
    };

    let code = rt.block_on(async {
        let mut provider = Provider::new();
        arpio_client_http::register(&mut provider);

        let meta = match configure(&provider, &state).await {
            Ok(meta) => meta,
            Err(e) => {
                error!("Provider configuration failed: {:#}", e);
                return ProviderExitCode::ConfigError;
            }
        };

        match execute(&provider, &meta, &command, state).await {
            Ok(result) => match serde_json::to_string_pretty(&result) {
                Ok(json) => {
                    println!("{}", json);
                    ProviderExitCode::Success
                }
                Err(e) => {
                    error!("Failed to render state: {}", e);
                    ProviderExitCode::OperationError
                }
            },
            Err(e) => {
                error!(
                    "{} {} failed: {:#}",
                    command.type_name,
                    operation_name(command.operation),
                    e
                );
                ProviderExitCode::OperationError
            }
        }
    });

    code.into()
}

fn operation_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "create",
        Operation::Read => "read",
        Operation::Update => "update",
        Operation::Delete => "delete",
        Operation::ReadData => "read-data",
    }
}

/// Normalize the provider block and build the client
async fn configure(provider: &Provider, state: &StateFile) -> Result<ProviderMeta> {
    provider.internal_validate()?;

    let config = attr_map_from_json(&state.provider)?;
    let attrs = provider.schema().normalize(config)?;
    let meta = provider.configure(&ResourceData::new(attrs)).await?;
    info!("Configured Arpio provider for account {}", meta.client().account_id());
    Ok(meta)
}

/// Run one operation and return the resulting state
async fn execute(
    provider: &Provider,
    meta: &ProviderMeta,
    command: &Command,
    state: StateFile,
) -> Result<StateFile> {
    let schema = match command.operation {
        Operation::ReadData => provider.data_source(&command.type_name)?.schema(),
        _ => provider.resource(&command.type_name)?.schema(),
    };

    let config = attr_map_from_json(&state.attributes)?;
    let prior = state
        .prior_attributes
        .as_ref()
        .map(attr_map_from_json)
        .transpose()?;

    let attrs: AttrMap = if command.operation.uses_configuration() {
        let normalized = schema.normalize(config)?;
        match &prior {
            Some(prior) => schema.plan(prior, normalized),
            None => normalized,
        }
    } else {
        prior.clone().unwrap_or(config)
    };

    let mut d = match prior {
        Some(prior) => ResourceData::from_prior(state.id, prior, attrs),
        None => ResourceData::with_id(state.id, attrs),
    };

    debug!(
        "Running {} on {} (id: {:?})",
        operation_name(command.operation),
        command.type_name,
        d.id()
    );

    match command.operation {
        Operation::ReadData => {
            provider
                .data_source(&command.type_name)?
                .read(&mut d, meta)
                .await?
        }
        Operation::Create => provider.resource(&command.type_name)?.create(&mut d, meta).await?,
        Operation::Read => provider.resource(&command.type_name)?.read(&mut d, meta).await?,
        Operation::Update => provider.resource(&command.type_name)?.update(&mut d, meta).await?,
        Operation::Delete => provider.resource(&command.type_name)?.delete(&mut d, meta).await?,
    }

    Ok(StateFile {
        id: d.id().to_string(),
        attributes: attr_map_to_json(d.attributes()),
        prior_attributes: None,
        provider: Value::Null,
    })
}
