//! Cristin Gateway CLI
//!
//! Manual calls against the upstream through the retrying client. Prints the
//! classified outcome as JSON and exits non-zero unless the call succeeded.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cristin_gateway::{
    client::{BlockingUpstreamClient, UpstreamClient},
    config,
    error::Result,
    models::{Config, Outcome, UpstreamRequest},
    services::{Endpoints, Resource},
};
use serde::Serialize;
use serde_json::Value;

/// Cristin Gateway - retrying client for the Cristin API
#[derive(Parser, Debug)]
#[command(
    name = "cristin-gateway",
    version,
    about = "Retrying, classifying client for the Cristin research registry API"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the blocking client instead of the async one
    #[arg(long, global = true)]
    blocking: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a single resource
    Get {
        /// unit, person, project, biobank or funding-source
        resource: Resource,
        id: String,
    },

    /// Search a resource collection
    Search {
        resource: Resource,

        /// Query parameter as name=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Fetch several resources of one kind, dropping the ones that fail
    Batch {
        resource: Resource,

        #[arg(required = true)]
        ids: Vec<String>,

        /// Calls in flight at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

/// Main entry point for the CLI application.
///
/// Not `#[tokio::main]`: the blocking client owns its own runtime and must
/// not be created inside another one.
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        log::info!("Upstream: {}", config.upstream.base_uri);
        log::info!(
            "Retry: {} attempts, {}ms initial delay",
            config.retry.max_attempts,
            config.retry.initial_delay_ms
        );
        log::info!("Config OK");
        return Ok(ExitCode::SUCCESS);
    }

    let endpoints = Endpoints::from_config(&config.upstream)?;
    if cli.blocking {
        run_blocking(&config, &endpoints, cli.command)
    } else {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(run_async(&config, &endpoints, cli.command))
    }
}

fn run_blocking(config: &Config, endpoints: &Endpoints, command: Command) -> Result<ExitCode> {
    let client = BlockingUpstreamClient::from_config(&config.upstream, &config.retry)?;

    match command {
        Command::Get { resource, id } => {
            let request = authorize(config, endpoints.item_request(resource, &id)?);
            emit_outcome(&client.fetch::<Value>(&request))
        }
        Command::Search { resource, params } => {
            let request = authorize(config, endpoints.search_request(resource, &params)?);
            emit_outcome(&client.fetch_page::<Value>(&request))
        }
        Command::Batch { resource, ids, .. } => {
            let requests = item_requests(config, endpoints, resource, &ids)?;
            let values: Vec<Value> = requests
                .iter()
                .filter_map(|request| client.fetch::<Value>(request).success())
                .collect();
            emit_batch(ids.len(), &values)
        }
        Command::Validate => Ok(ExitCode::SUCCESS),
    }
}

async fn run_async(config: &Config, endpoints: &Endpoints, command: Command) -> Result<ExitCode> {
    let client = UpstreamClient::from_config(&config.upstream, &config.retry)?;

    match command {
        Command::Get { resource, id } => {
            let request = authorize(config, endpoints.item_request(resource, &id)?);
            emit_outcome(&client.fetch::<Value>(&request).await)
        }
        Command::Search { resource, params } => {
            let request = authorize(config, endpoints.search_request(resource, &params)?);
            emit_outcome(&client.fetch_page::<Value>(&request).await)
        }
        Command::Batch {
            resource,
            ids,
            concurrency,
        } => {
            let requests = item_requests(config, endpoints, resource, &ids)?;
            let values: Vec<Value> = client.fetch_many(&requests, concurrency).await;
            emit_batch(ids.len(), &values)
        }
        Command::Validate => Ok(ExitCode::SUCCESS),
    }
}

fn authorize(config: &Config, request: UpstreamRequest) -> UpstreamRequest {
    match config::credentials(config) {
        Some(credentials) => request.with_credentials(credentials),
        None => request,
    }
}

fn item_requests(
    config: &Config,
    endpoints: &Endpoints,
    resource: Resource,
    ids: &[String],
) -> Result<Vec<UpstreamRequest>> {
    ids.iter()
        .map(|id| Ok(authorize(config, endpoints.item_request(resource, id)?)))
        .collect()
}

fn emit_outcome<T: Serialize>(outcome: &Outcome<T>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        log::error!("Call failed (gateway status {})", outcome.gateway_status());
        Ok(ExitCode::FAILURE)
    }
}

fn emit_batch(requested: usize, values: &[Value]) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(values)?);
    if values.len() == requested {
        Ok(ExitCode::SUCCESS)
    } else {
        log::error!("{} of {} calls failed", requested - values.len(), requested);
        Ok(ExitCode::FAILURE)
    }
}
