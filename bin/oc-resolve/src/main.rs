//! OAuth Client Details Resolver CLI
//!
//! Resolves a client id against the configured authority and prints the
//! normalized client details as JSON. Exit codes:
//! - 0: resolved
//! - 2: client not found
//! - 3: invalid client record or client id
//! - 4: authority unavailable
//! - 1: anything else (configuration, hashing)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use oc_clients::{ClientDetailsResolver, HttpClientAuthority, ResolveError};
use oc_config::{AppConfig, ConfigLoader};

#[derive(Parser, Debug)]
#[command(name = "oc-resolve")]
#[command(about = "Resolve an OAuth client id into normalized client details")]
struct Args {
    /// Client id to resolve
    #[arg(required_unless_present = "example_config")]
    client_id: Option<String>,

    /// Config file (otherwise OAUTH_CLIENTS_CONFIG or the standard search paths)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.example_config {
        print!("{}", AppConfig::example_toml());
        return ExitCode::SUCCESS;
    }

    oc_common::logging::init_logging("oc-resolve");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            error!(error = %e, "Resolution failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;
    info!(
        authority = %config.authority.base_url,
        access_default_secs = config.resolver.default_access_token_validity_secs,
        refresh_default_secs = config.resolver.default_refresh_token_validity_secs,
        "Configuration loaded"
    );

    let authority = Arc::new(HttpClientAuthority::new(&config.authority)?);
    let resolver = ClientDetailsResolver::from_config(authority, &config)?;

    let client_id = args.client_id.unwrap_or_default();
    let details = resolver.resolve(&client_id).await?;

    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ResolveError>() {
        Some(ResolveError::ClientNotFound { .. }) => 2,
        Some(ResolveError::InvalidRecord { .. }) | Some(ResolveError::InvalidClientId) => 3,
        Some(ResolveError::AuthorityUnavailable { .. }) => 4,
        Some(ResolveError::Hashing { .. }) | None => 1,
    }
}
