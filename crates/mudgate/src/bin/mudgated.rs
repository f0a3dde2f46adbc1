//! `mudgated`: runs a Mudgate login server.
//!
//! ```text
//! MUDGATE_STORE_URI=file:///var/lib/mudgate/users mudgated --conf /etc/mudgate.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mudgate::config::{self, ConfigError, Settings};
use mudgate::logging::init_tracing;
use mudgate::{MudgateError, MudgateServer};
use mudgate_store::{StoreBackend, StoreError};

#[derive(Debug, Parser)]
#[command(name = "mudgated", version, about = "Login gateway for line-based MUD servers")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long = "conf", default_value = "config.toml")]
    conf: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match Settings::load(&args.conf) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("mudgated: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&settings.logging) {
        eprintln!("mudgated: {e}");
        return ExitCode::FAILURE;
    }

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "mudgated exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), MudgateError> {
    settings.log();

    let uri = config::store_uri_from_env()?;
    let store = StoreBackend::from_uri(&uri).await.map_err(|e| match e {
        StoreError::InvalidUri(uri) => MudgateError::from(ConfigError::UnsupportedStoreUri(uri)),
        other => other.into(),
    })?;
    tracing::info!(store = %store_kind(&store), "credential store ready");

    let server = MudgateServer::builder().settings(settings).build(store).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}

fn store_kind(store: &StoreBackend) -> &'static str {
    match store {
        StoreBackend::Memory(_) => "memory",
        StoreBackend::File(_) => "file",
    }
}
