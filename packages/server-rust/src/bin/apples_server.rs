//! Apples API server.
//!
//! Every flag can also be set through the environment variable named in its
//! help text. Logging honours `RUST_LOG` (default `info`).

use std::time::Duration;

use anyhow::Result;
use apples_server::{NetworkConfig, NetworkModule};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "apples-server", version, about = "REST API for managing apples")]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "APPLES_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "INTERNAL_PORT", default_value_t = 3000)]
    port: u16,

    /// Port clients use to reach the server, when it differs from `--port`.
    #[arg(long, env = "EXTERNAL_PORT")]
    external_port: Option<u16>,

    /// Prefix to mount every route under, e.g. `/v1`.
    #[arg(long, env = "PATH_PREFIX", default_value = "")]
    path_prefix: String,

    /// Allowed CORS origins, comma separated. `*` allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            external_port: self.external_port,
            path_prefix: self.path_prefix.clone(),
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.network_config();
    info!(?config, "starting apples server");

    let mut module = NetworkModule::new(config);
    module.start().await?;
    module.serve(shutdown_signal()).await
}
