mod api;
mod aws;
mod recovery;
mod utils;

#[cfg(test)]
mod tests;

use anyhow::Context;
use axum::{middleware, routing::get, Router};
use clap::{Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use recovery::{Dispatcher, RawEvent, RecoveryContext};

/// 1001 Stories Disaster Recovery Orchestrator
#[derive(Parser)]
#[command(name = "dr-orchestrator", version, about)]
struct Cli {
    /// Optionale TOML Konfigurationsdatei (Environment überschreibt)
    #[arg(long, env = "DR_CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Als AWS Lambda Function laufen (Default)
    Lambda,
    /// Lokaler HTTP Server mit POST /invoke
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ein einzelnes Event aus Datei (oder `-` für stdin) verarbeiten
    Invoke {
        #[arg(long, default_value = "-")]
        event: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Lambda);

    // Initialize logging
    let _guard = utils::init_logging(!matches!(command, Command::Lambda));

    let config = utils::Config::load(cli.config.as_deref())?;
    tracing::info!(
        primary_region = %config.primary_region,
        backup_region = %config.backup_region,
        rto_target_seconds = config.rto_target_seconds,
        "Starting 1001 Stories DR orchestrator"
    );

    let services = aws::connect(&config).await?;
    let metrics = Arc::new(utils::Metrics::new());
    let port = config.server_port;
    let request_timeout = Duration::from_secs(config.rto_target_seconds.max(60));
    let dispatcher = Arc::new(Dispatcher::new(
        RecoveryContext::new(config, services),
        metrics.clone(),
    ));

    match command {
        Command::Lambda => run_lambda(dispatcher).await,
        Command::Serve { port: override_port } => {
            serve(dispatcher, metrics, override_port.unwrap_or(port), request_timeout).await
        }
        Command::Invoke { event } => invoke_once(&dispatcher, &event).await,
    }
}

async fn run_lambda(dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<RawEvent>| {
        let dispatcher = dispatcher.clone();
        async move {
            tracing::info!(request_id = %event.context.request_id, "Lambda invocation");
            Ok::<_, lambda_runtime::Error>(dispatcher.dispatch(event.payload).await)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

async fn serve(
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<utils::Metrics>,
    port: u16,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let app = Router::new()
        .nest("/api/admin", api::admin_router(metrics))
        .merge(api::invoke_router(dispatcher))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(logging_middleware))
                .layer(TimeoutLayer::new(request_timeout)),
        );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server listening on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn invoke_once(dispatcher: &Dispatcher, source: &str) -> anyhow::Result<()> {
    let raw = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading event file {source}"))?
    };

    let event: RawEvent = serde_json::from_str(&raw).context("parsing event JSON")?;
    let response = dispatcher.dispatch(event).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Logging middleware
async fn logging_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}
