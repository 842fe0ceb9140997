//! Querygate - HTTP gateway in front of a tool-augmented agent runtime.

use clap::Parser;
use querygate::config::Config;
use querygate::runner::{AgentRunner, HttpAgentRunner};
use querygate::server::{build_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// ---- CLI ----

#[derive(Parser)]
#[command(name = "querygate", about = "Agent query gateway", version = querygate::VERSION)]
struct Args {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port
    #[arg(long, short, env = "PORT", default_value_t = 8080)]
    port: u16,
}

// ---- Main ----

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,querygate=debug".into()),
        )
        .init();

    let args = Args::parse();

    // Load config
    let config = Config::from_env()?;
    config.validate()?;

    // Build the runtime client and shared state
    let runner = Arc::new(HttpAgentRunner::new(config.runner.clone())?);
    info!(
        runner = runner.name(),
        runtime = %config.runner.base_url,
        session_policy = %config.session.policy,
        route_mode = %config.http.route_mode,
        "Gateway configured"
    );

    let state = AppState::new(runner, config.session.clone());

    // Build router
    let app = build_router(state, &config);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Gateway listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
