//! Binary entrypoint: wires the stores, health server, console transport
//! and decision pipeline together.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wa_assist::config::ConfigStore;
use wa_assist::context::BotContext;
use wa_assist::health;
use wa_assist::pipeline::DecisionPipeline;
use wa_assist::store::{AssistStore, ReplyLedger};
use wa_assist::transport::{ConsoleTransport, ReconnectPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let data_dir = PathBuf::from(
        std::env::var("WA_ASSIST_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
    );
    let owner_id = std::env::var("WA_ASSIST_OWNER_ID").unwrap_or_else(|_| "owner".to_string());
    let health_port: u16 = std::env::var("WA_ASSIST_HEALTH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    eprintln!("wa-assist — autonomous reply engine");
    eprintln!("  data dir: {}", data_dir.display());
    eprintln!("  owner id: {owner_id}");
    eprintln!();

    let config = ConfigStore::load(data_dir.join("bot_config.json"))
        .await
        .context("loading configuration")?;
    let ledger = ReplyLedger::load(data_dir.join("replied.json")).await;
    let assist = AssistStore::load(data_dir.join("assist_state.json")).await;
    let ctx = BotContext::new(config, ledger, assist);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", health_port))
        .await
        .context("binding health listener")?;
    info!(port = health_port, "Health endpoint listening");
    let health_app = health::router(Arc::clone(&ctx));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_app).await {
            tracing::error!(error = %e, "Health server exited");
        }
    });

    let events = ConsoleTransport::spawn_reader(&owner_id, "628000000001@s.whatsapp.net");
    let transport = Arc::new(ConsoleTransport::new());
    let pipeline = DecisionPipeline::new(ctx, transport, owner_id);

    pipeline.run(events, ReconnectPolicy::default()).await;
    info!("Shutdown complete");
    Ok(())
}
