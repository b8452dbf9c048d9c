// ABOUTME: The promptforge binary: HTTP server or one-shot document run
// ABOUTME: Wires config, provider, governor, storage and the pipeline together

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::Method;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use promptforge_ai::{AnthropicProvider, ProviderConfig};
use promptforge_api::{create_router, AppState, HttpPaymentClient, PaymentClient};
use promptforge_core::{DocumentMode, EngineeringRequest, OutputStyle};
use promptforge_governor::{RateGovernor, ResponseCache};
use promptforge_pipeline::{PipelineConfig, PipelineEngine};
use promptforge_storage::ContextStore;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "promptforge", about = "Turns short product ideas into engineered documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MIP-003 HTTP server
    Serve,
    /// Engineer one document and print it
    Run {
        /// Description of the prompt or PRD to engineer
        text: String,
        /// Document mode: prompt or prd
        #[arg(long, default_value = "prompt")]
        mode: String,
        /// Output style: structured, minimal, or conversational
        #[arg(long, default_value = "structured")]
        style: String,
    },
}

fn build_engine(config: &Config) -> (Arc<PipelineEngine>, Arc<RateGovernor>, Arc<ResponseCache>) {
    let mut provider_config = ProviderConfig::new(config.api_key.clone());
    if let Some(model) = &config.model {
        provider_config = provider_config.with_model(model.clone());
    }
    let generator = Arc::new(AnthropicProvider::new(provider_config));

    let governor = Arc::new(RateGovernor::new(config.governor.clone()));
    let cache = Arc::new(ResponseCache::new(config.cache_ttl));

    let engine = Arc::new(PipelineEngine::new(
        generator,
        governor.clone(),
        cache.clone(),
        ContextStore::new(&config.context_dir),
        PipelineConfig::new(&config.checkpoint_dir).with_budget_secs(config.budget_secs),
    ));
    (engine, governor, cache)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let (engine, governor, cache) = build_engine(&config);

    let payment: Option<Arc<dyn PaymentClient>> = config
        .payment
        .clone()
        .map(|payment_config| {
            info!(service_url = %payment_config.service_url, "payment gating enabled");
            Arc::new(HttpPaymentClient::new(payment_config)) as Arc<dyn PaymentClient>
        });
    if payment.is_none() {
        info!("payment not configured, jobs run unpaid");
    }

    let state = AppState::new(
        engine,
        governor,
        cache,
        payment,
        config.agent_identifier.clone(),
    );

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_once(config: Config, text: String, mode: String, style: String) -> anyhow::Result<()> {
    let mode = DocumentMode::from_str(&mode).map_err(anyhow::Error::msg)?;
    let style = OutputStyle::from_str(&style).map_err(anyhow::Error::msg)?;
    let request = EngineeringRequest::new(text, style, mode, None)?;

    let (engine, _, _) = build_engine(&config);
    let outcome = engine.run(&request).await?;

    println!("{}", outcome.document);
    println!();
    println!("{}", outcome.score.report());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("promptforge=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Run { text, mode, style } => run_once(config, text, mode, style).await,
    }
}
