use alloy::{
    network::EthereumWallet,
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use smartguard::{
    chain::{ChainReader, DelegationStore, EthereumClient, GuardContract, IndexerClient, IndexerReader},
    config::Settings,
    handlers::{create_delegation_routes, create_risk_routes, health_check},
    services::{DelegationManager, RiskEngine},
    utils::address::parse_address,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    info!("Starting SmartGuard backend");

    let eth_client = EthereumClient::new(
        &settings.blockchain.rpc_url,
        settings.blockchain.read_retry_attempts,
    )?;
    // Probe the RPC once at startup. An unreachable node is logged, not
    // fatal: reads retry per request and the node may come up later.
    if let Err(e) = eth_client.test_connection().await {
        warn!(error = %e, "RPC connection check failed, continuing startup");
    }
    let chain: Arc<dyn ChainReader> = Arc::new(eth_client);
    let indexer: Arc<dyn IndexerReader> = Arc::new(IndexerClient::new(
        &settings.blockchain.indexer_url,
        settings.blockchain.rpc_timeout_seconds,
    )?);

    let guard_address = parse_address(&settings.blockchain.guard_contract_address)?;
    let delegation_store: Arc<dyn DelegationStore> =
        match settings.blockchain.operator_private_key.as_deref() {
            Some(key) => {
                let signer: PrivateKeySigner = key.parse()?;
                let wallet = EthereumWallet::from(signer);
                let provider = ProviderBuilder::new()
                    .with_recommended_fillers()
                    .wallet(wallet)
                    .on_http(settings.blockchain.rpc_url.parse::<Url>()?);
                info!("Operator key configured, delegation writes enabled");
                Arc::new(GuardContract::new(guard_address, provider, true))
            }
            None => {
                let provider = ProviderBuilder::new()
                    .on_http(settings.blockchain.rpc_url.parse::<Url>()?);
                info!("No operator key configured, running in read-only contract mode");
                Arc::new(GuardContract::new(guard_address, provider, false))
            }
        };

    let risk_engine = Arc::new(RiskEngine::new(chain, indexer));
    let delegation_manager = Arc::new(
        DelegationManager::new(delegation_store, settings.delegation.clone())
            .with_risk_engine(risk_engine.clone())
            .with_remote_timeout(Duration::from_secs(settings.blockchain.rpc_timeout_seconds)),
    );

    let app_state = AppState {
        settings: settings.clone(),
        risk_engine,
        delegation_manager,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_risk_routes().merge(create_delegation_routes()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = settings.api.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
