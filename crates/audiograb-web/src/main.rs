use audiograb_core::FetchConfig;
use audiograb_web::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = FetchConfig::from_env();
    let addr = config.bind_addr.clone();
    let state = AppState::new(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!(
        "listening on {addr}, max {} concurrent fetches, sources: {:?}",
        state.gate.max_concurrent(),
        state.chain.planned_sources()
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
