use fulfillment_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("Brewhaul fulfillment server starting...");

    let state = ServerState::initialize(&config).await?;

    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
