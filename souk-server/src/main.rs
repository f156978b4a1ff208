use souk_server::{print_banner, setup_environment, Config, Server, ServerState};

#[tokio::main]
async fn main() {
    if let Err(e) = setup_environment() {
        eprintln!("Failed to set up environment: {}", e);
        std::process::exit(1);
    }

    print_banner();

    let config = Config::from_env();
    tracing::info!(
        "Starting souk-server v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let state = ServerState::initialize(&config);
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
