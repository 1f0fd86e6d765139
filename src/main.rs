use optsolve::{init_tracing, start_server, ServerConfig, SolverFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Decide the engine once, before any request is served
    let capability = SolverFactory::detect();

    // Configure and start server
    let config = ServerConfig::from_env(capability)?;
    start_server(config).await?;

    Ok(())
}
