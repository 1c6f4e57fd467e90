use tabula::prelude::*;
use tabula::{init_tracing, LoggingConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), formdesk::BoxError> {
    let config = TabulaConfig::load("dev")?;
    let logging: LoggingConfig = config.section()?;
    init_tracing(&logging);

    let server: ServerConfig = config.section()?;
    let state = formdesk::build_state(&config).await?;

    let listener = tokio::net::TcpListener::bind(&server.addr).await?;
    tracing::info!(addr = %server.addr, profile = config.profile(), "formdesk listening");
    tabula::http::serve(listener, formdesk::app(state)).await?;
    Ok(())
}
