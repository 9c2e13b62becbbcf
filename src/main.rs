use anyhow::Context;
use tokio::net::TcpListener;

use portfolio_contact::configuration::get_configuration;
use portfolio_contact::startup::{get_app_state, run};
use portfolio_contact::telemetry::{get_subscriber, initialize_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "portfolio-contact".to_string(),
        "info".to_string(),
        std::io::stdout,
    );
    initialize_subscriber(subscriber)?;

    let configuration = get_configuration().context("Failed to read configuration")?;
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    let app_state =
        get_app_state(&configuration).context("Failed to build the application state")?;

    tracing::info!(%address, "Serving contact notifications");
    run(listener, app_state).await?;

    Ok(())
}
