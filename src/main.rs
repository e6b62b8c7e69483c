use estatecal::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting estatecal");

    // Load configuration
    let config = startup::load_config().await?;

    // Show the agenda and keep it fresh
    startup::run(config).await
}
