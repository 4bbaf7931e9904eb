//! `rijmdoc` - Sinterklaas rhyme to Word document service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rijmdoc::config::Config;
use rijmdoc::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("rijmdoc=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    tracing::info!("{} {}", config.app_name(), config.app_version());
    tracing::info!("Template path: {}", config.template_path.display());
    tracing::info!("Template exists: {}", config.template_exists());
    if let Some(style) = &config.paragraph_style {
        tracing::info!("Rhyme paragraph style: {style}");
    }

    server::serve(config).await?;
    Ok(())
}
