/// ACOMPANY server binary
use acompany::{
    config::{LogFormat, LoggingConfig, ServerConfig},
    error::AppResult,
    server, AppContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration first so the log format can follow it
    let config = ServerConfig::from_env()?;

    init_tracing(&config.logging);

    print_banner();

    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn print_banner() {
    println!(
        r#"
     _   ___ ___  __  __ ___  _   _  ___   __
    /_\ / __/ _ \|  \/  | _ \/_\ | \| \ \ / /
   / _ \ (_| (_) | |\/| |  _/ _ \| .` |\ V /
  /_/ \_\___\___/|_|  |_|_|/_/ \_\_|\_| |_|

        Element membership service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
