use agenda::commands::Cli;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    if std::env::var("AGENDA_DEBUG").is_err() && std::env::var("RUST_LOG").is_err() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agenda=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    Cli::menu().await
}
