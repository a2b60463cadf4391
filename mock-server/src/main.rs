use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// serve the sample schema and stream fake records
#[derive(Parser, Debug)]
struct Args {
    /// address to listen on
    #[arg(long, env = "MOCK_SERVER_BIND", default_value = "127.0.0.1:5021")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "mock server listening");
    mock_server::serve(listener).await?;
    Ok(())
}
