use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wall_server::{build_state, http::router, serve, CliArgs, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    init_tracing(cli.log_json);

    let config = ServerConfig::load(&cli).context("failed to load configuration")?;
    tracing::info!(
        version = wall_server::VERSION,
        bind = %config.bind,
        database = %config.database_url,
        model = %config.imagen.model,
        "starting wall server"
    );

    let state = build_state(&config).await.context("failed to initialise state")?;
    let app = router(state, config.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
