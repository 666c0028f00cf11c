use anyhow::Context;
use clap::Parser;
use gitcms::ContentStore;
use gitcms_server::{router, serve, AppState, Args};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = ContentStore::open(&args.repo, args.open_options())
        .with_context(|| format!("opening {}", args.repo.display()))?;
    let app = router(AppState::new(store), &args.router_options());

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!(addr = %args.bind, repo = %args.repo.display(), "gitcms-server listening");

    serve(listener, app).await?;
    Ok(())
}
