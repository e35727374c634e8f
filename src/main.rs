use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay::config::Config;
use relay::context::Context;
use relay::middleware::Next;
use relay::proxy::{self, AppState};
use relay::server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));
    let chain = proxy::pipeline(state);

    let server = Server::bind(&bind_addr).await?;
    info!(address = %server.local_addr(), "relay listening");

    server
        .run(move |request| {
            let chain = chain.clone();
            async move { Next::new(chain).run(Context::new(request)).await }
        })
        .await?;

    Ok(())
}
