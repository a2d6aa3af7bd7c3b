use std::net::SocketAddr;

use rc_config::Config;
use rc_relay::RelayState;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Result;

#[derive(Debug, clap::Args)]
pub(crate) struct Serve {
    /// Address to listen on, overriding the configured one.
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Full URL of the backend streaming endpoint, overriding the configured
    /// one.
    #[arg(short, long)]
    backend: Option<String>,
}

impl Serve {
    pub(crate) async fn run(self, config: Config) -> Result<()> {
        let listen = self.listen.unwrap_or(config.relay.listen);
        let backend_url = rc_relay::target::backend_url(
            self.backend.as_deref().or(config.relay.backend_url.as_deref()),
            config.relay.api_base.as_deref(),
        );

        let listener = TcpListener::bind(listen).await?;
        rc_relay::serve(listener, RelayState::new(backend_url), shutdown()).await?;

        Ok(())
    }
}

/// Resolves on Ctrl-C.
async fn shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down."),
        Err(error) => {
            // Without a signal handler the relay runs until it is killed.
            error!(%error, "Unable to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    }
}
