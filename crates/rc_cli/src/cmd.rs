mod ask;
mod serve;

use rc_config::Config;

use crate::error::Result;

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Commands {
    /// Run the relay in front of the chat backend.
    Serve(serve::Serve),

    /// Send a message and stream the reply to stdout.
    #[command(visible_alias = "a")]
    Ask(ask::Ask),
}

impl Commands {
    pub(crate) async fn run(self, config: Config) -> Result<()> {
        match self {
            Commands::Serve(args) => args.run(config).await,
            Commands::Ask(args) => args.run(config).await,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Commands::Serve(_) => "serve",
            Commands::Ask(_) => "ask",
        }
    }
}
