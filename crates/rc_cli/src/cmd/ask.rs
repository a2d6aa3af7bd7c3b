use std::io;

use rc_chat::{ChatController, ChatRequest, HttpTransport};
use rc_config::Config;
use rc_conversation::TurnStatus;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    render::Renderer,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Ask {
    /// The message to send.
    message: String,

    /// Continue an existing conversation.
    #[arg(long)]
    conversation: Option<String>,

    /// The model to answer with.
    #[arg(short, long)]
    model: Option<String>,

    /// Restrict retrieval to a single document.
    #[arg(short, long)]
    document: Option<String>,
}

impl Ask {
    pub(crate) async fn run(self, config: Config) -> Result<()> {
        let controller = ChatController::new(
            HttpTransport::new(config.client.relay_url),
            config.client.placeholder,
        );

        let pending = controller.submit(self.request())?;
        let handle = pending.handle();
        let mut updates = handle.subscribe();
        let mut renderer = Renderer::new(io::stdout());

        let run = pending.run();
        tokio::pin!(run);

        let mut signals = true;
        let turn = loop {
            tokio::select! {
                turn = &mut run => break turn,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break (&mut run).await;
                    }

                    let turn = updates.borrow_and_update().clone();
                    renderer.render(&turn)?;
                }
                signal = tokio::signal::ctrl_c(), if signals => match signal {
                    Ok(()) => {
                        debug!(turn = %handle.id(), "Cancelling reply.");
                        handle.cancel();
                    }
                    Err(error) => {
                        warn!(%error, "Unable to listen for Ctrl-C.");
                        signals = false;
                    }
                },
            }
        };

        renderer.render(&turn)?;

        match turn.status {
            TurnStatus::Error => Err(Error::Reply(turn.assistant_content)),
            TurnStatus::Cancelled => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn request(&self) -> ChatRequest {
        ChatRequest {
            message: self.message.clone(),
            conversation_id: self.conversation.as_deref().map(Into::into),
            model: self.model.clone(),
            document_id: self.document.clone(),
        }
    }
}
