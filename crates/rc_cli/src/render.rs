//! Incremental rendering of a reply to a terminal.

use std::io::{self, Write};

use rc_conversation::{Turn, TurnStatus};

/// Writes a reply as it streams in, never rewriting what was written.
///
/// The placeholder is not written. Deltas are written as they arrive, and
/// once the reply completes only what finalization added, such as the
/// citation block, is written. A cancelled reply is written up to where it
/// stopped. Error messages are left to the caller.
#[derive(Debug)]
pub(crate) struct Renderer<W> {
    out: W,

    /// Everything written so far.
    written: String,
    finished: bool,
}

impl<W: Write> Renderer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            written: String::new(),
            finished: false,
        }
    }

    pub(crate) fn render(&mut self, turn: &Turn) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }

        match turn.status {
            TurnStatus::Idle | TurnStatus::AwaitingFirstChunk => return Ok(()),
            TurnStatus::Streaming | TurnStatus::Finalizing => {
                self.write_suffix(&turn.assistant_content)?;
            }
            TurnStatus::Complete => {
                // Finalization trims the reply, so compare against what was
                // written, trimmed.
                let written = self.written.trim().to_owned();
                if let Some(rest) = turn.assistant_content.strip_prefix(&written) {
                    self.write(rest)?;
                }
                self.finish()?;
            }
            TurnStatus::Cancelled => {
                // The last fragments may not have been rendered yet.
                self.write_suffix(&turn.assistant_content)?;
                self.finish()?;
            }
            TurnStatus::Error => self.finish()?,
        }

        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_suffix(&mut self, content: &str) -> io::Result<()> {
        match content.strip_prefix(self.written.as_str()) {
            Some(rest) => self.write(rest),
            None => Ok(()),
        }
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        self.out.write_all(text.as_bytes())?;
        self.written.push_str(text);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        if self.written.is_empty() || self.written.ends_with('\n') {
            return Ok(());
        }

        self.out.write_all(b"\n")
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
