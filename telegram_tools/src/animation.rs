use std::time::Duration;

use log::*;

use crate::{
    api::MessageGateway,
    data_objects::{EditMessageText, MessageHandle},
    TelegramApiError,
};

/// Drives a multi-step message-edit sequence against a single outbound message.
///
/// Edits for one handle are strictly ordered: each `advance` awaits the previous edit, so frame N+1 can never be
/// observed before frame N. Schedulers for different handles are independent and unordered with respect to each
/// other. A failed edit aborts the remaining frames rather than retrying; the underlying gateway already carries a
/// bounded timeout.
pub struct AnimationScheduler<G> {
    gateway: G,
    handle: MessageHandle,
}

impl<G: MessageGateway> AnimationScheduler<G> {
    pub fn new(gateway: G, handle: MessageHandle) -> Self {
        Self { gateway, handle }
    }

    pub fn handle(&self) -> &MessageHandle {
        &self.handle
    }

    /// Edits the message in place with the next frame.
    pub async fn advance<S: Into<String>>(&self, text: S) -> Result<(), TelegramApiError> {
        self.gateway.edit_message(EditMessageText::new(&self.handle, text)).await
    }

    /// Performs the final edit. Identical mechanics to [`advance`], named so call sites read like the contract.
    pub async fn finish<S: Into<String>>(&self, text: S) -> Result<(), TelegramApiError> {
        self.advance(text).await
    }

    /// Plays the given frames in order with a fixed delay between them. Returns `false` if the sequence was
    /// aborted early because an edit failed.
    pub async fn play(&self, frames: &[String], frame_delay: Duration) -> bool {
        for frame in frames {
            tokio::time::sleep(frame_delay).await;
            if let Err(e) = self.advance(frame).await {
                debug!("🎬️ Animation aborted on message {:?}: {e}", self.handle);
                return false;
            }
        }
        true
    }
}
