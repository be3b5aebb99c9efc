// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishing capability consumed by the scheduler and the manual-publish path.

use async_trait::async_trait;

use crate::error::MusebotError;
use crate::types::ChatId;

/// Posts two images with a shared caption to the fixed target channel, and
/// delivers best-effort notifications back to originating chats.
///
/// The target channel is an implementation detail of the publisher; callers
/// never pass it.
#[async_trait]
pub trait MediaPublisher {
    /// Publish a media pair to the channel. The caption must already be
    /// truncated to the publish-surface limit by the caller.
    async fn publish_media_pair(
        &self,
        image1_url: &str,
        image2_url: &str,
        caption: &str,
    ) -> Result<(), MusebotError>;

    /// Send a direct message to `chat`. Failures are non-fatal for callers;
    /// the scheduler logs and moves on.
    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), MusebotError>;
}
