// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel publishing over the Telegram Bot API.
//!
//! Posts land in one fixed channel as a two-photo media group with the
//! caption on the first photo. Notifications go back to the originating
//! chat as plain messages.

use async_trait::async_trait;
use musebot_core::types::ChatId;
use musebot_core::{MediaPublisher, MusebotError};
use teloxide::prelude::*;
use teloxide::types::{ChatId as TgChatId, InputFile, InputMedia, InputMediaPhoto, Recipient};
use tracing::debug;
use url::Url;

/// Publishes generated posts to the configured target channel.
pub struct ChannelPublisher {
    bot: Bot,
    channel: TgChatId,
}

impl ChannelPublisher {
    pub fn new(bot: Bot, channel_id: i64) -> Self {
        Self {
            bot,
            channel: TgChatId(channel_id),
        }
    }
}

/// Parse a generated image reference into a URL Telegram can fetch.
fn parse_image_url(raw: &str) -> Result<Url, MusebotError> {
    Url::parse(raw).map_err(|e| MusebotError::Publish {
        message: format!("invalid image url {raw:?}: {e}"),
        source: Some(Box::new(e)),
    })
}

#[async_trait]
impl MediaPublisher for ChannelPublisher {
    async fn publish_media_pair(
        &self,
        image1_url: &str,
        image2_url: &str,
        caption: &str,
    ) -> Result<(), MusebotError> {
        let first = InputMedia::Photo(
            InputMediaPhoto::new(InputFile::url(parse_image_url(image1_url)?))
                .caption(caption.to_string()),
        );
        let second = InputMedia::Photo(InputMediaPhoto::new(InputFile::url(parse_image_url(
            image2_url,
        )?)));

        self.bot
            .send_media_group(Recipient::Id(self.channel), vec![first, second])
            .await
            .map_err(|e| MusebotError::Publish {
                message: format!("failed to send media group: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(channel = self.channel.0, "media group published");
        Ok(())
    }

    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), MusebotError> {
        self.bot
            .send_message(Recipient::Id(TgChatId(chat.0)), text)
            .await
            .map_err(|e| MusebotError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}
