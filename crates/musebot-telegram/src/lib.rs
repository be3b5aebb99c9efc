// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram operator surface for the Musebot posting bot.
//!
//! Long-polls the Bot API via teloxide, routes commands, plain text,
//! callbacks, and topic-file uploads to the per-chat state machine, and
//! implements [`MediaPublisher`] for the fixed target channel.
//!
//! [`MediaPublisher`]: musebot_core::MediaPublisher

pub mod handler;
pub mod import;
pub mod publisher;
pub mod schedule;

use std::sync::Arc;

use chrono_tz::Tz;
use musebot_core::MediaPublisher;
use musebot_openai::GenerationPipeline;
use musebot_pending::PendingStore;
use musebot_storage::TopicStore;
use teloxide::dptree;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use publisher::ChannelPublisher;

/// Shared state handed to every update handler.
pub struct BotContext {
    pub pending: Arc<PendingStore>,
    pub topics: TopicStore,
    pub pipeline: Arc<GenerationPipeline>,
    pub publisher: Arc<dyn MediaPublisher + Send + Sync>,
    /// Zone used to interpret and display operator-entered publish times.
    pub zone: Tz,
    pub caption_limit: usize,
    pub list_limit: usize,
    /// User IDs or usernames allowed to drive the bot. Empty allows everyone.
    pub allowed_users: Vec<String>,
}

/// Run the update dispatcher until `shutdown` is cancelled.
///
/// Commands are matched first; any other message falls through to the
/// text/document handler, and callback queries drive the preview keyboard.
pub async fn run(bot: Bot, ctx: Arc<BotContext>, shutdown: CancellationToken) {
    let tree = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<handler::Command>()
                .endpoint(handler::handle_command),
        )
        .branch(Update::filter_message().endpoint(handler::handle_message))
        .branch(Update::filter_callback_query().endpoint(handler::handle_callback));

    let mut dispatcher = Dispatcher::builder(bot, tree)
        .dependencies(dptree::deps![ctx])
        .default_handler(|_| async {}) // Silently ignore other update kinds.
        .build();

    let token = dispatcher.shutdown_token();
    let stopper = tokio::spawn(async move {
        shutdown.cancelled().await;
        info!("stopping Telegram long polling");
        if let Ok(done) = token.shutdown() {
            done.await;
        }
    });

    info!("starting Telegram long polling");
    dispatcher.dispatch().await;
    stopper.abort();
}
