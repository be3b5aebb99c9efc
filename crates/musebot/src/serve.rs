// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `musebot serve` command implementation.
//!
//! Wires the generation pipeline, the pending-post store, the topic log,
//! the publish scheduler, and the Telegram dispatcher together, then runs
//! until a shutdown signal arrives.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono_tz::Tz;
use musebot_config::model::MusebotConfig;
use musebot_core::MusebotError;
use musebot_core::{ImageGenerator, MediaPublisher, TextGenerator};
use musebot_openai::{GenerationPipeline, OpenAiClient};
use musebot_pending::PendingStore;
use musebot_scheduler::PublishScheduler;
use musebot_storage::TopicStore;
use musebot_telegram::{BotContext, ChannelPublisher};
use teloxide::Bot;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `musebot serve` command.
pub async fn run_serve(config: MusebotConfig) -> Result<(), MusebotError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, "starting musebot serve");

    let token = config
        .telegram
        .bot_token
        .as_deref()
        .ok_or_else(|| MusebotError::Config("telegram.bot_token is required".into()))?;
    let channel_id = config
        .telegram
        .channel_id
        .ok_or_else(|| MusebotError::Config("telegram.channel_id is required".into()))?;

    // Validation already vetted the zone string; parse failures here would
    // mean the tz database and the validator disagree.
    let zone = Tz::from_str(&config.scheduler.timezone).map_err(|e| {
        MusebotError::Config(format!(
            "scheduler.timezone `{}` is not a known IANA time zone: {e}",
            config.scheduler.timezone
        ))
    })?;

    let bot = Bot::new(token);

    let topics = TopicStore::open(&config.storage.database_path).await?;
    let pending = Arc::new(PendingStore::new(chrono::Duration::minutes(
        config.scheduler.grace_minutes,
    )));

    let openai = Arc::new(OpenAiClient::new(&config.openai)?);
    let pipeline = Arc::new(GenerationPipeline::new(
        Arc::clone(&openai) as Arc<dyn TextGenerator + Send + Sync>,
        Arc::clone(&openai) as Arc<dyn ImageGenerator + Send + Sync>,
    ));

    let publisher = Arc::new(ChannelPublisher::new(bot.clone(), channel_id));

    let shutdown = shutdown::install_signal_handler();

    let scheduler = PublishScheduler::new(
        Arc::clone(&pending),
        Arc::clone(&publisher) as Arc<dyn MediaPublisher + Send + Sync>,
        StdDuration::from_secs(config.scheduler.tick_secs),
        config.scheduler.caption_limit,
        zone,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.clone()));

    let ctx = Arc::new(BotContext {
        pending,
        topics,
        pipeline,
        publisher,
        zone,
        caption_limit: config.scheduler.caption_limit,
        list_limit: config.storage.list_limit,
        allowed_users: config.telegram.allowed_users.clone(),
    });

    musebot_telegram::run(bot, ctx, shutdown.clone()).await;

    // The dispatcher has stopped; make sure the scheduler follows.
    shutdown.cancel();
    if let Err(e) = scheduler_handle.await {
        warn!(error = %e, "publish scheduler task ended abnormally");
    }

    info!("musebot serve stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("musebot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
