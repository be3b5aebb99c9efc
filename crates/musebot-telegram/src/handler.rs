// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update routing for the operator chat.
//!
//! Three entry points: commands, plain messages, and callback queries from
//! the preview keyboard. Plain text is interpreted against per-chat state
//! in priority order: pending edit first, then an awaited schedule time,
//! then a fresh topic.

use std::sync::Arc;

use musebot_core::types::{ChatId, PendingEdit};
use musebot_core::{truncate_caption, MusebotError};
use musebot_pending::PendingStore;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, Document, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::import;
use crate::schedule::{self, SCHEDULE_FORMAT_HUMAN};
use crate::BotContext;

/// Callback payloads carried by the preview keyboard buttons.
pub const CALLBACK_PUBLISH: &str = "publish";
pub const CALLBACK_EDIT: &str = "edit";
pub const CALLBACK_SCHEDULE: &str = "schedule";

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show a short usage guide")]
    Start,
    #[command(description = "list recently saved topics")]
    List,
    #[command(description = "save a topic and generate a post")]
    Generate(String),
    #[command(description = "publish the pending post right now")]
    PublishPending,
    #[command(description = "schedule the pending post: /schedule DD.MM.YYYY HH:MM")]
    Schedule(String),
    #[command(description = "show the pending post")]
    ListPending,
}

/// Checks whether the message sender is authorized.
///
/// Matches the sender's user ID (as string) or username against
/// `allowed_users`; an empty list allows everyone. Messages without a
/// sender never match a non-empty list.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }

    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id_str = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        if *allowed == user_id_str {
            return true;
        }
        if let Some(username) = user.username.as_ref() {
            let allowed_clean = allowed.strip_prefix('@').unwrap_or(allowed);
            if username.eq_ignore_ascii_case(allowed_clean) {
                return true;
            }
        }
        false
    })
}

/// Keyboard attached to every post preview message.
pub fn post_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([vec![
        InlineKeyboardButton::callback("Publish", CALLBACK_PUBLISH),
        InlineKeyboardButton::callback("Edit", CALLBACK_EDIT),
        InlineKeyboardButton::callback("Schedule", CALLBACK_SCHEDULE),
    ]])
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> ResponseResult<()> {
    if !is_authorized(&msg, &ctx.allowed_users) {
        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized command");
        return Ok(());
    }
    let chat = ChatId(msg.chat.id.0);

    match cmd {
        Command::Start => {
            let text = format!(
                "I turn topics into channel posts with two images.\n\
                 Send a topic as plain text, or upload a .txt/.csv file to \
                 import topics in bulk.\n\n{}",
                Command::descriptions()
            );
            bot.send_message(msg.chat.id, text).await?;
        }
        Command::List => list_topics(&bot, &msg, &ctx).await?,
        Command::Generate(topic) => {
            let topic = topic.trim().to_string();
            if topic.is_empty() {
                bot.send_message(msg.chat.id, "Usage: /generate <topic>")
                    .await?;
            } else {
                handle_new_topic(&bot, &msg, &ctx, &topic).await?;
            }
        }
        Command::PublishPending => {
            let post = match ctx.pending.get_post(chat) {
                Ok(p) => p,
                Err(_) => {
                    bot.send_message(
                        msg.chat.id,
                        "No pending post. Send a topic or use /generate first.",
                    )
                    .await?;
                    return Ok(());
                }
            };
            // A scheduled post belongs to the scheduler; report instead of
            // racing it.
            if let Some(at) = post.publish_at {
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "This post is scheduled for {} ({}).",
                        schedule::format_local(at, ctx.zone),
                        ctx.zone
                    ),
                )
                .await?;
                return Ok(());
            }
            publish_now(&bot, &msg, &ctx, chat, &post.text).await?;
        }
        Command::Schedule(arg) => {
            let arg = arg.trim().to_string();
            if arg.is_empty() {
                bot.send_message(
                    msg.chat.id,
                    format!("Usage: /schedule {SCHEDULE_FORMAT_HUMAN}"),
                )
                .await?;
            } else {
                apply_schedule(&bot, &msg, &ctx, chat, &arg).await?;
            }
        }
        Command::ListPending => {
            match ctx.pending.get_post(chat) {
                Ok(post) => {
                    let when = match post.publish_at {
                        Some(at) => format!(
                            "scheduled for {} ({})",
                            schedule::format_local(at, ctx.zone),
                            ctx.zone
                        ),
                        None => "awaiting manual publish".to_string(),
                    };
                    bot.send_message(
                        msg.chat.id,
                        format!("Pending post, {when}:\n\n{}", post.text),
                    )
                    .await?;
                }
                Err(_) => {
                    bot.send_message(msg.chat.id, "No pending post.").await?;
                }
            }
        }
    }
    Ok(())
}

/// Non-command messages: document imports, then text routed by chat state.
pub async fn handle_message(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> ResponseResult<()> {
    if !is_authorized(&msg, &ctx.allowed_users) {
        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized message");
        return Ok(());
    }
    let chat = ChatId(msg.chat.id.0);

    if let Some(doc) = msg.document() {
        return import_document(&bot, &msg, &ctx, doc).await;
    }

    let Some(text) = msg.text() else {
        debug!(msg_id = msg.id.0, "ignoring unsupported message type");
        return Ok(());
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }

    if let Ok(edit) = ctx.pending.take_edit(chat) {
        return apply_edit(&bot, &msg, &ctx, chat, edit, text).await;
    }

    if ctx.pending.is_awaiting_schedule(chat) {
        return apply_schedule(&bot, &msg, &ctx, chat, text).await;
    }

    // Unrecognized commands fall through the command filter; do not store
    // them as topics.
    if text.starts_with('/') {
        bot.send_message(msg.chat.id, "Unknown command, see /start.")
            .await?;
        return Ok(());
    }

    handle_new_topic(&bot, &msg, &ctx, text).await
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<BotContext>,
) -> ResponseResult<()> {
    let Some(data) = q.data.as_deref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    // Old previews can outlive Telegram's message cache; nothing to do then.
    let Some(message) = q.message.as_ref().and_then(|m| m.regular_message()) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat = ChatId(message.chat.id.0);
    let preview_text = message.text().unwrap_or_default().to_string();

    match data {
        CALLBACK_PUBLISH => {
            bot.answer_callback_query(q.id.clone())
                .text("Publishing")
                .await?;
            let post = match ctx.pending.get_post(chat) {
                Ok(p) => p,
                Err(_) => {
                    bot.send_message(message.chat.id, "No pending post. Generate one first.")
                        .await?;
                    return Ok(());
                }
            };
            // Publish what the operator sees, which reflects in-place edits.
            let caption_source = if preview_text.is_empty() {
                post.text.as_str()
            } else {
                preview_text.as_str()
            };
            publish_now(&bot, message, &ctx, chat, caption_source).await?;
        }
        CALLBACK_EDIT => {
            bot.answer_callback_query(q.id.clone()).await?;
            if let Err(e) = ctx.pending.save_edit(chat, &preview_text, message.id.0) {
                warn!(%chat, error = %e, "failed to register pending edit");
            }
            bot.send_message(message.chat.id, "Send the new text for the post.")
                .await?;
        }
        CALLBACK_SCHEDULE => {
            bot.answer_callback_query(q.id.clone()).await?;
            match ctx.pending.get_post(chat) {
                Ok(post) => {
                    // Refresh the stored text from the preview so an edited
                    // message is what actually gets scheduled.
                    let text = if preview_text.is_empty() {
                        post.text.as_str()
                    } else {
                        preview_text.as_str()
                    };
                    if let Err(e) = ctx.pending.save_post(
                        chat,
                        text,
                        &post.image1_url,
                        &post.image2_url,
                        None,
                    ) {
                        warn!(%chat, error = %e, "failed to refresh pending post");
                    }
                    ctx.pending.set_awaiting_schedule(chat);
                    bot.send_message(
                        message.chat.id,
                        format!(
                            "Send the publish time as {SCHEDULE_FORMAT_HUMAN} ({} time).",
                            ctx.zone
                        ),
                    )
                    .await?;
                }
                Err(_) => {
                    bot.send_message(message.chat.id, "No pending post to schedule.")
                        .await?;
                }
            }
        }
        other => {
            debug!(data = other, "unknown callback payload");
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}

async fn list_topics(bot: &Bot, msg: &Message, ctx: &BotContext) -> ResponseResult<()> {
    match ctx.topics.list(ctx.list_limit).await {
        Ok(topics) if topics.is_empty() => {
            bot.send_message(msg.chat.id, "No topics saved yet.").await?;
        }
        Ok(topics) => {
            let lines: Vec<String> = topics
                .iter()
                .map(|t| format!("{}. {}", t.id, t.title))
                .collect();
            bot.send_message(msg.chat.id, format!("Recent topics:\n{}", lines.join("\n")))
                .await?;
        }
        Err(e) => {
            error!(error = %e, "failed to list topics");
            bot.send_message(msg.chat.id, "Failed to list topics.").await?;
        }
    }
    Ok(())
}

/// Save a topic and run the full generation pipeline for it.
async fn handle_new_topic(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    topic: &str,
) -> ResponseResult<()> {
    if topic.chars().count() < import::MIN_TOPIC_CHARS {
        bot.send_message(
            msg.chat.id,
            "The topic is too short, use at least 3 characters.",
        )
        .await?;
        return Ok(());
    }

    match ctx.topics.save(topic).await {
        Ok(()) => {}
        Err(MusebotError::AlreadyExists(_)) => {
            bot.send_message(msg.chat.id, "This topic is already saved.")
                .await?;
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "failed to save topic");
            bot.send_message(msg.chat.id, "Failed to save the topic.")
                .await?;
            return Ok(());
        }
    }

    bot.send_message(
        msg.chat.id,
        "Topic saved. Generating the post, this can take a minute.",
    )
    .await?;
    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let post = match ctx.pipeline.generate(topic).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "generation failed");
            bot.send_message(msg.chat.id, format!("Failed to generate the post: {e}"))
                .await?;
            return Ok(());
        }
    };

    let chat = ChatId(msg.chat.id.0);
    if let Err(e) =
        ctx.pending
            .save_post(chat, &post.text, &post.image1_url, &post.image2_url, None)
    {
        error!(%chat, error = %e, "failed to store the generated post");
    }
    info!(%chat, "post generated and held for review");

    bot.send_message(msg.chat.id, &post.text)
        .reply_markup(post_keyboard())
        .await?;

    // Preview failures are non-fatal: the post itself is already held.
    for raw in [&post.image1_url, &post.image2_url] {
        match url::Url::parse(raw) {
            Ok(parsed) => {
                if let Err(e) = bot.send_photo(msg.chat.id, InputFile::url(parsed)).await {
                    warn!(error = %e, "failed to send preview image");
                }
            }
            Err(e) => warn!(error = %e, "generated image reference is not a valid url"),
        }
    }
    Ok(())
}

/// Replace the preview message and stored post text with operator-sent text.
///
/// When the preview message cannot be edited the pending edit stays in
/// place, so the operator can simply resend the text.
async fn apply_edit(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    chat: ChatId,
    edit: PendingEdit,
    new_text: &str,
) -> ResponseResult<()> {
    let edited = match bot
        .edit_message_text(msg.chat.id, MessageId(edit.message_id), new_text)
        .reply_markup(post_keyboard())
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!(%chat, error = %e, "failed to edit preview message");
            false
        }
    };

    if finish_edit(&ctx.pending, chat, new_text, edited) {
        bot.send_message(msg.chat.id, "Text updated.").await?;
    } else {
        bot.send_message(
            msg.chat.id,
            "Could not update the preview message, send the text again.",
        )
        .await?;
    }
    Ok(())
}

/// Settle store state after an edit attempt. Only a successful preview edit
/// clears the pending edit and rewrites the stored post text; a failure
/// leaves both untouched. Returns whether the edit was applied.
fn finish_edit(pending: &PendingStore, chat: ChatId, new_text: &str, edited: bool) -> bool {
    if !edited {
        return false;
    }

    if let Ok(post) = pending.get_post(chat)
        && let Err(e) = pending.save_post(
            chat,
            new_text,
            &post.image1_url,
            &post.image2_url,
            post.publish_at,
        )
    {
        warn!(%chat, error = %e, "failed to update pending post text");
    }

    let _ = pending.clear_edit(chat);
    true
}

/// Attach a publish time to the existing pending post.
async fn apply_schedule(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    chat: ChatId,
    raw: &str,
) -> ResponseResult<()> {
    let post = match ctx.pending.get_post(chat) {
        Ok(p) => p,
        Err(_) => {
            let _ = ctx.pending.clear_awaiting_schedule(chat);
            bot.send_message(
                msg.chat.id,
                "No pending post to schedule. Send a topic or use /generate first.",
            )
            .await?;
            return Ok(());
        }
    };

    let publish_at = match schedule::parse_publish_at(raw, ctx.zone) {
        Ok(at) => at,
        Err(e) => {
            bot.send_message(
                msg.chat.id,
                format!("Could not read the time: {e}. Expected {SCHEDULE_FORMAT_HUMAN}."),
            )
            .await?;
            return Ok(());
        }
    };

    match ctx.pending.save_post(
        chat,
        &post.text,
        &post.image1_url,
        &post.image2_url,
        Some(publish_at),
    ) {
        Ok(()) => {
            let _ = ctx.pending.clear_awaiting_schedule(chat);
            info!(%chat, at = %publish_at, "post scheduled");
            bot.send_message(
                msg.chat.id,
                format!(
                    "Scheduled for {} ({}).",
                    schedule::format_local(publish_at, ctx.zone),
                    ctx.zone
                ),
            )
            .await?;
        }
        Err(e @ MusebotError::PastSchedule { .. }) => {
            bot.send_message(msg.chat.id, format!("That time is already gone: {e}"))
                .await?;
        }
        Err(e) => {
            error!(%chat, error = %e, "failed to schedule post");
            bot.send_message(msg.chat.id, format!("Failed to schedule: {e}"))
                .await?;
        }
    }
    Ok(())
}

/// Publish the held post immediately with `caption_source` as caption.
async fn publish_now(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    chat: ChatId,
    caption_source: &str,
) -> ResponseResult<()> {
    let post = match ctx.pending.get_post(chat) {
        Ok(p) => p,
        Err(_) => {
            bot.send_message(msg.chat.id, "No pending post. Generate one first.")
                .await?;
            return Ok(());
        }
    };

    let caption = truncate_caption(caption_source, ctx.caption_limit);
    match ctx
        .publisher
        .publish_media_pair(&post.image1_url, &post.image2_url, caption)
        .await
    {
        Ok(()) => {
            let _ = ctx.pending.clear_post(chat);
            let _ = ctx.pending.clear_awaiting_schedule(chat);
            info!(%chat, "post published manually");
            bot.send_message(msg.chat.id, "The post was published to the channel.")
                .await?;
        }
        Err(e) => {
            error!(%chat, error = %e, "manual publish failed");
            bot.send_message(msg.chat.id, format!("Failed to publish: {e}"))
                .await?;
        }
    }
    Ok(())
}

async fn import_document(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    doc: &Document,
) -> ResponseResult<()> {
    let filename = doc
        .file_name
        .clone()
        .unwrap_or_else(|| "document".to_string());

    let data = match import::download_document(bot, doc).await {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "failed to download topic file");
            bot.send_message(msg.chat.id, "Failed to download the file.")
                .await?;
            return Ok(());
        }
    };

    let titles = match import::parse_topics(&filename, &data) {
        Ok(t) => t,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    let summary = import::import_topics(&ctx.topics, &titles).await;
    info!(
        filename = %filename,
        imported = summary.imported,
        duplicates = summary.duplicates,
        skipped = summary.skipped,
        failed = summary.failed,
        "topic import finished"
    );
    bot.send_message(
        msg.chat.id,
        format!(
            "Imported {} topics ({} duplicates, {} skipped).",
            summary.imported, summary.duplicates, summary.skipped
        ),
    )
    .await?;
    Ok(())
}
