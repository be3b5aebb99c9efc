// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background scheduler that publishes due pending posts.
//!
//! One long-running task ticks on a fixed period, extracts every due post
//! from the [`PendingStore`] in a single atomic scan-and-remove, and drives
//! each through the [`MediaPublisher`] capability.
//!
//! Removal happens before the publish attempt, so a publish failure loses
//! the post: there is no retry path. This matches the observed contract
//! (at-most-once extraction; at-most-once publish attempt). Per-post
//! failures are logged and never block the rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use musebot_core::types::{ChatId, PendingPost};
use musebot_core::{exceeds_caption_limit, truncate_caption, MediaPublisher};
use musebot_pending::PendingStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Display format for publish instants in operator-facing messages.
const INSTANT_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Periodically publishes due posts from the pending store.
pub struct PublishScheduler {
    store: Arc<PendingStore>,
    publisher: Arc<dyn MediaPublisher + Send + Sync>,
    tick: Duration,
    caption_limit: usize,
    /// Zone used only for formatting instants in notifications; comparisons
    /// are on UTC instants.
    zone: Tz,
}

impl PublishScheduler {
    pub fn new(
        store: Arc<PendingStore>,
        publisher: Arc<dyn MediaPublisher + Send + Sync>,
        tick: Duration,
        caption_limit: usize,
        zone: Tz,
    ) -> Self {
        Self {
            store,
            publisher,
            tick,
            caption_limit,
            zone,
        }
    }

    /// Run the tick loop until `shutdown` is cancelled.
    ///
    /// Intended to be spawned as its own task; it shares only the store and
    /// publisher handles with the rest of the process.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(period_secs = self.tick.as_secs(), "publish scheduler started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("publish scheduler stopping");
                    return;
                }
                _ = interval.tick() => {
                    self.tick_once(Utc::now()).await;
                }
            }
        }
    }

    /// Execute one scheduler tick at `now`.
    ///
    /// Public so tests can drive the tick directly with a controlled clock.
    pub async fn tick_once(&self, now: DateTime<Utc>) {
        let due = self.store.take_due_posts(now);
        if due.is_empty() {
            debug!("no due posts");
            return;
        }
        info!(count = due.len(), "publishing due posts");

        for (chat, post) in due {
            self.publish_one(chat, post, now).await;
        }
    }

    /// Publish a single extracted post. The post is already removed from the
    /// store; every failure path here is log-only.
    async fn publish_one(&self, chat: ChatId, post: PendingPost, now: DateTime<Utc>) {
        if post.image1_url.is_empty() || post.image2_url.is_empty() {
            error!(%chat, "due post has a missing image reference, dropping");
            return;
        }

        let caption = truncate_caption(&post.text, self.caption_limit);
        let truncated = exceeds_caption_limit(&post.text, self.caption_limit);
        if truncated {
            warn!(%chat, limit = self.caption_limit, "caption truncated for publish");
        }

        if let Err(e) = self
            .publisher
            .publish_media_pair(&post.image1_url, &post.image2_url, caption)
            .await
        {
            error!(%chat, error = %e, "failed to publish due post, post is dropped");
            return;
        }

        let published_at = now.with_timezone(&self.zone).format(INSTANT_FORMAT);
        let mut note = format!("Your post was published to the channel at {published_at}.");
        if truncated {
            note.push_str("\nNote: the text was shortened to fit the caption limit.");
        }
        if let Err(e) = self.publisher.notify(chat, &note).await {
            warn!(%chat, error = %e, "failed to notify chat about publication");
        } else {
            debug!(%chat, "publication notification sent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use musebot_core::MusebotError;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct PublishedPair {
        image1_url: String,
        image2_url: String,
        caption: String,
    }

    /// Records publishes and notifications; optionally fails all publishes.
    struct MockPublisher {
        published: Mutex<Vec<PublishedPair>>,
        notified: Mutex<Vec<(ChatId, String)>>,
        fail_publish: bool,
    }

    impl MockPublisher {
        fn new(fail_publish: bool) -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                notified: Mutex::new(Vec::new()),
                fail_publish,
            }
        }
    }

    #[async_trait]
    impl MediaPublisher for MockPublisher {
        async fn publish_media_pair(
            &self,
            image1_url: &str,
            image2_url: &str,
            caption: &str,
        ) -> Result<(), MusebotError> {
            if self.fail_publish {
                return Err(MusebotError::Publish {
                    message: "sink unavailable".into(),
                    source: None,
                });
            }
            self.published.lock().unwrap().push(PublishedPair {
                image1_url: image1_url.to_string(),
                image2_url: image2_url.to_string(),
                caption: caption.to_string(),
            });
            Ok(())
        }

        async fn notify(&self, chat: ChatId, text: &str) -> Result<(), MusebotError> {
            self.notified
                .lock()
                .unwrap()
                .push((chat, text.to_string()));
            Ok(())
        }
    }

    fn scheduler(
        store: Arc<PendingStore>,
        publisher: Arc<MockPublisher>,
    ) -> PublishScheduler {
        PublishScheduler::new(
            store,
            publisher,
            Duration::from_secs(10),
            1024,
            chrono_tz::Asia::Novosibirsk,
        )
    }

    #[tokio::test]
    async fn due_post_is_published_and_chat_notified() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(false));
        let now = Utc::now();

        store
            .save_post(
                ChatId(42),
                "caption text",
                "https://img/1.png",
                "https://img/2.png",
                Some(now - ChronoDuration::seconds(5)),
            )
            .unwrap();

        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now)
            .await;

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].image1_url, "https://img/1.png");
        assert_eq!(published[0].caption, "caption text");

        let notified = publisher.notified.lock().unwrap();
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].0, ChatId(42));

        // Extracted: a later lookup fails.
        assert!(store.get_post(ChatId(42)).is_err());
    }

    #[tokio::test]
    async fn post_is_gone_even_when_publish_fails() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(true));
        let now = Utc::now();

        store
            .save_post(
                ChatId(42),
                "text",
                "https://img/1.png",
                "https://img/2.png",
                Some(now - ChronoDuration::seconds(5)),
            )
            .unwrap();

        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now)
            .await;

        // Remove-before-publish: the failed post is not retrievable and no
        // notification went out.
        assert!(store.get_post(ChatId(42)).is_err());
        assert!(publisher.notified.lock().unwrap().is_empty());

        // A later tick does not retry it.
        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now + ChronoDuration::seconds(10))
            .await;
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn caption_is_truncated_to_the_limit_before_publish() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(false));
        let now = Utc::now();

        let long_text = "x".repeat(2000);
        store
            .save_post(
                ChatId(1),
                &long_text,
                "https://img/1.png",
                "https://img/2.png",
                Some(now),
            )
            .unwrap();

        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now)
            .await;

        let published = publisher.published.lock().unwrap();
        assert_eq!(published[0].caption.chars().count(), 1024);

        // The notification flags the truncation.
        let notified = publisher.notified.lock().unwrap();
        assert!(notified[0].1.contains("shortened"));
    }

    #[tokio::test]
    async fn missing_image_reference_skips_publish_but_drops_the_post() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(false));
        let now = Utc::now();

        store
            .save_post(ChatId(1), "text", "", "https://img/2.png", Some(now))
            .unwrap();

        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now)
            .await;

        assert!(publisher.published.lock().unwrap().is_empty());
        assert!(store.get_post(ChatId(1)).is_err());
    }

    #[tokio::test]
    async fn one_failing_chat_does_not_block_others() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(false));
        let now = Utc::now();

        // Chat 1 has a broken post (missing image), chat 2 a healthy one.
        store
            .save_post(ChatId(1), "broken", "", "", Some(now))
            .unwrap();
        store
            .save_post(
                ChatId(2),
                "healthy",
                "https://img/1.png",
                "https://img/2.png",
                Some(now),
            )
            .unwrap();

        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now)
            .await;

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].caption, "healthy");
    }

    #[tokio::test]
    async fn unscheduled_and_future_posts_are_untouched() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(false));
        let now = Utc::now();

        store
            .save_post(ChatId(1), "manual", "a", "b", None)
            .unwrap();
        store
            .save_post(
                ChatId(2),
                "future",
                "a",
                "b",
                Some(now + ChronoDuration::minutes(5)),
            )
            .unwrap();

        scheduler(Arc::clone(&store), Arc::clone(&publisher))
            .tick_once(now)
            .await;

        assert!(publisher.published.lock().unwrap().is_empty());
        assert!(store.get_post(ChatId(1)).is_ok());
        assert!(store.get_post(ChatId(2)).is_ok());
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let store = Arc::new(PendingStore::default());
        let publisher = Arc::new(MockPublisher::new(false));
        let sched = PublishScheduler::new(
            store,
            publisher,
            Duration::from_millis(10),
            1024,
            chrono_tz::Asia::Novosibirsk,
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn(sched.run(token.clone()));

        tokio::time::sleep(Duration::from_millis(30)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler should stop promptly")
            .expect("scheduler task should not panic");
    }
}
