// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post generation pipeline: text, then two images derived from it.
//!
//! The pipeline is purely orchestration. It never touches the pending store;
//! callers decide when and whether to persist the result.

use std::sync::Arc;

use musebot_core::types::GeneratedPost;
use musebot_core::{ImageGenerator, MusebotError, TextGenerator};
use tracing::debug;

/// Builds the full text-generation prompt for a topic.
///
/// The style instruction is fixed; only the topic varies. Structure mirrors
/// the post layout the channel expects: an intriguing opening hook, an
/// emotional peak in the middle, and a closing hook.
fn style_prompt(topic: &str) -> String {
    format!(
        "You are a creative copywriter for short, sensory Telegram channel posts. \
         The voice is intimate and first-person, playful and a little mysterious, \
         speaking one-on-one with the reader. Use metaphors, sensory detail \
         (a glance, a touch, a sound) and emotional contrast. Mix short and long \
         phrases so it reads like a real conversation. Open with an intriguing \
         hook, build to an emotional peak in the middle, and end with a hook \
         that leaves the reader waiting for more. Use emoji sparingly, only to \
         deepen the mood. Avoid direct explanations; convey feeling through \
         images and actions. Write a post of about 1024 characters in this \
         style on the topic: {topic}"
    )
}

/// Orchestrates one generation run: text, start/middle excerpts, two images.
///
/// The two image calls are sequential; the second is not attempted when the
/// first fails, and a partial post (text plus one image) is never returned.
pub struct GenerationPipeline {
    text: Arc<dyn TextGenerator + Send + Sync>,
    image: Arc<dyn ImageGenerator + Send + Sync>,
}

impl GenerationPipeline {
    pub fn new(
        text: Arc<dyn TextGenerator + Send + Sync>,
        image: Arc<dyn ImageGenerator + Send + Sync>,
    ) -> Self {
        Self { text, image }
    }

    /// Generate a complete post for `topic`.
    ///
    /// Fails with the underlying [`MusebotError::Generation`] /
    /// [`MusebotError::EmptyResponse`] / [`MusebotError::ImageGeneration`]
    /// when any of the three upstream calls fails.
    pub async fn generate(&self, topic: &str) -> Result<GeneratedPost, MusebotError> {
        if topic.trim().is_empty() {
            return Err(MusebotError::EmptyInput("topic"));
        }

        let text = self.text.generate_text(&style_prompt(topic)).await?;
        debug!(chars = text.chars().count(), "text generated");

        let start_prompt = musebot_segment::start(&text);
        let middle_prompt = musebot_segment::middle(&text);

        let image1_url = self.image.generate_image(&start_prompt).await?;
        let image2_url = self.image.generate_image(&middle_prompt).await?;

        Ok(GeneratedPost {
            text,
            image1_url,
            image2_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedText(String);

    #[async_trait]
    impl TextGenerator for FixedText {
        async fn generate_text(&self, _prompt: &str) -> Result<String, MusebotError> {
            Ok(self.0.clone())
        }
    }

    struct FailingText;

    #[async_trait]
    impl TextGenerator for FailingText {
        async fn generate_text(&self, _prompt: &str) -> Result<String, MusebotError> {
            Err(MusebotError::EmptyResponse)
        }
    }

    /// Records prompts; fails on the Nth call (1-based) if `fail_on` is set.
    struct RecordingImages {
        prompts: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl RecordingImages {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for RecordingImages {
        async fn generate_image(&self, prompt: &str) -> Result<String, MusebotError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            let call = prompts.len();
            if self.fail_on == Some(call) {
                return Err(MusebotError::ImageGeneration {
                    message: "synthesis unavailable".into(),
                    source: None,
                });
            }
            Ok(format!("https://img.example/{call}.png"))
        }
    }

    const TEXT: &str = "First hook. Second line. Third line. Fourth line. Fifth line. Sixth line. ";

    #[tokio::test]
    async fn generate_produces_text_and_two_distinct_image_prompts() {
        let images = Arc::new(RecordingImages::new(None));
        let pipeline = GenerationPipeline::new(
            Arc::new(FixedText(TEXT.to_string())),
            Arc::clone(&images) as Arc<dyn ImageGenerator + Send + Sync>,
        );

        let post = pipeline.generate("rain").await.unwrap();
        assert_eq!(post.text, TEXT);
        assert_eq!(post.image1_url, "https://img.example/1.png");
        assert_eq!(post.image2_url, "https://img.example/2.png");

        let prompts = images.prompts.lock().unwrap();
        assert_eq!(prompts[0], musebot_segment::start(TEXT));
        assert_eq!(prompts[1], musebot_segment::middle(TEXT));
        assert_ne!(prompts[0], prompts[1]);
    }

    #[tokio::test]
    async fn first_image_failure_skips_the_second_call() {
        let images = Arc::new(RecordingImages::new(Some(1)));
        let pipeline = GenerationPipeline::new(
            Arc::new(FixedText(TEXT.to_string())),
            Arc::clone(&images) as Arc<dyn ImageGenerator + Send + Sync>,
        );

        let err = pipeline.generate("rain").await.unwrap_err();
        assert!(matches!(err, MusebotError::ImageGeneration { .. }));
        assert_eq!(images.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_image_failure_returns_no_partial_post() {
        let images = Arc::new(RecordingImages::new(Some(2)));
        let pipeline = GenerationPipeline::new(
            Arc::new(FixedText(TEXT.to_string())),
            Arc::clone(&images) as Arc<dyn ImageGenerator + Send + Sync>,
        );

        let err = pipeline.generate("кот").await.unwrap_err();
        assert!(matches!(err, MusebotError::ImageGeneration { .. }));
        assert_eq!(images.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn text_failure_makes_no_image_calls() {
        let images = Arc::new(RecordingImages::new(None));
        let pipeline = GenerationPipeline::new(
            Arc::new(FailingText),
            Arc::clone(&images) as Arc<dyn ImageGenerator + Send + Sync>,
        );

        let err = pipeline.generate("rain").await.unwrap_err();
        assert!(matches!(err, MusebotError::EmptyResponse));
        assert!(images.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_topic_is_rejected_before_any_call() {
        let images = Arc::new(RecordingImages::new(None));
        let pipeline = GenerationPipeline::new(
            Arc::new(FixedText(TEXT.to_string())),
            Arc::clone(&images) as Arc<dyn ImageGenerator + Send + Sync>,
        );

        let err = pipeline.generate("   ").await.unwrap_err();
        assert!(matches!(err, MusebotError::EmptyInput(_)));
        assert!(images.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn style_prompt_embeds_the_topic() {
        let prompt = style_prompt("night trains");
        assert!(prompt.ends_with("night trains"));
    }
}
