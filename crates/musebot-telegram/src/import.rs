// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk topic import from uploaded documents.
//!
//! Accepts plain-text files (one topic per line) and CSV files (topic in
//! the first column). Everything else is rejected by extension before any
//! parsing happens.

use musebot_core::MusebotError;
use musebot_storage::TopicStore;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::Document;
use tracing::{debug, warn};

/// Minimum topic length in characters, shared with the text handler.
pub const MIN_TOPIC_CHARS: usize = 3;

/// Download an uploaded document from Telegram servers as bytes.
pub async fn download_document(bot: &Bot, doc: &Document) -> Result<Vec<u8>, MusebotError> {
    let file = bot
        .get_file(doc.file.id.clone())
        .await
        .map_err(|e| MusebotError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| MusebotError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(size = buf.len(), "downloaded topic file from Telegram");
    Ok(buf)
}

/// Extract candidate topic titles from an uploaded file by extension.
///
/// Titles come back trimmed and non-empty but otherwise unvalidated;
/// length and duplicate checks happen in [`import_topics`].
pub fn parse_topics(filename: &str, data: &[u8]) -> Result<Vec<String>, MusebotError> {
    let lower = filename.to_ascii_lowercase();

    if lower.ends_with(".txt") {
        let text = String::from_utf8_lossy(data);
        return Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect());
    }

    if lower.ends_with(".csv") {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);
        let mut titles = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| MusebotError::Channel {
                message: format!("failed to parse csv: {e}"),
                source: Some(Box::new(e)),
            })?;
            if let Some(field) = record.get(0) {
                let field = field.trim();
                if !field.is_empty() {
                    titles.push(field.to_string());
                }
            }
        }
        return Ok(titles);
    }

    Err(MusebotError::Channel {
        message: format!("unsupported topic file type: {filename} (use .txt or .csv)"),
        source: None,
    })
}

/// Outcome of one bulk import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Save each candidate title, counting rather than aborting on rejects.
pub async fn import_topics(topics: &TopicStore, titles: &[String]) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for title in titles {
        if title.chars().count() < MIN_TOPIC_CHARS {
            summary.skipped += 1;
            continue;
        }
        match topics.save(title).await {
            Ok(()) => summary.imported += 1,
            Err(MusebotError::AlreadyExists(_)) => summary.duplicates += 1,
            Err(e) => {
                warn!(title = %title, error = %e, "failed to import topic");
                summary.failed += 1;
            }
        }
    }
    summary
}
