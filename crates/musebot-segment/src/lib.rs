// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure text segmentation for deriving image prompts.
//!
//! One generated text yields two excerpts: a "start" (the opening hook) and a
//! "middle" (the emotional peak). The two excerpts become the prompts for the
//! two images accompanying a post, so the derivation must stay deterministic.

use std::sync::OnceLock;

use regex::Regex;

fn sentence_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence boundary regex is valid"))
}

/// Split `text` into sentences.
///
/// Boundaries are `.`, `!`, or `?` followed by whitespace. Each fragment is
/// trimmed, empty fragments are dropped, and every surviving fragment is
/// re-terminated with a single `.` (the original terminator is consumed by
/// the split).
pub fn sentences(text: &str) -> Vec<String> {
    sentence_boundary()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

/// The opening excerpt: the first two sentences joined by a single space.
///
/// Texts with fewer than two sentences are returned unchanged.
pub fn start(text: &str) -> String {
    let sentences = sentences(text);
    if sentences.len() < 2 {
        return text.to_string();
    }
    sentences[..2].join(" ")
}

/// The middle excerpt.
///
/// Short texts (fewer than four sentences) yield everything from the midpoint
/// (`n/2`, integer division) to the end. Longer texts yield a two-sentence
/// window starting at `n/3`, clipped to the sentence count.
pub fn middle(text: &str) -> String {
    let sentences = sentences(text);
    let n = sentences.len();
    if n < 4 {
        return sentences[n / 2..].join(" ");
    }
    let mid_start = n / 3;
    let mid_end = (mid_start + 2).min(n);
    sentences[mid_start..mid_end].join(" ")
}
