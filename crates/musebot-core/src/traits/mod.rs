// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits consumed by the core.
//!
//! Concrete transports (the OpenAI-compatible HTTP clients and the Telegram
//! adapter) implement these; the pipeline and scheduler only ever see the
//! trait objects.

pub mod generator;
pub mod publisher;

pub use generator::{ImageGenerator, TextGenerator};
pub use publisher::MediaPublisher;
