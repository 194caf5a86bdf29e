//! Common types and utilities shared across Clipcue crates.
//!
//! This crate defines the shared data model and observability helpers used
//! throughout the Clipcue workspace. It is intentionally lightweight and
//! dependency-minimal so that all crates can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`VideoInfo`]: the title/URL record produced by extraction
//! - [`observability`]: centralised tracing/logging initialisation
use serde::{Deserialize, Serialize};

pub mod observability;

/// A video's title and page address, as recovered from a live page.
///
/// Constructed once per extraction, never mutated afterwards. The title is
/// non-empty by construction; a page where no title could be determined
/// produces no `VideoInfo` at all.
///
/// ```rust
/// use clipcue_common::VideoInfo;
///
/// let info = VideoInfo {
///     title: "晚霞下的滑板少年".to_string(),
///     url: "https://www.douyin.com/video/7300000000000000000".to_string(),
/// };
/// assert!(!info.title.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub url: String,
}
