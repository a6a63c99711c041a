//! # newscast-core
//!
//! Shared foundation for the Newscast pipeline.
//!
//! This crate provides:
//! - Configuration loading and credential resolution
//! - The news digest input model consumed by the script generator
//! - The bounded script history log
//! - Markdown export of finished scripts
//! - Text and Beijing-time utilities shared across stages

pub mod config;
pub mod digest;
pub mod export;
pub mod history;
pub mod text;
pub mod time;

pub use config::{
    AvatarSettings, ConfigError, FeishuSettings, MergePolicy, NewscastConfig, ScriptSettings,
    TtsSettings,
};
pub use digest::{KeywordStat, NewsDigest, TitleEntry};
pub use export::{estimated_minutes, export_markdown, ExportError};
pub use history::{HistoryEntry, HistoryError, ScriptHistory, MAX_HISTORY_ENTRIES};
pub use text::preview_snippet;
pub use time::{beijing_now, format_date_cn, weekday_cn};
