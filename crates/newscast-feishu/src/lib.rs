//! # newscast-feishu
//!
//! Delivers a finished bulletin (script text plus optional audio file) to a
//! Feishu group.
//!
//! Two delivery modes exist. The webhook mode posts a text message and, when
//! a public base URL is configured, a listen link for the audio. The
//! open-platform mode fetches a tenant access token, posts the text, then
//! uploads the audio file and posts it as a file message. Delivery is
//! best-effort and at-most-once; failures are reported, never retried.

pub mod error;
pub mod sender;

pub use error::{FeishuError, FeishuResult};
pub use sender::FeishuSender;
