//! # newscast-avatar
//!
//! Renders a talking-head video from a finished audio artifact through a
//! remote video-generation platform.
//!
//! The KreadoAI flow is an asynchronous remote job: upload the audio (and
//! optionally an avatar image), create a rendering task, poll it on a fixed
//! interval under a wall-clock budget, then download the result. The job's
//! [`JobState`] transitions are monotonic; `Completed`, `Failed` and
//! `TimedOut` are terminal, and `TimedOut` means the remote job's fate is
//! unknown — not that the platform reported failure.

pub mod api;
pub mod clock;
pub mod error;
pub mod render;
pub mod types;

pub use api::AvatarClient;
pub use clock::{Clock, SystemClock};
pub use error::{AvatarError, Result};
pub use render::{Platform, VideoArtifact, VideoRenderer};
pub use types::{JobState, RemoteAsset, VideoJob};
