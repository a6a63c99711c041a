//! # newscast-tts
//!
//! Converts a bulletin script into one audio artifact.
//!
//! The synthesis backend is pluggable and has a per-call size limit; longer
//! scripts are split on paragraph boundaries, synthesized chunk by chunk and
//! concatenated back in order. Concatenation is an optional capability
//! (ffmpeg); when it is missing the engine degrades per the configured
//! [`MergePolicy`](newscast_core::MergePolicy) instead of failing outright.

pub mod backend;
pub mod clean;
pub mod concat;
pub mod engine;
pub mod error;

pub use backend::{EdgeTtsBackend, EspeakBackend, SynthesisBackend, backend_for};
pub use clean::{clean_markup, split_paragraphs};
pub use concat::{AudioConcat, FfmpegConcat};
pub use engine::{AudioArtifact, SpeechSynthesizer};
pub use error::{Result, TtsError};
