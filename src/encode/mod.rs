//! Encoding: codec registry, recording sinks and chunk accumulation.
//!
//! Sinks consume stream samples in presentation order and hand encoded chunks to a callback,
//! which the capture pipeline points at a [`chunks::ChunkBuffer`].

/// Ordered chunk accumulation.
pub mod chunks;
/// Codec descriptions and fallback resolution.
pub mod codec;
/// `ffmpeg`-based sink (MP4/WebM via system `ffmpeg`).
pub mod ffmpeg;
/// Sink trait and the in-memory sink.
pub mod sink;
