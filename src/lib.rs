//! stills2video turns an ordered set of still images into a single video file.
//!
//! The pipeline:
//!
//! - Collect images into a [`Sequence`] (ingest, reorder, sort, remove)
//! - Configure the export with an [`ExportConfig`]
//! - Run an [`Exporter`] over a [`MediaRuntime`]: every still is letterboxed onto a drawing
//!   surface, held for `1 / fps` seconds while a [`CaptureStream`] samples it, and the encoded
//!   chunks are delivered as one file
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Capture stream, runtimes and the export pipeline.
pub mod capture;
/// Export settings.
pub mod config;
/// Codecs and recording sinks.
pub mod encode;
/// Letterboxed frame rendering.
pub mod render;
/// The ordered image sequence.
pub mod sequence;

pub use crate::foundation::core::{Canvas, Fps, Rect};
pub use crate::foundation::error::{StillsError, StillsResult};

pub use crate::capture::memory::{MemoryRuntime, RuntimeStats};
pub use crate::capture::output::{VideoBlob, VideoFile, output_file_name};
pub use crate::capture::pipeline::{ExportReport, Exporter, Notice};
pub use crate::capture::runtime::{MediaRuntime, NativeRuntime, NativeRuntimeOpts};
pub use crate::capture::stream::{CAPTURE_SAMPLE_RATE, CaptureStream, DRAIN_INTERVAL, Pacing};
pub use crate::config::{ExportConfig, FPS_RANGE, HEIGHT_RANGE, WIDTH_RANGE};
pub use crate::encode::chunks::ChunkBuffer;
pub use crate::encode::codec::{CODEC_PREFERENCE, Codec, CodecId, CodecResolution, resolve_codec};
pub use crate::encode::ffmpeg::FfmpegSink;
pub use crate::encode::sink::{InMemorySink, Recording, RecordingProbe, RecordingSink, SinkConfig};
pub use crate::render::frame::{BACKGROUND_RGBA, decode_image, render_frame};
pub use crate::render::letterbox::{PixelRect, letterbox};
pub use crate::render::surface::{FrameRGBA, Surface};
pub use crate::sequence::entry::{EntryId, ImageEntry, IncomingFile};
pub use crate::sequence::handles::{DisplayHandle, HandleId, HandleRegistry};
pub use crate::sequence::list::{IngestReport, Sequence};
pub use crate::sequence::order::SortOrder;
