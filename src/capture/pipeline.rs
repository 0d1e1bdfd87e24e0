use std::sync::Arc;
use std::time::Duration;

use crate::capture::output::{VideoBlob, VideoFile, output_file_name};
use crate::capture::runtime::MediaRuntime;
use crate::capture::stream::{CAPTURE_SAMPLE_RATE, CaptureStream, DRAIN_INTERVAL};
use crate::config::ExportConfig;
use crate::encode::chunks::ChunkBuffer;
use crate::encode::codec::{Codec, CodecId, resolve_codec};
use crate::encode::sink::{RecordingSink, SinkConfig};
use crate::foundation::core::Fps;
use crate::foundation::error::{StillsError, StillsResult};
use crate::render::frame::{decode_image, render_frame};
use crate::render::surface::Surface;
use crate::sequence::entry::ImageEntry;

/// Non-fatal condition recorded during an export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The requested codec is unsupported; `used` was recorded instead.
    CodecFallback {
        /// Codec asked for in the configuration.
        requested: CodecId,
        /// Codec actually used.
        used: CodecId,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodecFallback { requested, used } => {
                write!(f, "codec '{requested}' is not supported, used '{used}'")
            }
        }
    }
}

/// Outcome of a successful export.
#[derive(Clone, Debug)]
pub struct ExportReport {
    /// The delivered file.
    pub file: VideoFile,
    /// Codec asked for in the configuration.
    pub requested: CodecId,
    /// Codec actually recorded.
    pub codec: CodecId,
    /// Number of stills rendered.
    pub frames: usize,
    /// Number of stream samples recorded.
    pub samples: u64,
    /// Recorded length (`samples / sample rate`).
    pub nominal_duration: Duration,
    /// Non-fatal conditions, in the order they occurred.
    pub notices: Vec<Notice>,
}

/// Turns an ordered set of stills into one video file.
///
/// ```no_run
/// # async fn run(entries: Vec<std::sync::Arc<stills2video::ImageEntry>>) -> stills2video::StillsResult<()> {
/// use stills2video::{ExportConfig, Exporter, MemoryRuntime};
///
/// let mut exporter = Exporter::new(MemoryRuntime::new());
/// let report = exporter.export_video(&entries, &ExportConfig::default()).await?;
/// println!("{} ({} bytes)", report.file.name, report.file.size);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Exporter<R: MediaRuntime> {
    runtime: R,
    sample_rate: u32,
    drain_interval: Duration,
}

impl<R: MediaRuntime> Exporter<R> {
    /// Export through `runtime` at [`CAPTURE_SAMPLE_RATE`].
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            sample_rate: CAPTURE_SAMPLE_RATE,
            drain_interval: DRAIN_INTERVAL,
        }
    }

    /// Sample streams at `sample_rate` per second instead.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Wait `interval` between the last hold and stopping the sink.
    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    /// The runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The runtime, mutably.
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// Give back the runtime.
    pub fn into_runtime(self) -> R {
        self.runtime
    }

    /// Render `entries` in order, one still per `1 / fps` seconds, and deliver the recording.
    ///
    /// Entries are shared with the caller; their display handles stay live until both sides
    /// have dropped them. Any failure aborts the recording and no file is delivered.
    #[tracing::instrument(
        skip_all,
        fields(
            frames = entries.len(),
            fps = cfg.fps,
            width = cfg.width,
            height = cfg.height,
            codec = %cfg.codec
        )
    )]
    pub async fn export_video(
        &mut self,
        entries: &[Arc<ImageEntry>],
        cfg: &ExportConfig,
    ) -> StillsResult<ExportReport> {
        if entries.is_empty() {
            return Err(StillsError::validation("no images to export"));
        }
        cfg.validate()?;
        let fps = cfg.fps()?;
        let canvas = cfg.canvas()?;

        let mut notices = Vec::new();
        let resolution = resolve_codec(cfg.codec, |c| self.runtime.supports_codec(c))?;
        if resolution.fell_back() {
            tracing::warn!(
                requested = %resolution.requested,
                used = %resolution.codec.id,
                "requested codec unsupported, falling back"
            );
            notices.push(Notice::CodecFallback {
                requested: resolution.requested,
                used: resolution.codec.id,
            });
        }
        let codec = resolution.codec;

        let name = output_file_name(self.runtime.now(), codec);
        self.runtime.check_download(&name)?;

        let surface = self.runtime.acquire_surface(canvas)?;
        let stream = self.runtime.derive_stream(&surface, self.sample_rate)?;
        let sink = self.runtime.create_sink(codec)?;
        tracing::info!(codec = codec.label, sample_rate = self.sample_rate, "export started");

        let session = CaptureSession {
            surface,
            stream,
            sink,
            chunks: ChunkBuffer::new(),
            codec,
        };
        let recorded = session.run(entries, fps, self.drain_interval).await?;

        let file = self.runtime.create_download(recorded.blob, &name)?;
        tracing::info!(
            file = %file.name,
            bytes = file.size,
            samples = recorded.samples,
            "export finished"
        );

        Ok(ExportReport {
            file,
            requested: resolution.requested,
            codec: codec.id,
            frames: entries.len(),
            samples: recorded.samples,
            nominal_duration: recorded.duration,
            notices,
        })
    }
}

struct Recorded {
    blob: VideoBlob,
    samples: u64,
    duration: Duration,
}

/// Resources of one export run. Dropped as a whole when the run ends.
struct CaptureSession {
    surface: Surface,
    stream: CaptureStream,
    sink: Box<dyn RecordingSink>,
    chunks: ChunkBuffer,
    codec: &'static Codec,
}

impl CaptureSession {
    async fn run(
        mut self,
        entries: &[Arc<ImageEntry>],
        fps: Fps,
        drain: Duration,
    ) -> StillsResult<Recorded> {
        match self.record(entries, fps, drain).await {
            Ok(()) => Ok(Recorded {
                blob: VideoBlob {
                    mime_type: self.codec.mime_type,
                    bytes: self.chunks.take_concat(),
                },
                samples: self.stream.samples_emitted(),
                duration: self.stream.sampled_duration(),
            }),
            Err(err) => {
                tracing::debug!(error = %err, "export failed, aborting recording");
                self.sink.abort();
                self.chunks.discard();
                Err(err)
            }
        }
    }

    async fn record(
        &mut self,
        entries: &[Arc<ImageEntry>],
        fps: Fps,
        drain: Duration,
    ) -> StillsResult<()> {
        self.sink.start(
            SinkConfig {
                width: self.surface.width(),
                height: self.surface.height(),
                sample_rate: self.stream.sample_rate(),
                codec: self.codec,
            },
            self.chunks.callback(),
        )?;
        self.stream.start();

        let hold = fps.frame_duration();
        for (i, entry) in entries.iter().enumerate() {
            let image = decode_image(entry)?;
            let placed = render_frame(&mut self.surface, &image)?;
            let samples = self
                .stream
                .hold(&self.surface, hold, self.sink.as_mut())
                .await?;
            tracing::debug!(
                index = i,
                entry = %entry.id(),
                name = entry.name(),
                x = placed.x,
                y = placed.y,
                w = placed.width,
                h = placed.height,
                samples,
                "frame held"
            );
        }

        self.stream.idle(drain).await;
        self.sink.stop()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pipeline.rs"]
mod tests;
