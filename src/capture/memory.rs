use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::capture::output::{VideoBlob, VideoFile};
use crate::capture::runtime::MediaRuntime;
use crate::capture::stream::{CaptureStream, Pacing};
use crate::encode::codec::{CODEC_PREFERENCE, Codec, CodecId};
use crate::encode::sink::{InMemorySink, RecordingProbe, RecordingSink};
use crate::foundation::core::Canvas;
use crate::foundation::error::{StillsError, StillsResult};
use crate::render::surface::Surface;
use crate::sequence::handles::HandleRegistry;

/// Resource counters of a [`MemoryRuntime`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Surfaces handed out.
    pub surfaces_acquired: u32,
    /// Streams derived.
    pub streams_derived: u32,
    /// Sinks created.
    pub sinks_created: u32,
}

/// In-process runtime for tests: [`InMemorySink`] recording, outputs kept in memory.
///
/// Streams use [`Pacing::Virtual`] unless configured otherwise. Failure injection makes the
/// pipeline's error paths reachable without a real encoder. Delivered blobs stay in memory
/// until [`MemoryRuntime::take_downloads`] is called; frame pixels are only kept with
/// [`MemoryRuntime::retaining_frames`].
#[derive(Debug)]
pub struct MemoryRuntime {
    supported: BTreeSet<CodecId>,
    pacing: Pacing,
    clock: Option<DateTime<Utc>>,
    fail_stream: bool,
    fail_sink_at: Option<u64>,
    retain_frames: bool,
    handles: HandleRegistry,
    stats: RuntimeStats,
    recording: Option<RecordingProbe>,
    delivered: BTreeSet<String>,
    downloads: Vec<(VideoFile, VideoBlob)>,
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRuntime {
    /// A runtime that supports every known codec.
    pub fn new() -> Self {
        Self {
            supported: CODEC_PREFERENCE.into_iter().collect(),
            pacing: Pacing::Virtual,
            clock: None,
            fail_stream: false,
            fail_sink_at: None,
            retain_frames: false,
            handles: HandleRegistry::new(),
            stats: RuntimeStats::default(),
            recording: None,
            delivered: BTreeSet::new(),
            downloads: Vec::new(),
        }
    }

    /// Restrict the supported codecs.
    pub fn with_supported(mut self, codecs: impl IntoIterator<Item = CodecId>) -> Self {
        self.supported = codecs.into_iter().collect();
        self
    }

    /// Use `pacing` for derived streams.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Report `now` as the current time.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Make `derive_stream` fail.
    pub fn failing_stream(mut self) -> Self {
        self.fail_stream = true;
        self
    }

    /// Make every created sink fail when it receives `sample`.
    pub fn failing_sink_at(mut self, sample: u64) -> Self {
        self.fail_sink_at = Some(sample);
        self
    }

    /// Keep the pixels of every distinct recorded frame (see [`MemoryRuntime::last_recording`]).
    pub fn retaining_frames(mut self) -> Self {
        self.retain_frames = true;
        self
    }

    /// Resource counters.
    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Probe of the most recently created sink.
    pub fn last_recording(&self) -> Option<&RecordingProbe> {
        self.recording.as_ref()
    }

    /// Delivered files not yet taken, with their contents, oldest first.
    pub fn downloads(&self) -> &[(VideoFile, VideoBlob)] {
        &self.downloads
    }

    /// Hand over the delivered files, releasing their contents.
    pub fn take_downloads(&mut self) -> Vec<(VideoFile, VideoBlob)> {
        std::mem::take(&mut self.downloads)
    }
}

impl MediaRuntime for MemoryRuntime {
    fn supports_codec(&self, codec: &Codec) -> bool {
        self.supported.contains(&codec.id)
    }

    fn acquire_surface(&mut self, canvas: Canvas) -> StillsResult<Surface> {
        let canvas = Canvas::new(canvas.width, canvas.height)
            .map_err(|e| StillsError::stream(format!("cannot allocate surface: {e}")))?;
        self.stats.surfaces_acquired += 1;
        Ok(Surface::new(canvas))
    }

    fn derive_stream(
        &mut self,
        _surface: &Surface,
        sample_rate: u32,
    ) -> StillsResult<CaptureStream> {
        if self.fail_stream {
            return Err(StillsError::stream("stream capture is unavailable"));
        }
        self.stats.streams_derived += 1;
        CaptureStream::new(sample_rate, self.pacing)
    }

    fn create_sink(&mut self, codec: &'static Codec) -> StillsResult<Box<dyn RecordingSink>> {
        if !self.supports_codec(codec) {
            return Err(StillsError::CodecUnsupported(codec.id.to_string()));
        }
        let mut sink = match self.fail_sink_at {
            Some(sample) => InMemorySink::failing_at(sample),
            None => InMemorySink::new(),
        };
        if self.retain_frames {
            sink = sink.retaining_frames();
        }
        self.recording = Some(sink.probe());
        self.stats.sinks_created += 1;
        Ok(Box::new(sink))
    }

    fn check_download(&mut self, name: &str) -> StillsResult<()> {
        if self.delivered.contains(name) {
            return Err(StillsError::validation(format!(
                "output '{name}' was already delivered"
            )));
        }
        Ok(())
    }

    fn create_download(&mut self, blob: VideoBlob, name: &str) -> StillsResult<VideoFile> {
        self.check_download(name)?;
        let handle = self.handles.create(name);
        tracing::debug!(name, url = handle.url(), bytes = blob.bytes.len(), "download");
        drop(handle);

        let file = VideoFile {
            name: name.to_string(),
            mime_type: blob.mime_type,
            size: blob.bytes.len() as u64,
            path: None,
        };
        self.delivered.insert(file.name.clone());
        self.downloads.push((file.clone(), blob));
        Ok(file)
    }

    fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }
}
