use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::encode::codec::Codec;
use crate::foundation::error::{StillsError, StillsResult};
use crate::render::surface::FrameRGBA;

/// Receives encoded output, in the order the encoder produces it.
pub type ChunkCallback = Box<dyn FnMut(Vec<u8>) + Send + 'static>;

/// Configuration provided to a [`RecordingSink`] when recording starts.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Samples per second of the captured stream.
    pub sample_rate: u32,
    /// Codec to encode with.
    pub codec: &'static Codec,
}

/// Recording sink contract.
///
/// Lifecycle: `start` once, `push_frame` for every stream sample in strictly increasing sample
/// order, then either `stop` (clean finalization) or `abort` (discard). Encoded output is
/// handed to the chunk callback given to `start`; every chunk has been delivered by the time
/// `stop` returns.
pub trait RecordingSink: Send {
    /// Begin recording.
    fn start(&mut self, cfg: SinkConfig, on_chunk: ChunkCallback) -> StillsResult<()>;
    /// Encode one stream sample. `sample / sample_rate` is its presentation time in seconds.
    fn push_frame(&mut self, sample: u64, frame: &FrameRGBA) -> StillsResult<()>;
    /// Flush the encoder and finalize output.
    fn stop(&mut self) -> StillsResult<()>;
    /// Tear down without finalizing. Must be safe to call in any state.
    fn abort(&mut self) {}
}

/// What an [`InMemorySink`] observed.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// Configuration passed to `start`.
    pub config: Option<SinkConfig>,
    /// Every pushed sample index, in push order.
    pub samples: Vec<u64>,
    /// Pushed frames with consecutive duplicates collapsed. Empty unless the sink was created
    /// with [`InMemorySink::retaining_frames`].
    pub distinct_frames: Vec<FrameRGBA>,
    /// `stop` completed.
    pub stopped: bool,
    /// `abort` was called.
    pub aborted: bool,
}

impl Recording {
    /// Length of the recorded stream (`samples / sample_rate`).
    pub fn duration(&self) -> Duration {
        match &self.config {
            Some(cfg) if cfg.sample_rate > 0 => Duration::from_secs_f64(
                self.samples.len() as f64 / f64::from(cfg.sample_rate),
            ),
            _ => Duration::ZERO,
        }
    }
}

/// Shared view of an [`InMemorySink`]'s [`Recording`], usable after the sink was boxed.
#[derive(Debug, Clone, Default)]
pub struct RecordingProbe(Arc<Mutex<Recording>>);

impl RecordingProbe {
    /// Copy of the current recording state.
    pub fn snapshot(&self) -> Recording {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-process sink that records sample order instead of encoding video; meant for tests.
///
/// Each pushed sample is emitted as one 8-byte little-endian chunk holding the sample index, so
/// the finalized blob spells out the exact sample order. Pixel data is only kept when
/// [`InMemorySink::retaining_frames`] is used.
pub struct InMemorySink {
    probe: RecordingProbe,
    on_chunk: Option<ChunkCallback>,
    fail_at_sample: Option<u64>,
    retain_frames: bool,
    last_sample: Option<u64>,
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self {
            probe: RecordingProbe::default(),
            on_chunk: None,
            fail_at_sample: None,
            retain_frames: false,
            last_sample: None,
        }
    }

    /// Also keep a copy of every distinct pushed frame in the [`Recording`].
    pub fn retaining_frames(mut self) -> Self {
        self.retain_frames = true;
        self
    }

    /// A sink whose `push_frame` fails with an encoding error at `sample`.
    pub fn failing_at(sample: u64) -> Self {
        Self {
            fail_at_sample: Some(sample),
            ..Self::new()
        }
    }

    /// Handle for inspecting what the sink received.
    pub fn probe(&self) -> RecordingProbe {
        self.probe.clone()
    }

    /// Decode a blob produced by this sink back into sample indices.
    pub fn decode_samples(blob: &[u8]) -> Vec<u64> {
        blob.chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect()
    }
}

impl RecordingSink for InMemorySink {
    fn start(&mut self, cfg: SinkConfig, on_chunk: ChunkCallback) -> StillsResult<()> {
        if self.on_chunk.is_some() {
            return Err(StillsError::encoding("in-memory sink already started"));
        }
        let mut rec = self.probe.lock();
        *rec = Recording {
            config: Some(cfg),
            ..Recording::default()
        };
        drop(rec);
        self.on_chunk = Some(on_chunk);
        self.last_sample = None;
        Ok(())
    }

    fn push_frame(&mut self, sample: u64, frame: &FrameRGBA) -> StillsResult<()> {
        let Some(on_chunk) = self.on_chunk.as_mut() else {
            return Err(StillsError::encoding("in-memory sink not started"));
        };
        if self.last_sample.is_some_and(|last| sample <= last) {
            return Err(StillsError::encoding(
                "in-memory sink received out-of-order sample",
            ));
        }
        if self.fail_at_sample == Some(sample) {
            return Err(StillsError::encoding(format!(
                "injected failure at sample {sample}"
            )));
        }
        self.last_sample = Some(sample);

        let mut rec = self.probe.lock();
        rec.samples.push(sample);
        if self.retain_frames && rec.distinct_frames.last() != Some(frame) {
            rec.distinct_frames.push(frame.clone());
        }
        drop(rec);

        on_chunk(sample.to_le_bytes().to_vec());
        Ok(())
    }

    fn stop(&mut self) -> StillsResult<()> {
        if self.on_chunk.take().is_none() {
            return Err(StillsError::encoding("in-memory sink not started"));
        }
        self.probe.lock().stopped = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.on_chunk = None;
        self.probe.lock().aborted = true;
    }
}
