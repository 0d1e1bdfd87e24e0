use std::time::Duration;

use tokio::time::Instant;

use crate::encode::sink::RecordingSink;
use crate::foundation::error::{StillsError, StillsResult};
use crate::render::surface::Surface;

/// Samples per second at which a capture stream reads its surface.
///
/// Independent of the playback FPS, which only decides how long each still is held.
pub const CAPTURE_SAMPLE_RATE: u32 = 30;

/// Pause between the last hold and stopping the sink, so buffered encoder output can settle.
pub const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// How a capture stream waits at its suspension points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    /// Wait on the tokio timer, so holds take their nominal wall-clock time. Sink pushes only
    /// block while the encoder is behind.
    #[default]
    RealTime,
    /// Advance the stream clock without waiting; only yields to the scheduler.
    Virtual,
}

/// Live video stream derived from a drawing surface.
///
/// The stream has its own clock starting at [`CaptureStream::start`]. Sample `n` is presented at
/// `n / sample_rate`; [`CaptureStream::hold`] emits every sample whose presentation time falls
/// before the end of the hold, so rounding never accumulates past one sample period.
#[derive(Debug)]
pub struct CaptureStream {
    sample_rate: u32,
    pacing: Pacing,
    origin: Option<Instant>,
    next_sample: u64,
    elapsed: Duration,
}

impl CaptureStream {
    /// Create a stream sampling at `sample_rate` per second.
    pub fn new(sample_rate: u32, pacing: Pacing) -> StillsResult<Self> {
        if sample_rate == 0 {
            return Err(StillsError::stream("capture sample rate must be non-zero"));
        }
        Ok(Self {
            sample_rate,
            pacing,
            origin: None,
            next_sample: 0,
            elapsed: Duration::ZERO,
        })
    }

    /// Samples per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Pacing mode.
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Number of samples emitted so far.
    pub fn samples_emitted(&self) -> u64 {
        self.next_sample
    }

    /// Stream time covered by the holds so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Length of the emitted samples (`samples / sample_rate`).
    pub fn sampled_duration(&self) -> Duration {
        self.sample_time(self.next_sample)
    }

    /// Start the stream clock. Calling it again has no effect.
    pub fn start(&mut self) {
        if self.origin.is_none() {
            self.origin = Some(Instant::now());
        }
    }

    /// Keep the current surface content on the stream for `hold`.
    ///
    /// Returns the number of samples pushed to `sink` during this hold.
    pub async fn hold(
        &mut self,
        surface: &Surface,
        hold: Duration,
        sink: &mut dyn RecordingSink,
    ) -> StillsResult<u64> {
        let origin = self
            .origin
            .ok_or_else(|| StillsError::stream("capture stream not started"))?;
        let end = self.elapsed + hold;
        let frame = surface.snapshot();

        let mut pushed = 0u64;
        loop {
            let at = self.sample_time(self.next_sample);
            if at >= end {
                break;
            }
            self.wait_until(origin, at).await;
            sink.push_frame(self.next_sample, &frame)?;
            self.next_sample += 1;
            pushed += 1;
        }

        self.wait_until(origin, end).await;
        self.elapsed = end;
        Ok(pushed)
    }

    /// Wait for `duration` without sampling.
    pub async fn idle(&mut self, duration: Duration) {
        match self.pacing {
            Pacing::RealTime => tokio::time::sleep(duration).await,
            Pacing::Virtual => tokio::task::yield_now().await,
        }
    }

    fn sample_time(&self, sample: u64) -> Duration {
        let nanos = u128::from(sample) * 1_000_000_000 / u128::from(self.sample_rate);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    async fn wait_until(&self, origin: Instant, at: Duration) {
        match self.pacing {
            Pacing::RealTime => tokio::time::sleep_until(origin + at).await,
            Pacing::Virtual => tokio::task::yield_now().await,
        }
    }
}
