use std::collections::BTreeSet;
use std::io::{Read, Write as _};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender};
use std::thread::JoinHandle;

use crate::encode::codec::{Codec, CodecId};
use crate::encode::sink::{ChunkCallback, RecordingSink, SinkConfig};
use crate::foundation::error::{StillsError, StillsResult};
use crate::render::surface::FrameRGBA;

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Frames queued for the stdin writer before `push_frame` blocks.
const WRITE_QUEUE_FRAMES: usize = 4;

struct FrameWrite {
    data: Arc<[u8]>,
    repeats: u64,
}

/// Sink that spawns the system `ffmpeg`, streams raw frames to its stdin and delivers the muxed
/// container bytes read from its stdout as chunks.
///
/// Frames are written to `ffmpeg` by a helper thread through a short bounded queue, so
/// `push_frame` only blocks when the encoder falls several frames behind. Odd canvas sizes are
/// padded by one pixel inside `ffmpeg`, since `yuv420p` needs even dimensions.
pub struct FfmpegSink {
    child: Option<Child>,
    frames: Option<SyncSender<FrameWrite>>,
    stdin_writer: Option<JoinHandle<std::io::Result<()>>>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_sample: Option<u64>,
    last_frame: Option<Arc<[u8]>>,
}

impl Default for FfmpegSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegSink {
    /// Create an idle sink; `ffmpeg` is spawned by [`RecordingSink::start`].
    pub fn new() -> Self {
        Self {
            child: None,
            frames: None,
            stdin_writer: None,
            stdout_drain: None,
            stderr_drain: None,
            cfg: None,
            last_sample: None,
            last_frame: None,
        }
    }

    fn join_writer(&mut self) -> StillsResult<()> {
        match self.stdin_writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StillsError::encoding("ffmpeg stdin writer thread panicked"))?
                .map_err(|e| {
                    StillsError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
                }),
            None => Ok(()),
        }
    }

    fn join_stdout(&mut self) -> StillsResult<()> {
        match self.stdout_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StillsError::encoding("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| StillsError::encoding(format!("ffmpeg stdout read failed: {e}"))),
            None => Ok(()),
        }
    }

    fn join_stderr(&mut self) -> StillsResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StillsError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| StillsError::encoding(format!("ffmpeg stderr read failed: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}

/// Build the `ffmpeg` argument list for recording `cfg` to stdout.
pub(crate) fn ffmpeg_args(cfg: &SinkConfig) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    args.push(format!("{}x{}", cfg.width, cfg.height));
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    args.extend(["-r".to_string(), cfg.sample_rate.to_string()]);
    args.extend(["-i", "pipe:0", "-an"].map(String::from));
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        args.extend(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"].map(String::from));
    }
    args.extend(["-c:v", cfg.codec.encoder].map(String::from));

    match cfg.codec.id {
        CodecId::H264 => args.extend(["-preset", "veryfast"].map(String::from)),
        CodecId::Vp9 => args.extend(["-b:v", "0", "-crf", "32", "-row-mt", "1"].map(String::from)),
        CodecId::Vp8 => args.extend(["-b:v", "4M"].map(String::from)),
    }
    args.extend(["-pix_fmt", "yuv420p"].map(String::from));

    if cfg.codec.muxer == "mp4" {
        // A pipe is not seekable: write a fragmented MP4 with the moov atom up front.
        args.extend(["-movflags", "frag_keyframe+empty_moov+default_base_moof"].map(String::from));
    }
    args.extend(["-f", cfg.codec.muxer, "pipe:1"].map(String::from));
    args
}

impl RecordingSink for FfmpegSink {
    fn start(&mut self, cfg: SinkConfig, mut on_chunk: ChunkCallback) -> StillsResult<()> {
        if self.child.is_some() {
            return Err(StillsError::encoding("ffmpeg sink already started"));
        }
        if cfg.sample_rate == 0 {
            return Err(StillsError::validation("sample rate must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StillsError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(StillsError::encoding(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StillsError::encoding(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StillsError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| StillsError::encoding("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| StillsError::encoding("failed to open ffmpeg stderr (unexpected)"))?;

        let (frames, queued) = mpsc::sync_channel::<FrameWrite>(WRITE_QUEUE_FRAMES);
        let stdin_writer = std::thread::spawn(move || {
            for write in queued {
                for _ in 0..write.repeats {
                    stdin.write_all(&write.data)?;
                }
            }
            stdin.flush()
        });
        let stdout_drain = std::thread::spawn(move || {
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                on_chunk(buf[..n].to_vec());
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            codec = %cfg.codec.id,
            width = cfg.width,
            height = cfg.height,
            sample_rate = cfg.sample_rate,
            "ffmpeg sink started"
        );

        self.child = Some(child);
        self.frames = Some(frames);
        self.stdin_writer = Some(stdin_writer);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_sample = None;
        self.last_frame = None;
        Ok(())
    }

    fn push_frame(&mut self, sample: u64, frame: &FrameRGBA) -> StillsResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StillsError::encoding("ffmpeg sink not started"))?;
        if let Some(last) = self.last_sample
            && sample <= last
        {
            return Err(StillsError::encoding(
                "ffmpeg sink received out-of-order sample",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(StillsError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width as usize) * (cfg.height as usize) * 4 {
            return Err(StillsError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        // The input is a constant-rate raw stream, so a skipped sample index is filled by
        // repeating this frame.
        let repeats = match self.last_sample {
            Some(last) => sample - last,
            None => sample + 1,
        };
        self.last_sample = Some(sample);

        let data = match &self.last_frame {
            Some(last) if **last == *frame.data => Arc::clone(last),
            _ => Arc::from(frame.data.as_slice()),
        };
        self.last_frame = Some(Arc::clone(&data));

        let Some(frames) = self.frames.as_ref() else {
            return Err(StillsError::encoding("ffmpeg sink is already finalized"));
        };
        if frames.send(FrameWrite { data, repeats }).is_err() {
            // The writer only exits early on a failed write; report that failure.
            self.frames = None;
            self.join_writer()?;
            return Err(StillsError::encoding("ffmpeg stdin writer stopped unexpectedly"));
        }
        Ok(())
    }

    fn stop(&mut self) -> StillsResult<()> {
        drop(self.frames.take());
        let write_result = self.join_writer();
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StillsError::encoding("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            StillsError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stdout_result = self.join_stdout();
        let stderr_bytes = self.join_stderr()?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StillsError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        write_result?;
        stdout_result?;

        self.cfg = None;
        self.last_frame = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.frames.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg already exited before abort");
            }
            let _ = child.wait();
        }
        let _ = self.join_writer();
        let _ = self.join_stdout();
        let _ = self.join_stderr();
        self.cfg = None;
        self.last_frame = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Names of the video encoders the local `ffmpeg` build provides.
///
/// Empty when `ffmpeg` is missing.
pub fn available_encoders() -> BTreeSet<String> {
    let out = match Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(out) if out.status.success() => out,
        Ok(out) => {
            tracing::debug!(status = %out.status, "ffmpeg -encoders failed");
            return BTreeSet::new();
        }
        Err(e) => {
            tracing::debug!(error = %e, "ffmpeg is not available");
            return BTreeSet::new();
        }
    };
    parse_encoder_list(&String::from_utf8_lossy(&out.stdout))
}

/// Parse `ffmpeg -encoders` output into the set of video encoder names.
pub(crate) fn parse_encoder_list(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

/// Whether `codec` can be recorded given the encoder names from [`available_encoders`].
pub fn supports_codec(encoders: &BTreeSet<String>, codec: &Codec) -> bool {
    encoders.contains(codec.encoder)
}
