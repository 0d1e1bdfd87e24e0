use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::capture::output::{VideoBlob, VideoFile};
use crate::capture::stream::{CaptureStream, Pacing};
use crate::encode::codec::Codec;
use crate::encode::ffmpeg::{FfmpegSink, available_encoders, supports_codec};
use crate::encode::sink::RecordingSink;
use crate::foundation::core::Canvas;
use crate::foundation::error::{StillsError, StillsResult};
use crate::render::surface::Surface;
use crate::sequence::handles::HandleRegistry;

/// Platform services the capture pipeline depends on.
///
/// Implemented natively by [`NativeRuntime`] and in-process by
/// [`MemoryRuntime`](crate::MemoryRuntime); tests substitute their own.
pub trait MediaRuntime {
    /// Whether a sink for `codec` can be created.
    fn supports_codec(&self, codec: &Codec) -> bool;

    /// Allocate a drawing surface of `canvas` size.
    fn acquire_surface(&mut self, canvas: Canvas) -> StillsResult<Surface>;

    /// Derive a live stream sampling `surface` at `sample_rate` per second.
    fn derive_stream(&mut self, surface: &Surface, sample_rate: u32)
    -> StillsResult<CaptureStream>;

    /// Create a recording sink bound to `codec`.
    fn create_sink(&mut self, codec: &'static Codec) -> StillsResult<Box<dyn RecordingSink>>;

    /// Check, before recording starts, that a file called `name` can be delivered.
    fn check_download(&mut self, _name: &str) -> StillsResult<()> {
        Ok(())
    }

    /// Deliver a finalized blob as a file called `name`. Either the whole file is delivered or
    /// nothing is.
    fn create_download(&mut self, blob: VideoBlob, name: &str) -> StillsResult<VideoFile>;

    /// Registry for displayable references (revocation happens when handles drop).
    fn handles(&self) -> &HandleRegistry;

    /// Wall-clock time used to name outputs.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Options for [`NativeRuntime`].
#[derive(Clone, Debug)]
pub struct NativeRuntimeOpts {
    /// Directory output files are written into.
    pub out_dir: PathBuf,
    /// Overwrite an existing file with the same name.
    pub overwrite: bool,
    /// Pacing of capture streams.
    pub pacing: Pacing,
}

impl NativeRuntimeOpts {
    /// Write into `out_dir` in real time, never overwriting.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            overwrite: false,
            pacing: Pacing::RealTime,
        }
    }
}

/// Runtime backed by a CPU surface and the system `ffmpeg`, writing outputs to disk.
#[derive(Debug)]
pub struct NativeRuntime {
    opts: NativeRuntimeOpts,
    encoders: BTreeSet<String>,
    handles: HandleRegistry,
}

impl NativeRuntime {
    /// Create a runtime, probing `ffmpeg` for its encoders.
    pub fn new(opts: NativeRuntimeOpts) -> Self {
        let encoders = available_encoders();
        tracing::debug!(?encoders, "probed ffmpeg encoders");
        Self::with_encoders(opts, encoders)
    }

    /// Create a runtime with a known encoder set (skips probing).
    pub fn with_encoders(opts: NativeRuntimeOpts, encoders: BTreeSet<String>) -> Self {
        Self {
            opts,
            encoders,
            handles: HandleRegistry::new(),
        }
    }

    /// Runtime options.
    pub fn opts(&self) -> &NativeRuntimeOpts {
        &self.opts
    }
}

impl MediaRuntime for NativeRuntime {
    fn supports_codec(&self, codec: &Codec) -> bool {
        supports_codec(&self.encoders, codec)
    }

    fn acquire_surface(&mut self, canvas: Canvas) -> StillsResult<Surface> {
        let canvas = Canvas::new(canvas.width, canvas.height)
            .map_err(|e| StillsError::stream(format!("cannot allocate surface: {e}")))?;
        Ok(Surface::new(canvas))
    }

    fn derive_stream(
        &mut self,
        surface: &Surface,
        sample_rate: u32,
    ) -> StillsResult<CaptureStream> {
        if surface.data().is_empty() {
            return Err(StillsError::stream("cannot capture an empty surface"));
        }
        CaptureStream::new(sample_rate, self.opts.pacing)
    }

    fn create_sink(&mut self, codec: &'static Codec) -> StillsResult<Box<dyn RecordingSink>> {
        if !self.supports_codec(codec) {
            return Err(StillsError::CodecUnsupported(codec.id.to_string()));
        }
        Ok(Box::new(FfmpegSink::new()))
    }

    fn check_download(&mut self, name: &str) -> StillsResult<()> {
        let path = self.opts.out_dir.join(name);
        ensure_parent_dir(&path)?;
        if !self.opts.overwrite && path.exists() {
            return Err(StillsError::validation(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }
        Ok(())
    }

    fn create_download(&mut self, blob: VideoBlob, name: &str) -> StillsResult<VideoFile> {
        self.check_download(name)?;
        let path = self.opts.out_dir.join(name);

        let handle = self.handles.create(name);
        write_whole_file(&path, &blob.bytes)?;
        tracing::info!(
            path = %path.display(),
            bytes = blob.bytes.len(),
            handle = handle.url(),
            "wrote video"
        );
        drop(handle);

        Ok(VideoFile {
            name: name.to_string(),
            mime_type: blob.mime_type,
            size: blob.bytes.len() as u64,
            path: Some(path),
        })
    }

    fn handles(&self) -> &HandleRegistry {
        &self.handles
    }
}

/// Write `bytes` to a `.part` sibling and rename it over `path`; the sibling is removed when
/// either step fails, so `path` never holds a truncated file.
fn write_whole_file(path: &Path, bytes: &[u8]) -> StillsResult<()> {
    let part = part_path(path);
    let written = std::fs::write(&part, bytes).and_then(|()| std::fs::rename(&part, path));
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&part) {
            tracing::debug!(part = %part.display(), error = %cleanup, "no partial output to remove");
        }
        return Err(anyhow::Error::new(e)
            .context(format!("write output '{}'", path.display()))
            .into());
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> StillsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::codec::CodecId;

    fn tmp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "stills2video_runtime_{tag}_{}_{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    fn runtime(dir: &Path, encoders: &[&str]) -> NativeRuntime {
        NativeRuntime::with_encoders(
            NativeRuntimeOpts::new(dir),
            encoders.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn codec_support_follows_encoders() {
        let rt = runtime(Path::new("."), &["libvpx"]);
        assert!(rt.supports_codec(CodecId::Vp8.codec()));
        assert!(!rt.supports_codec(CodecId::H264.codec()));
    }

    #[test]
    fn create_sink_refuses_unsupported_codecs() {
        let mut rt = runtime(Path::new("."), &[]);
        assert!(matches!(
            rt.create_sink(CodecId::H264.codec()),
            Err(StillsError::CodecUnsupported(_))
        ));
    }

    #[test]
    fn download_writes_file_and_revokes_its_handle() {
        let dir = tmp_dir("download");
        let mut rt = runtime(&dir, &["libx264"]);
        let file = rt
            .create_download(
                VideoBlob {
                    mime_type: "video/mp4;codecs=h264",
                    bytes: vec![1, 2, 3],
                },
                "images-video-1.mp4",
            )
            .unwrap();

        let path = file.path.clone().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert_eq!(file.size, 3);
        assert_eq!(rt.handles().created_count(), 1);
        assert_eq!(rt.handles().live_count(), 0);

        let again = rt.create_download(
            VideoBlob {
                mime_type: "video/mp4;codecs=h264",
                bytes: vec![4],
            },
            "images-video-1.mp4",
        );
        assert!(matches!(again, Err(StillsError::Validation(_))));
    }

    #[test]
    fn existing_output_is_refused_before_recording() {
        let dir = tmp_dir("exists");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("images-video-7.webm"), b"old").unwrap();

        let mut rt = runtime(&dir, &["libvpx"]);
        assert!(matches!(
            rt.check_download("images-video-7.webm"),
            Err(StillsError::Validation(_))
        ));
        assert!(rt.check_download("images-video-8.webm").is_ok());

        let mut opts = NativeRuntimeOpts::new(&dir);
        opts.overwrite = true;
        let mut rt = NativeRuntime::with_encoders(opts, BTreeSet::new());
        assert!(rt.check_download("images-video-7.webm").is_ok());
    }

    #[test]
    fn failed_write_leaves_no_output_file() {
        let dir = tmp_dir("failed_write");
        let name = "images-video-9.mp4";
        // A directory in place of the `.part` file makes the write fail.
        std::fs::create_dir_all(dir.join(format!("{name}.part"))).unwrap();

        let mut rt = runtime(&dir, &["libx264"]);
        let err = rt
            .create_download(
                VideoBlob {
                    mime_type: "video/mp4;codecs=h264",
                    bytes: vec![0; 1024],
                },
                name,
            )
            .unwrap_err();
        assert!(matches!(err, StillsError::Other(_)));
        assert!(!dir.join(name).exists());
        assert_eq!(rt.handles().live_count(), 0);
    }

    #[test]
    fn failed_rename_removes_the_partial_file() {
        let dir = tmp_dir("failed_rename");
        let name = "images-video-10.mp4";
        // A non-empty directory at the final path cannot be replaced by a rename.
        std::fs::create_dir_all(dir.join(name).join("keep")).unwrap();

        let mut opts = NativeRuntimeOpts::new(&dir);
        opts.overwrite = true;
        let mut rt = NativeRuntime::with_encoders(opts, BTreeSet::new());
        let res = rt.create_download(
            VideoBlob {
                mime_type: "video/mp4;codecs=h264",
                bytes: vec![1; 64],
            },
            name,
        );
        assert!(res.is_err());
        assert!(!part_path(&dir.join(name)).exists());
        assert!(dir.join(name).is_dir());
    }

    #[test]
    fn surfaces_match_the_requested_canvas() {
        let mut rt = runtime(Path::new("."), &[]);
        let s = rt.acquire_surface(Canvas::new(640, 480).unwrap()).unwrap();
        assert_eq!((s.width(), s.height()), (640, 480));
        assert!(matches!(
            rt.acquire_surface(Canvas {
                width: 0,
                height: 480
            }),
            Err(StillsError::Stream(_))
        ));
        let stream = rt.derive_stream(&s, 30).unwrap();
        assert_eq!(stream.sample_rate(), 30);
    }
}
