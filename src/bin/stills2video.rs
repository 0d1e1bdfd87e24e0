use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use stills2video::{
    CODEC_PREFERENCE, CodecId, ExportConfig, Exporter, IncomingFile, MediaRuntime, NativeRuntime,
    NativeRuntimeOpts, Pacing, Sequence, SortOrder, Surface, render_frame,
};

#[derive(Parser, Debug)]
#[command(name = "stills2video", version)]
struct Cli {
    /// Log at debug level (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn images into a video (requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Render a single letterboxed frame as a PNG.
    Frame(FrameArgs),
    /// List codecs in preference order and whether they can be recorded.
    Codecs,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Image files, or directories whose images are added in name order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Settings JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stills per second.
    #[arg(long)]
    fps: Option<f64>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Preferred codec (`h264`, `vp9`, `vp8`).
    #[arg(long)]
    codec: Option<CodecId>,

    /// Ordering (`manual`, `name`, `date`, `size`).
    #[arg(long)]
    sort: Option<SortOrder>,

    /// Directory the video is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Hold every still for its wall-clock duration instead of recording as fast as possible.
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Frame width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Codecs => cmd_codecs(),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => ExportConfig::from_json_path(path)?,
        None => ExportConfig::default(),
    };
    if let Some(fps) = args.fps {
        cfg.fps = fps;
    }
    if let Some(width) = args.width {
        cfg.width = width;
    }
    if let Some(height) = args.height {
        cfg.height = height;
    }
    if let Some(codec) = args.codec {
        cfg.codec = codec;
    }
    if let Some(sort) = args.sort {
        cfg.sort_order = sort;
    }
    cfg.validate()?;

    let mut opts = NativeRuntimeOpts::new(&args.out_dir);
    opts.pacing = if args.realtime {
        Pacing::RealTime
    } else {
        Pacing::Virtual
    };
    let runtime = NativeRuntime::new(opts);

    let mut seq = Sequence::new(runtime.handles().clone());
    let files = collect_inputs(&args.inputs)?
        .iter()
        .map(|p| IncomingFile::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;
    seq.set_sort_order(cfg.sort_order);
    let report = seq.ingest(files);
    for name in &report.skipped {
        eprintln!("skipped {name} (not an image)");
    }

    let mut exporter = Exporter::new(runtime);
    let tokio_rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("start async runtime")?;
    let report = tokio_rt.block_on(exporter.export_video(&seq.snapshot(), &cfg))?;

    for notice in &report.notices {
        eprintln!("note: {notice}");
    }
    let shown = report
        .file
        .path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| report.file.name.clone());
    eprintln!(
        "wrote {shown} ({} frames, {:.2}s, {})",
        report.frames,
        report.nominal_duration.as_secs_f64(),
        report.codec
    );
    println!("{shown}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let defaults = ExportConfig::default();
    let cfg = ExportConfig {
        width: args.width.unwrap_or(defaults.width),
        height: args.height.unwrap_or(defaults.height),
        ..defaults
    };
    cfg.validate()?;

    let image = image::open(&args.in_path)
        .with_context(|| format!("load image '{}'", args.in_path.display()))?
        .to_rgba8();
    let mut surface = Surface::new(cfg.canvas()?);
    let placed = render_frame(&mut surface, &image)?;
    tracing::debug!(?placed, "rendered frame");

    stills2video::capture::runtime::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        surface.data(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_codecs() -> anyhow::Result<()> {
    let runtime = NativeRuntime::new(NativeRuntimeOpts::new("."));
    for id in CODEC_PREFERENCE {
        let codec = id.codec();
        let status = if runtime.supports_codec(codec) {
            "supported"
        } else {
            "unsupported"
        };
        println!("{:<5} {:<22} {status}", id.as_str(), codec.mime_type);
    }
    Ok(())
}

/// Expand directories one level, keeping file arguments as given.
fn collect_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            out.extend(dir_files(input)?);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn dir_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("read directory '{}'", dir.display()))?
            .path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
