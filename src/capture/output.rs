use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::encode::codec::Codec;

/// Finalized encoder output, tagged with its container MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoBlob {
    /// MIME type of the resolved codec.
    pub mime_type: &'static str,
    /// Concatenated chunks.
    pub bytes: Vec<u8>,
}

/// A delivered output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFile {
    /// File name, `images-video-<unix millis>.<extension>`.
    pub name: String,
    /// MIME type of the contents.
    pub mime_type: &'static str,
    /// Size in bytes.
    pub size: u64,
    /// Where the file was written, for runtimes that write to disk.
    pub path: Option<PathBuf>,
}

/// Deterministic output name for a recording finished at `now`.
pub fn output_file_name(now: DateTime<Utc>, codec: &Codec) -> String {
    format!("images-video-{}.{}", now.timestamp_millis(), codec.extension)
}
