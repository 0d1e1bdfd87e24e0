use crate::foundation::error::{StillsError, StillsResult};

/// Codec identifiers accepted in settings.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CodecId {
    /// H.264 in an MP4 container.
    #[default]
    H264,
    /// VP9 in a WebM container.
    Vp9,
    /// VP8 in a WebM container.
    Vp8,
}

/// Static description of a recordable codec.
#[derive(Debug, PartialEq, Eq)]
pub struct Codec {
    /// Settings identifier.
    pub id: CodecId,
    /// Human readable label.
    pub label: &'static str,
    /// MIME type of the produced file, including the codec parameter.
    pub mime_type: &'static str,
    /// Output file extension (without dot).
    pub extension: &'static str,
    /// `ffmpeg` muxer name.
    pub muxer: &'static str,
    /// `ffmpeg` encoder name.
    pub encoder: &'static str,
}

/// Fallback priority: when the requested codec is unavailable, the first supported entry wins.
pub const CODEC_PREFERENCE: [CodecId; 3] = [CodecId::H264, CodecId::Vp9, CodecId::Vp8];

static H264: Codec = Codec {
    id: CodecId::H264,
    label: "H.264 (MP4)",
    mime_type: "video/mp4;codecs=h264",
    extension: "mp4",
    muxer: "mp4",
    encoder: "libx264",
};

static VP9: Codec = Codec {
    id: CodecId::Vp9,
    label: "VP9 (WebM)",
    mime_type: "video/webm;codecs=vp9",
    extension: "webm",
    muxer: "webm",
    encoder: "libvpx-vp9",
};

static VP8: Codec = Codec {
    id: CodecId::Vp8,
    label: "VP8 (WebM)",
    mime_type: "video/webm;codecs=vp8",
    extension: "webm",
    muxer: "webm",
    encoder: "libvpx",
};

impl CodecId {
    /// Static codec description.
    pub fn codec(self) -> &'static Codec {
        match self {
            Self::H264 => &H264,
            Self::Vp9 => &VP9,
            Self::Vp8 => &VP8,
        }
    }

    /// Stable lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Vp9 => "vp9",
            Self::Vp8 => "vp8",
        }
    }
}

impl std::fmt::Display for CodecId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CodecId {
    type Err = StillsError;

    /// Accepts the short id (`vp9`) or the full MIME type (`video/webm;codecs=vp9`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CODEC_PREFERENCE
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s) || id.codec().mime_type == s)
            .ok_or_else(|| StillsError::CodecUnsupported(s.to_string()))
    }
}

/// Result of matching a requested codec against what a runtime can record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecResolution {
    /// Codec that was asked for.
    pub requested: CodecId,
    /// Codec that will be used.
    pub codec: &'static Codec,
}

impl CodecResolution {
    /// Whether a fallback replaced the requested codec.
    pub fn fell_back(&self) -> bool {
        self.codec.id != self.requested
    }
}

/// Pick the codec to record with.
///
/// Uses `requested` when supported, otherwise the first supported codec in
/// [`CODEC_PREFERENCE`]. Fails with [`StillsError::NoSupportedCodec`] when nothing is.
pub fn resolve_codec(
    requested: CodecId,
    supports: impl Fn(&Codec) -> bool,
) -> StillsResult<CodecResolution> {
    if supports(requested.codec()) {
        return Ok(CodecResolution {
            requested,
            codec: requested.codec(),
        });
    }

    let fallback = CODEC_PREFERENCE
        .into_iter()
        .map(CodecId::codec)
        .find(|c| supports(c));

    match fallback {
        Some(codec) => Ok(CodecResolution { requested, codec }),
        None => Err(StillsError::NoSupportedCodec(
            CODEC_PREFERENCE
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}
