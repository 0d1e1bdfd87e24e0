/// Convenience result type used across stills2video.
pub type StillsResult<T> = Result<T, StillsError>;

/// Top-level error taxonomy used by the sequencing and capture APIs.
#[derive(thiserror::Error, Debug)]
pub enum StillsError {
    /// Invalid user input: non-image file, empty sequence, out-of-range settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested codec cannot be recorded by the runtime.
    ///
    /// The capture pipeline recovers from this locally by substituting a fallback codec.
    #[error("codec '{0}' is not supported by this runtime")]
    CodecUnsupported(String),

    /// None of the known codecs can be recorded by the runtime.
    #[error("no supported codec (tried: {0})")]
    NoSupportedCodec(String),

    /// An image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The drawing surface or its captured stream could not be acquired.
    #[error("stream error: {0}")]
    Stream(String),

    /// The recording sink reported an error.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StillsError {
    /// Build a [`StillsError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StillsError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`StillsError::Stream`] value.
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Build a [`StillsError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Return `false` for kinds that callers recover from locally (codec fallback).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::CodecUnsupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            StillsError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(StillsError::decode("x").to_string().contains("decode error:"));
        assert!(StillsError::stream("x").to_string().contains("stream error:"));
        assert!(
            StillsError::encoding("x")
                .to_string()
                .contains("encoding error:")
        );
    }

    #[test]
    fn codec_unsupported_is_the_only_recoverable_kind() {
        assert!(!StillsError::CodecUnsupported("vp9".to_string()).is_fatal());
        assert!(StillsError::NoSupportedCodec("h264".to_string()).is_fatal());
        assert!(StillsError::decode("x").is_fatal());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = StillsError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
