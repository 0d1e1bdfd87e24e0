use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::foundation::error::StillsResult;
use crate::sequence::handles::DisplayHandle;

/// Identifier of an image entry, unique within one [`Sequence`](crate::Sequence).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct EntryId(pub u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// Encoded image bytes plus their content type, cheap to clone.
#[derive(Clone, Debug)]
pub struct ImageSource {
    bytes: Arc<[u8]>,
    content_type: String,
}

impl ImageSource {
    /// Encoded bytes as supplied by the user.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type the file was admitted with (`image/...`).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// A candidate input file before it is admitted into a sequence.
#[derive(Clone, Debug)]
pub struct IncomingFile {
    /// Display name (file name without directories).
    pub name: String,
    /// Detected MIME type, `None` when it could not be determined.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

impl IncomingFile {
    /// Describe an in-memory file. The content type is derived from the name's extension,
    /// falling back to sniffing the leading bytes.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let content_type = detect_content_type(Path::new(&name), &bytes);
        Self {
            name,
            content_type,
            bytes,
            last_modified,
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: &Path) -> StillsResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read input '{}'", path.display()))?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .with_context(|| format!("read modification time of '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = detect_content_type(path, &bytes);

        Ok(Self {
            name,
            content_type,
            bytes,
            last_modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Whether the file carries an `image/*` content type.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
    }
}

fn detect_content_type(path: &Path, bytes: &[u8]) -> Option<String> {
    let by_extension = path.extension().and_then(|_| image::ImageFormat::from_path(path).ok());
    let format = by_extension.or_else(|| image::guess_format(bytes).ok())?;
    Some(format.to_mime_type().to_string())
}

/// One image of the sequence.
///
/// Owns its displayable reference; the reference is revoked when the last `Arc` to the entry is
/// dropped, so a capture still holding the entry keeps it alive.
#[derive(Debug)]
pub struct ImageEntry {
    id: EntryId,
    source: ImageSource,
    name: String,
    size: u64,
    last_modified: DateTime<Utc>,
    display: DisplayHandle,
}

impl ImageEntry {
    pub(crate) fn from_incoming(id: EntryId, file: IncomingFile, display: DisplayHandle) -> Self {
        let size = file.bytes.len() as u64;
        Self {
            id,
            source: ImageSource {
                bytes: Arc::from(file.bytes),
                content_type: file.content_type.unwrap_or_default(),
            },
            name: file.name,
            size,
            last_modified: file.last_modified,
            display,
        }
    }

    /// Entry id.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Encoded image.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the encoded file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time of the source file.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Displayable reference for previews.
    pub fn display(&self) -> &DisplayHandle {
        &self.display
    }
}
