//! Uploaded files held in memory.
//!
//! Every upload is read more than once (header sniffing, then a full read).
//! Instead of rewinding a shared handle between passes, the bytes are kept
//! once and each pass takes its own cursor starting at offset 0.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// A named, immutable upload.
///
/// Cloning is cheap: the bytes are shared.
///
/// ```rust
/// use std::io::Read;
/// use quarry::Upload;
///
/// let upload = Upload::new("notes.txt", b"hello".to_vec());
///
/// let mut first = String::new();
/// upload.cursor().read_to_string(&mut first).unwrap();
///
/// // A second pass starts from the beginning again.
/// let mut second = String::new();
/// upload.cursor().read_to_string(&mut second).unwrap();
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    name: String,
    bytes: Arc<[u8]>,
}

impl Upload {
    /// Create an upload from its file name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, named after its final path component.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// The file name as uploaded.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A fresh reader positioned at the start of the content.
    #[must_use]
    pub fn cursor(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes[..])
    }

    /// The lower-cased extension of the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}
