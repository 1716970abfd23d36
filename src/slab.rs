//! The Slab type: one retrieval chunk with its position in the document.

/// A sentence-aligned chunk of a document.
///
/// ## Byte Offsets
///
/// `start` and `end` are byte offsets into the original text, not character
/// indices. They span the chunk's sentences in the source; the chunk text
/// itself has those sentences joined by one space, so the two differ only
/// in the whitespace between sentences:
///
/// ```rust
/// use quarry::{Chunker, SentenceChunker};
///
/// let text = "Hello there.\n\nHow are you?";
/// let slab = &SentenceChunker::default().chunk(text)[0];
///
/// assert_eq!(slab.text, "Hello there. How are you?");
/// assert_eq!(&text[slab.span()], text);
/// ```
///
/// Slabs never overlap and always start and end on sentence boundaries:
///
/// ```text
/// Document: "One. Two. Three."   (max 9 chars)
/// Slab 0:   "One. Two."    [0..9]
/// Slab 1:   "Three."       [10..16]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    /// The chunk text.
    pub text: String,
    /// Byte offset where this chunk starts in the original document.
    pub start: usize,
    /// Byte offset where this chunk ends (exclusive) in the original document.
    pub end: usize,
    /// Zero-based index of this chunk in the sequence.
    pub index: usize,
}

impl Slab {
    /// Create a new slab.
    #[must_use]
    pub fn new(text: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index,
        }
    }

    /// The length of this chunk in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// The length of this chunk in characters, the unit chunk sizes are
    /// measured in.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte span of this chunk in the original document.
    #[must_use]
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl AsRef<str> for Slab {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Slab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Slab {{ index: {}, span: {}..{}, chars: {} }}",
            self.index,
            self.start,
            self.end,
            self.char_len()
        )
    }
}
