//! Sentence-bounded chunking.
//!
//! Splits text into sentences, then greedily packs whole sentences into
//! chunks no longer than a character budget.
//!
//! ## Finding Sentences
//!
//! A sentence ends at `.`, `?` or `!` followed by whitespace. That is the
//! whole rule:
//!
//! ```text
//! "Dr. Smith arrived. He sat down."
//!     ^             ^
//!     split         split        -> ["Dr.", "Smith arrived.", "He sat down."]
//! ```
//!
//! Abbreviations and decimals followed by a space are split too. For
//! retrieval this is harmless: a chunk boundary can only ever land between
//! two of these pieces, never inside one.
//!
//! ## Packing
//!
//! ```text
//! max_chars = 20
//!
//! Sentences:  "The cat sat."  "It purred."  "The dog barked loudly at it."
//! Buffer:     [The cat sat.]
//!             [The cat sat. It purred.]     23 > 20 -> flush "The cat sat."
//!             [It purred.]
//!             [It purred. The dog ...]      too long -> flush "It purred."
//!             [The dog barked loudly at it.]          -> flush at end
//! ```
//!
//! A chunk is its sentences joined by a single space, and that joined text
//! is what the budget measures. Newlines or runs of spaces between
//! sentences in the source cost nothing.
//!
//! The budget is soft in one direction only: a sentence longer than
//! `max_chars` becomes a chunk of its own rather than being cut.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::{Error, Result, Slab};

/// Default chunk budget in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 300;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary pattern is valid"));

/// A text chunking strategy.
///
/// ```rust
/// use quarry::{Chunker, SentenceChunker};
///
/// fn chunk_document(chunker: &dyn Chunker, text: &str) -> Vec<quarry::Slab> {
///     chunker.chunk(text)
/// }
///
/// let slabs = chunk_document(&SentenceChunker::default(), "Hello world. This is a test.");
/// assert_eq!(slabs.len(), 1);
/// ```
pub trait Chunker: Send + Sync {
    /// Split text into chunks.
    ///
    /// Each chunk is a [`Slab`] containing the text and its byte offsets
    /// in the original document.
    fn chunk(&self, text: &str) -> Vec<Slab>;

    /// Estimate the number of chunks for a given text length.
    ///
    /// Useful for pre-allocation. May be approximate.
    fn estimate_chunks(&self, text_len: usize) -> usize {
        (text_len / 500).max(1)
    }
}

/// Split text into sentences.
///
/// Returns `(byte_offset, sentence)` pairs. Each sentence keeps its closing
/// punctuation and is trimmed of surrounding whitespace; whitespace-only
/// pieces are dropped.
///
/// ```rust
/// let sentences = quarry::split_sentences("One. Two?  Three!");
/// let texts: Vec<&str> = sentences.iter().map(|(_, s)| *s).collect();
/// assert_eq!(texts, ["One.", "Two?", "Three!"]);
/// assert_eq!(sentences[2].0, 11);
/// ```
pub fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_END.find_iter(text) {
        // The punctuation mark is a single byte and stays with its sentence.
        push_trimmed(&mut sentences, text, start, boundary.start() + 1);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, text, start, text.len());

    sentences
}

fn push_trimmed<'a>(out: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
    let piece = &text[start..end];
    let leading = piece.len() - piece.trim_start().len();
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push((start + leading, trimmed));
    }
}

/// Sentence-bounded chunker.
///
/// ## Example
///
/// ```rust
/// use quarry::{Chunker, SentenceChunker};
///
/// let chunker = SentenceChunker::new(20);
/// let slabs = chunker.chunk("First sentence. Second one. Third.");
///
/// assert_eq!(slabs.len(), 2);
/// assert_eq!(slabs[0].text, "First sentence.");
/// assert_eq!(slabs[1].text, "Second one. Third.");
/// ```
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    max_chars: usize,
}

impl SentenceChunker {
    /// Create a new sentence chunker.
    ///
    /// # Arguments
    ///
    /// * `max_chars` - Character budget per chunk
    ///
    /// # Panics
    ///
    /// Panics if `max_chars == 0`.
    #[must_use]
    pub fn new(max_chars: usize) -> Self {
        assert!(max_chars > 0, "max_chars must be > 0");
        Self { max_chars }
    }

    /// Create a chunker, rejecting a zero budget instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkSize`] if `max_chars == 0`.
    pub fn try_new(max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::InvalidChunkSize(max_chars));
        }
        Ok(Self { max_chars })
    }

    /// The character budget per chunk.
    #[must_use]
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<Slab> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return vec![];
        }
        let lengths: Vec<usize> = sentences.iter().map(|(_, s)| s.chars().count()).collect();

        let mut slabs = Vec::with_capacity(self.estimate_chunks(text.len()));
        let mut first = 0;
        let mut buffered = lengths[0];

        for next in 1..sentences.len() {
            // Sentences in a chunk are joined by a single space.
            let extended = buffered + 1 + lengths[next];
            if extended > self.max_chars {
                slabs.push(slab_for(&sentences[first..next], slabs.len()));
                first = next;
                buffered = lengths[next];
            } else {
                buffered = extended;
            }
        }
        slabs.push(slab_for(&sentences[first..], slabs.len()));

        debug!(
            sentences = sentences.len(),
            chunks = slabs.len(),
            max_chars = self.max_chars,
            "chunked document"
        );
        slabs
    }

    fn estimate_chunks(&self, text_len: usize) -> usize {
        (text_len / self.max_chars).max(1)
    }
}

fn slab_for(run: &[(usize, &str)], index: usize) -> Slab {
    let start = run.first().map(|(offset, _)| *offset).unwrap_or(0);
    let end = run
        .last()
        .map(|(offset, sentence)| offset + sentence.len())
        .unwrap_or(start);
    let text = run.iter().map(|(_, s)| *s).collect::<Vec<_>>().join(" ");
    Slab::new(text, start, end, index)
}

/// Split text into sentence-aligned chunks of at most `chunk_size`
/// characters (softly, see [`SentenceChunker`]).
///
/// ```rust
/// let chunks = quarry::split_text("One. Two. Three.", 1).unwrap();
/// assert_eq!(chunks, ["One.", "Two.", "Three."]);
/// assert!(quarry::split_text("", 300).unwrap().is_empty());
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidChunkSize`] if `chunk_size == 0`.
pub fn split_text(text: &str, chunk_size: usize) -> Result<Vec<String>> {
    let chunker = SentenceChunker::try_new(chunk_size)?;
    Ok(chunker.chunk(text).into_iter().map(|s| s.text).collect())
}
