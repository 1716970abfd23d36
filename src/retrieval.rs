//! Nearest-chunk retrieval.
//!
//! The query is added to the fitting corpus, so a term that only the query
//! uses still gets an idf (it just matches nothing). Every chunk is scored
//! by cosine similarity against the query and the best one wins. There is
//! no threshold: a poor match is still the answer.
//!
//! ```text
//! chunks:  ["The cat sat.", "The dog ran."]
//! query:   "Where did the cat sit?"
//!
//! corpus:  chunks + [query]  ->  fit TF-IDF
//! scores:  [0.34, 0.11]      ->  "The cat sat."
//! ```

use tracing::debug;

use crate::{cosine_similarity, Chunker, Document, SentenceChunker, Slab, TfIdf};

/// Returned in place of an answer when there is no text or no question.
pub const GUIDANCE_MESSAGE: &str = "Please upload text and ask a question.";

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk<'a> {
    /// Position of the chunk in the input sequence.
    pub index: usize,
    /// The chunk text.
    pub text: &'a str,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
}

/// Find the chunk most similar to `query`.
///
/// Returns `None` when there are no chunks or the query is blank. Ties go
/// to the earliest chunk; when nothing overlaps at all that is chunk 0.
///
/// ```rust
/// let chunks = ["The cat sat.", "The dog ran."];
/// let best = quarry::best_match(&chunks, "Where did the cat sit?").unwrap();
/// assert_eq!(best.index, 0);
/// assert!(best.score > 0.0);
/// ```
pub fn best_match<'a, S: AsRef<str>>(chunks: &'a [S], query: &str) -> Option<ScoredChunk<'a>> {
    if chunks.is_empty() || query.trim().is_empty() {
        return None;
    }

    let mut corpus: Vec<&str> = chunks.iter().map(AsRef::as_ref).collect();
    corpus.push(query);
    let model = TfIdf::fit(&corpus);
    let query_vector = model.transform(query);

    let mut best: Option<ScoredChunk<'a>> = None;
    for (index, chunk) in chunks.iter().enumerate() {
        let text = chunk.as_ref();
        let score = cosine_similarity(&query_vector, &model.transform(text));
        // Strictly greater, so the first of equal scores is kept.
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(ScoredChunk { index, text, score });
        }
    }

    if let Some(b) = &best {
        debug!(
            chunks = chunks.len(),
            vocabulary = model.vocabulary_len(),
            best = b.index,
            score = b.score,
            "scored chunks"
        );
    }
    best
}

/// Return the chunk most similar to `query`, or [`GUIDANCE_MESSAGE`] when
/// either input is empty.
///
/// ```rust
/// use quarry::{retrieve_answer, GUIDANCE_MESSAGE};
///
/// assert_eq!(retrieve_answer(&["The cat sat.", "The dog ran."], "Where did the cat sit?"), "The cat sat.");
/// assert_eq!(retrieve_answer::<&str>(&[], "x"), GUIDANCE_MESSAGE);
/// assert_eq!(retrieve_answer(&["a"], ""), GUIDANCE_MESSAGE);
/// ```
pub fn retrieve_answer<S: AsRef<str>>(chunks: &[S], query: &str) -> String {
    best_match(chunks, query)
        .map(|scored| scored.text.to_string())
        .unwrap_or_else(|| GUIDANCE_MESSAGE.to_string())
}

/// The outcome of asking a question of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The best-matching chunk.
    Found {
        /// The chunk, with its offsets into the document.
        slab: Slab,
        /// Cosine similarity to the query.
        score: f64,
    },
    /// No text or no question was supplied.
    NoInput,
}

impl Answer {
    /// The text to show the user.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Found { slab, .. } => &slab.text,
            Self::NoInput => GUIDANCE_MESSAGE,
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// The retrieval pipeline: chunk a document, then pick the nearest chunk.
///
/// Chunks are recomputed on every question; nothing is cached between calls.
///
/// ```rust
/// use quarry::{Document, Retriever};
///
/// let retriever = Retriever::new(40);
/// let doc = Document::pasted("Rust has no garbage collector. Python has one. \
///                             Ownership replaces the collector in Rust.");
/// let answer = retriever.ask(&doc, "What replaces the garbage collector?");
/// assert!(answer.text().contains("Rust"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    chunker: SentenceChunker,
}

impl Retriever {
    /// Create a retriever with the given chunk budget in characters.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == 0`.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self::with_chunker(SentenceChunker::new(chunk_size))
    }

    /// Create a retriever around an existing chunker.
    #[must_use]
    pub fn with_chunker(chunker: SentenceChunker) -> Self {
        Self { chunker }
    }

    /// Answer `query` from `document`.
    pub fn ask(&self, document: &Document, query: &str) -> Answer {
        let slabs = self.chunker.chunk(document.text());
        match best_match(&slabs, query) {
            Some(scored) => Answer::Found {
                score: scored.score,
                slab: slabs[scored.index].clone(),
            },
            None => Answer::NoInput,
        }
    }
}
