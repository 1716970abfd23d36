//! TF-IDF term weighting over a small document collection.
//!
//! ## Weights
//!
//! ```text
//! tf(t, d)  = number of times term t occurs in d
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = tf(t, d) * idf(t), then the vector is L2-normalized
//! ```
//!
//! `n` is the number of documents the model was fitted on and `df(t)` the
//! number of those containing `t`. The `+ 1` terms keep every idf positive,
//! so a term that occurs everywhere still contributes a little.
//!
//! ## Terms
//!
//! A term is a run of two or more word characters (`\w`: Unicode letters,
//! digits and underscore), lower-cased. Anything else separates terms, so
//! `can't` yields only `can` and `3.14` only `14`; single characters never
//! become terms.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("term pattern is valid"));

/// Split text into lower-cased terms.
///
/// ```rust
/// let terms: Vec<String> = quarry::tokenize("Where did the cat sit? A cat!").collect();
/// assert_eq!(terms, ["where", "did", "the", "cat", "sit", "cat"]);
/// ```
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    TERM.find_iter(text).map(|term| term.as_str().to_lowercase())
}

/// A sparse vector of `(term_index, weight)` pairs, sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from unsorted entries. Duplicate indices are summed.
    #[must_use]
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_unstable_by_key(|&(index, _)| index);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (index, weight) in entries {
            match merged.last_mut() {
                Some((last, total)) if *last == index => *total += weight,
                _ => merged.push((index, weight)),
            }
        }
        Self { entries: merged }
    }

    /// The non-zero entries.
    #[must_use]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Whether the vector has no non-zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product, merging the two sorted entry lists.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_index, a_weight) = self.entries[i];
            let (b_index, b_weight) = other.entries[j];
            match a_index.cmp(&b_index) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn normalized(self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self;
        }
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(index, weight)| (index, weight / norm))
                .collect(),
        }
    }
}

/// Cosine similarity between two sparse vectors.
///
/// Zero vectors are similar to nothing: the result is `0.0` rather than NaN.
#[must_use]
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let norms = a.norm() * b.norm();
    if norms > 0.0 {
        a.dot(b) / norms
    } else {
        0.0
    }
}

/// A fitted TF-IDF model: vocabulary plus per-term idf.
///
/// ```rust
/// use quarry::{cosine_similarity, TfIdf};
///
/// let docs = ["the cat sat", "the dog ran", "cat"];
/// let model = TfIdf::fit(&docs);
///
/// let cat = model.transform("cat");
/// let sat = model.transform("the cat sat");
/// let ran = model.transform("the dog ran");
/// assert!(cosine_similarity(&cat, &sat) > cosine_similarity(&cat, &ran));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TfIdf {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdf {
    /// Fit vocabulary and idf weights on a collection of documents.
    ///
    /// Term indices follow lexicographic term order, so fitting the same
    /// collection always yields the same model.
    #[must_use]
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for document in documents {
            let mut seen: Vec<String> = tokenize(document.as_ref()).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    /// Number of distinct terms in the vocabulary.
    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// The idf weight of a term, if it is in the vocabulary.
    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&index| self.idf[index])
    }

    /// Map a document onto the fitted vocabulary as an L2-normalized
    /// TF-IDF vector. Terms outside the vocabulary are ignored.
    #[must_use]
    pub fn transform(&self, document: &str) -> SparseVector {
        let entries = tokenize(document)
            .filter_map(|term| self.vocabulary.get(&term).copied())
            .map(|index| (index, self.idf[index]))
            .collect();
        SparseVector::from_entries(entries).normalized()
    }
}
