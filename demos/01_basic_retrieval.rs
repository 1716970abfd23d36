//! Basic Retrieval
//!
//! The minimal example: chunk a document and ask it a question.
//!
//! ```bash
//! cargo run --example 01_basic_retrieval
//! ```

use quarry::{Answer, Chunker, Document, Retriever, SentenceChunker};

fn main() {
    let document = Document::pasted(
        "Machine learning models learn patterns from data. \
        They generalize these patterns to make predictions. \
        This is fundamentally different from traditional programming. \
        Deep learning extends this with multiple hidden layers. \
        Each layer learns increasingly abstract representations.",
    );

    // Pack sentences into chunks of at most 120 characters
    let chunker = SentenceChunker::new(120);
    let chunks = chunker.chunk(document.text());

    println!("Document: {} chars", document.text().chars().count());
    println!("Chunks: {}\n", chunks.len());

    for chunk in &chunks {
        println!("[{}] {} chars: \"{}\"", chunk.index, chunk.char_len(), chunk.text);
    }

    let retriever = Retriever::with_chunker(chunker);
    for query in ["What do hidden layers add?", "How do models make predictions?", ""] {
        println!("\nQ: {query:?}");
        match retriever.ask(&document, query) {
            Answer::Found { slab, score } => println!("A: [{}] {:.3} {}", slab.index, score, slab.text),
            answer @ Answer::NoInput => println!("A: {answer}"),
        }
    }
}
