//! Policy document handling: chunk extraction, persistence, and TF-IDF
//! retrieval over the chunk corpus.

pub mod retriever;
pub mod store;
pub(crate) mod text;

pub use retriever::{ScoredChunk, TfIdfIndex};
pub use store::{Chunk, ChunkPolicy, DocumentStore};
