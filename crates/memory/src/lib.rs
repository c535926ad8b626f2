//! Retrieval support: markdown documents → chunked → embedded → cosine search.

pub mod chunker;
pub mod embeddings;
pub mod embeddings_openai;
pub mod index;

pub use {
    embeddings::EmbeddingProvider,
    embeddings_openai::OpenAiEmbeddingProvider,
    index::{DocumentIndex, IndexReport, Retriever, document_paths},
};
