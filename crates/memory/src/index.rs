//! In-memory vector index over the knowledge-base documents.

use std::path::{Path, PathBuf};

use {
    answerline_common::types::ContextItem,
    async_trait::async_trait,
    tokio::sync::RwLock,
    tracing::{debug, info, warn},
};

use crate::{chunker::chunk_markdown, embeddings::EmbeddingProvider};

/// Finds knowledge-base context relevant to a query embedding.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Context items ordered by descending relevance. May be empty.
    async fn retrieve(&self, embedding: &[f32]) -> anyhow::Result<Vec<ContextItem>>;
}

struct IndexedChunk {
    source: String,
    text: String,
    embedding: Vec<f32>,
}

/// Summary of a directory indexing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub files: usize,
    pub chunks: usize,
    pub skipped: usize,
}

pub struct DocumentIndex {
    chunks: RwLock<Vec<IndexedChunk>>,
    top_k: usize,
    min_score: f32,
}

impl DocumentIndex {
    pub fn new(top_k: usize, min_score: f32) -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
            top_k,
            min_score,
        }
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }

    /// Add one pre-embedded passage.
    pub async fn insert(
        &self,
        source: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) {
        self.chunks.write().await.push(IndexedChunk {
            source: source.into(),
            text: text.into(),
            embedding,
        });
    }

    /// Chunk and embed one markdown document. Returns the number of chunks added.
    pub async fn add_document(
        &self,
        embedder: &dyn EmbeddingProvider,
        source: &str,
        markdown: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> anyhow::Result<usize> {
        let texts: Vec<String> = chunk_markdown(markdown, chunk_size, overlap)
            .into_iter()
            .map(|c| match c.heading {
                Some(heading) if !c.text.trim_start().starts_with('#') => {
                    format!("{heading}\n{}", c.text)
                },
                _ => c.text,
            })
            .collect();
        if texts.is_empty() {
            return Ok(0);
        }

        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            anyhow::bail!(
                "embedder returned {} vectors for {} chunks of {source}",
                embeddings.len(),
                texts.len()
            );
        }

        let mut chunks = self.chunks.write().await;
        let added = texts.len();
        chunks.extend(
            texts
                .into_iter()
                .zip(embeddings)
                .map(|(text, embedding)| IndexedChunk {
                    source: source.to_string(),
                    text,
                    embedding,
                }),
        );
        Ok(added)
    }

    /// Index every markdown or text file under `dir`, recursively.
    ///
    /// Unreadable files are skipped and counted; embedding failures abort.
    pub async fn index_dir(
        &self,
        dir: &Path,
        embedder: &dyn EmbeddingProvider,
        chunk_size: usize,
        overlap: usize,
    ) -> anyhow::Result<IndexReport> {
        let root = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || document_paths(&root)).await?;

        let mut report = IndexReport::default();
        for path in files {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    report.skipped += 1;
                    continue;
                },
            };
            let source = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            let added = self
                .add_document(embedder, &source, &content, chunk_size, overlap)
                .await?;
            debug!(source, chunks = added, "document indexed");
            report.files += 1;
            report.chunks += added;
        }

        info!(
            dir = %dir.display(),
            files = report.files,
            chunks = report.chunks,
            skipped = report.skipped,
            model = embedder.model_name(),
            "knowledge base indexed"
        );
        Ok(report)
    }
}

/// Markdown and text files under `root`, sorted.
pub fn document_paths(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "md" | "markdown" | "txt"))
        })
        .collect();
    files.sort();
    files
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

#[async_trait]
impl Retriever for DocumentIndex {
    async fn retrieve(&self, embedding: &[f32]) -> anyhow::Result<Vec<ContextItem>> {
        let chunks = self.chunks.read().await;
        let mut scored: Vec<ContextItem> = chunks
            .iter()
            .map(|c| ContextItem {
                source: c.source.clone(),
                text: c.text.clone(),
                score: cosine_similarity(embedding, &c.embedding),
            })
            .filter(|item| item.score >= self.min_score)
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_k);
        Ok(scored)
    }
}
