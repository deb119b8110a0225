//! Builds the index: discover PDFs, extract text, chunk, embed, store.
//!
//! Each run replaces the store contents wholesale; there is no incremental
//! update path. Text extraction runs in parallel across files; embedding
//! runs sequentially so at most one request is in flight at a time.

use std::path::Path;

use kdam::{tqdm, BarExt};
use rayon::prelude::*;

use crate::chunking::{split_text, ChunkingConfig};
use crate::error::{Error, Result};
use crate::llm::Embedder;
use crate::pdf::{self, Page};
use crate::store::{Chunk, IndexStore};

/// Counters describing one indexing run.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
}

/// Index every PDF under `dir`, replacing the store contents.
///
/// Documents that cannot be parsed are skipped with a warning; the run
/// fails only if no document yields any text, so a single corrupt file
/// cannot empty the index.
pub fn index_directory(
    embedder: &dyn Embedder,
    store: &IndexStore,
    embed_model: &str,
    dir: &Path,
    chunking: ChunkingConfig,
    progress: bool,
) -> Result<IndexReport> {
    let files = pdf::discover_pdfs(dir)?;
    if files.is_empty() {
        return Err(Error::Config(format!(
            "no PDF files found under {}",
            dir.display()
        )));
    }

    tracing::info!("extracting text from {} files", files.len());

    // Extract in parallel, then embed sequentially.
    let extracted: Vec<(String, Vec<Page>)> = files
        .par_iter()
        .filter_map(|path| match pdf::extract_pages(path) {
            Ok(pages) => Some((source_name(path), pages)),
            Err(err) => {
                tracing::warn!("skipping {}: {err}", path.display());
                None
            }
        })
        .collect();

    if extracted.is_empty() {
        return Err(Error::Config(
            "no text could be extracted from any document".into(),
        ));
    }

    let mut pages = 0;
    let mut chunks = Vec::new();
    for (source, doc_pages) in &extracted {
        pages += doc_pages.len();
        chunks.extend(chunks_from_pages(source, doc_pages, chunking));
    }

    let mut entries = Vec::with_capacity(chunks.len());
    let mut bar = progress.then(|| tqdm!(total = chunks.len(), desc = "embedding"));
    for chunk in chunks {
        let vector = embedder.embed(&chunk.text)?;
        entries.push((chunk, vector));
        if let Some(bar) = bar.as_mut() {
            bar.update(1)?;
        }
    }
    if bar.is_some() {
        eprintln!();
    }

    store.rebuild(embed_model, &entries)?;

    Ok(IndexReport {
        documents: extracted.len(),
        pages,
        chunks: entries.len(),
    })
}

/// Chunk the pages of one document, numbering chunks continuously across
/// page boundaries.
fn chunks_from_pages(
    source: &str,
    pages: &[Page],
    chunking: ChunkingConfig,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut index = 0;
    for page in pages {
        for segment in split_text(&page.text, chunking.chunk_size, chunking.overlap)
        {
            chunks.push(Chunk {
                source: source.to_string(),
                page: page.number,
                index,
                text: segment.text,
            });
            index += 1;
        }
    }
    chunks
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
