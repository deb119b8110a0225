//! PDF discovery and text extraction.
//!
//! Extraction delegates to `pdf_extract`; the raw text is split into pages
//! on the form-feed characters the extractor emits between pages, and each
//! page's whitespace is normalized before chunking.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One page of extracted text.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number within the source document.
    pub number: usize,
    /// Normalized page text.
    pub text: String,
}

/// Recursively discover PDF files under a directory.
///
/// Skips hidden files and directories (names starting with `.`). Results
/// are sorted by path so indexing order is deterministic.
pub fn discover_pdfs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    walk_dir(root, &mut results)?;
    results.sort();
    Ok(results)
}

fn walk_dir(current: &Path, results: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(current)?;

    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        // Skip hidden files and directories.
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(&entry.path(), results)?;
        } else if file_type.is_file() && is_pdf(&entry.path()) {
            results.push(entry.path());
        }
    }

    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Extract the text of a PDF, page by page.
///
/// Fails if the file cannot be parsed as a PDF, or if no text at all could
/// be extracted (image-only or encrypted documents).
pub fn extract_pages(path: &Path) -> Result<Vec<Page>> {
    let bytes = std::fs::read(path)?;

    let raw = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        Error::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let pages = pages_from_text(&raw);
    if pages.is_empty() {
        return Err(Error::EmptyDocument(path.to_path_buf()));
    }

    Ok(pages)
}

/// Split extracted text into pages on form-feed and normalize each page.
///
/// Blank pages are dropped but keep their place in the numbering.
pub(crate) fn pages_from_text(raw: &str) -> Vec<Page> {
    raw.split('\u{c}')
        .enumerate()
        .filter_map(|(page_idx, page_text)| {
            let text = normalize(page_text);
            if text.is_empty() {
                None
            } else {
                Some(Page {
                    number: page_idx + 1,
                    text,
                })
            }
        })
        .collect()
}

/// Collapse runs of blank lines and trim each line.
fn normalize(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}
