//! Chunking utilities for splitting long documents into overlapping segments.
//!
//! Page text longer than the configured chunk size is split into windows
//! that overlap by a fixed amount, so that a sentence cut at a window edge
//! still appears whole in the neighboring window.

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Chunking configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// A segment of text cut from a larger page.
///
/// Produced by [`split_text`]. Each segment is a window of the original
/// text, with an index and byte offset for mapping back.
#[derive(Debug, Clone)]
pub struct Segment {
    /// The segment text content.
    pub text: String,
    /// Zero-based segment index within the input text.
    pub index: usize,
    /// Byte offset where this segment starts in the original text.
    pub start_offset: usize,
}

/// Split text into overlapping segments.
///
/// If the text is shorter than `chunk_size`, returns a single segment.
/// Splits prefer word boundaries and properly handle UTF-8 multi-byte
/// characters (emojis, etc.).
///
/// # Examples
///
/// ```
/// use docmind::chunking::split_text;
///
/// // Short text returns a single segment
/// let segments = split_text("Hello, world!", 1000, 200);
/// assert_eq!(segments.len(), 1);
/// assert_eq!(segments[0].text, "Hello, world!");
///
/// // Long text gets split
/// let text = "word ".repeat(500);
/// let segments = split_text(&text, 1000, 200);
/// assert!(segments.len() >= 2);
/// ```
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Segment> {
    let char_count = text.chars().count();

    // Short text doesn't need splitting
    if char_count <= chunk_size {
        if text.trim().is_empty() {
            return Vec::new();
        }
        return vec![Segment {
            text: text.to_string(),
            index: 0,
            start_offset: 0,
        }];
    }

    // Build a map of char index -> byte index for O(1) lookups
    let char_to_byte: Vec<usize> = text
        .char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .collect();

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut segments = Vec::new();
    let mut start_char = 0;
    let mut index = 0;

    while start_char < char_count {
        let end_char = (start_char + chunk_size).min(char_count);

        // Try to break at word boundary
        let segment_end_char = if end_char < char_count {
            find_word_boundary_char(text, &char_to_byte, end_char)
        } else {
            end_char
        };

        let start_byte = char_to_byte[start_char];
        let end_byte = char_to_byte[segment_end_char];

        let segment_text = &text[start_byte..end_byte];
        if !segment_text.trim().is_empty() {
            segments.push(Segment {
                text: segment_text.to_string(),
                index,
                start_offset: start_byte,
            });
            index += 1;
        }

        start_char += step;

        // Avoid creating a tiny final segment
        if char_count.saturating_sub(start_char) < chunk_size / 4
            && !segments.is_empty()
        {
            break;
        }
    }

    segments
}

/// Find a word boundary near the given char position, preferring to break
/// at whitespace or punctuation.
fn find_word_boundary_char(
    text: &str,
    char_to_byte: &[usize],
    pos_char: usize,
) -> usize {
    // Look back up to 100 chars for a good break point
    let search_start_char = pos_char.saturating_sub(100);

    let start_byte = char_to_byte[search_start_char];
    let end_byte = char_to_byte[pos_char];
    let search_region = &text[start_byte..end_byte];

    // Find the last whitespace in the region
    if let Some(ws_byte_offset) =
        search_region.rfind(|c: char| c.is_whitespace())
    {
        // Convert byte offset back to char position
        let ws_byte = start_byte + ws_byte_offset;
        // Find the char index for this byte position
        for (char_idx, &byte_idx) in char_to_byte.iter().enumerate() {
            if byte_idx > ws_byte {
                return char_idx;
            }
        }
    }

    pos_char
}
