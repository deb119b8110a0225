//! Persistent index of chunk records and their embedding vectors.
//!
//! The store is append-free: `rebuild` replaces the entire contents in one
//! transaction, and readers only ever see a fully built index. Rows are
//! keyed by insertion position, so chunk and vector tables stay aligned.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CHUNKS: TableDefinition<u64, &[u8]> = TableDefinition::new("chunks");
const VECTORS: TableDefinition<u64, &[u8]> = TableDefinition::new("vectors");
const META: TableDefinition<&str, &str> = TableDefinition::new("meta");

const EMBED_MODEL_KEY: &str = "embed_model";
const DIMENSION_KEY: &str = "dimension";

/// Header size: 4 bytes dimension.
const HEADER_SIZE: usize = 4;

/// A span of source text plus its originating document position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// File name of the source document.
    pub source: String,
    /// 1-based page number within the source document.
    pub page: usize,
    /// Zero-based chunk index within the source document.
    pub index: usize,
    /// The chunk text.
    pub text: String,
}

/// Summary counters for the `status` command.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub documents: usize,
    pub chunks: usize,
    pub embed_model: Option<String>,
    pub dimension: Option<usize>,
}

/// Stores chunk records (JSON) and embedding vectors (f32 LE) keyed by
/// insertion position.
///
/// Binary format per vector entry:
/// - 4 bytes: dimension D (u32 LE)
/// - D * 4 bytes: f32 LE values
pub struct IndexStore {
    db: Database,
}

impl IndexStore {
    /// Open or create an index store at the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// # let tmp = tempfile::tempdir().unwrap();
    /// use docmind::IndexStore;
    ///
    /// let store = IndexStore::open(&tmp.path().join("index.redb")).unwrap();
    /// assert!(store.is_empty().unwrap());
    /// ```
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(CHUNKS)?;
        txn.open_table(VECTORS)?;
        txn.open_table(META)?;
        txn.commit()?;

        Ok(Self { db })
    }

    /// Replace the entire store contents in a single transaction.
    ///
    /// Every vector must have the same nonzero dimension.
    pub fn rebuild(
        &self,
        embed_model: &str,
        entries: &[(Chunk, Vec<f32>)],
    ) -> Result<()> {
        let dimension = match entries.first() {
            Some((_, vector)) => vector.len(),
            None => 0,
        };
        for (chunk, vector) in entries {
            if vector.is_empty() || vector.len() != dimension {
                return Err(Error::Config(format!(
                    "inconsistent embedding dimension for chunk {} of {}: \
                     got {}, expected {dimension}",
                    chunk.index,
                    chunk.source,
                    vector.len(),
                )));
            }
        }

        let txn = self.db.begin_write()?;
        txn.delete_table(CHUNKS)?;
        txn.delete_table(VECTORS)?;
        txn.delete_table(META)?;
        {
            let mut chunks = txn.open_table(CHUNKS)?;
            let mut vectors = txn.open_table(VECTORS)?;
            let mut meta = txn.open_table(META)?;

            for (row, (chunk, vector)) in entries.iter().enumerate() {
                let key = row as u64;
                let record = serde_json::to_vec(chunk)?;
                chunks.insert(key, record.as_slice())?;

                let payload = encode_vector(vector);
                vectors.insert(key, payload.as_slice())?;
            }

            if !entries.is_empty() {
                meta.insert(EMBED_MODEL_KEY, embed_model)?;
                meta.insert(DIMENSION_KEY, dimension.to_string().as_str())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// All chunk records in insertion order.
    pub fn all_chunks(&self) -> Result<Vec<Chunk>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CHUNKS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (_, v) = entry?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }

    /// All (chunk, vector) pairs in insertion order.
    pub fn entries(&self) -> Result<Vec<(Chunk, Vec<f32>)>> {
        let txn = self.db.begin_read()?;
        let chunks = txn.open_table(CHUNKS)?;
        let vectors = txn.open_table(VECTORS)?;

        let mut result = Vec::new();
        for entry in chunks.iter()? {
            let (k, v) = entry?;
            let chunk: Chunk = serde_json::from_slice(v.value())?;

            let key = k.value();
            let guard = vectors.get(key)?.ok_or_else(|| {
                Error::Config(format!("missing vector for row {key}"))
            })?;
            result.push((chunk, decode_vector(key, guard.value())?));
        }
        Ok(result)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.chunk_count()? == 0)
    }

    pub fn chunk_count(&self) -> Result<usize> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CHUNKS)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// The embedding model the stored vectors were produced with.
    pub fn embed_model(&self) -> Result<Option<String>> {
        self.meta_get(EMBED_MODEL_KEY)
    }

    /// The dimension of the stored vectors.
    pub fn dimension(&self) -> Result<Option<usize>> {
        match self.meta_get(DIMENSION_KEY)? {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| Error::Config(format!("corrupt dimension: {raw}"))),
            None => Ok(None),
        }
    }

    /// Summary counters for the `status` command.
    pub fn stats(&self) -> Result<StoreStats> {
        let chunks = self.all_chunks()?;
        let mut sources: Vec<&str> =
            chunks.iter().map(|c| c.source.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();

        Ok(StoreStats {
            documents: sources.len(),
            chunks: chunks.len(),
            embed_model: self.embed_model()?,
            dimension: self.dimension()?,
        })
    }

    fn meta_get(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(META)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes =
        Vec::with_capacity(HEADER_SIZE + std::mem::size_of_val(vector));
    bytes.extend_from_slice(&(vector.len() as u32).to_le_bytes());
    bytes.extend_from_slice(bytemuck::cast_slice(vector));
    bytes
}

fn decode_vector(key: u64, bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::Config(format!("corrupt vector entry {key}")));
    }
    let dimension = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

    let expected_len = HEADER_SIZE + (dimension as usize) * 4;
    if bytes.len() != expected_len {
        return Err(Error::Config(format!("corrupt vector entry {key}")));
    }

    Ok(bytemuck::cast_slice(&bytes[HEADER_SIZE..]).to_vec())
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, IndexStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(&tmp.path().join("index.redb")).unwrap();
        (tmp, store)
    }

    fn chunk(source: &str, page: usize, index: usize, text: &str) -> Chunk {
        Chunk {
            source: source.into(),
            page,
            index,
            text: text.into(),
        }
    }

    #[test]
    fn rebuild_and_read_back() {
        let (_tmp, store) = test_store();

        let entries = vec![
            (chunk("a.pdf", 1, 0, "first"), vec![1.0, 0.0]),
            (chunk("a.pdf", 2, 1, "second"), vec![0.0, 1.0]),
        ];
        store.rebuild("all-minilm", &entries).unwrap();

        let chunks = store.all_chunks().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "first");
        assert_eq!(chunks[1].text, "second");

        let read = store.entries().unwrap();
        assert_eq!(read, entries);
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let (_tmp, store) = test_store();

        let first = vec![
            (chunk("a.pdf", 1, 0, "one"), vec![1.0]),
            (chunk("a.pdf", 1, 1, "two"), vec![2.0]),
            (chunk("b.pdf", 1, 0, "three"), vec![3.0]),
        ];
        store.rebuild("all-minilm", &first).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 3);

        let second = vec![(chunk("c.pdf", 1, 0, "only"), vec![4.0])];
        store.rebuild("all-minilm", &second).unwrap();

        assert_eq!(store.chunk_count().unwrap(), 1);
        assert_eq!(store.all_chunks().unwrap()[0].source, "c.pdf");
    }

    #[test]
    fn fresh_store_is_empty() {
        let (_tmp, store) = test_store();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.embed_model().unwrap(), None);
        assert_eq!(store.dimension().unwrap(), None);
    }

    #[test]
    fn meta_records_model_and_dimension() {
        let (_tmp, store) = test_store();

        let entries = vec![(chunk("a.pdf", 1, 0, "x"), vec![0.1, 0.2, 0.3])];
        store.rebuild("all-minilm", &entries).unwrap();

        assert_eq!(store.embed_model().unwrap().as_deref(), Some("all-minilm"));
        assert_eq!(store.dimension().unwrap(), Some(3));
    }

    #[test]
    fn inconsistent_dimension_rejected() {
        let (_tmp, store) = test_store();

        let entries = vec![
            (chunk("a.pdf", 1, 0, "x"), vec![1.0, 2.0]),
            (chunk("a.pdf", 1, 1, "y"), vec![1.0, 2.0, 3.0]),
        ];
        assert!(matches!(
            store.rebuild("all-minilm", &entries),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn stats_counts_distinct_documents() {
        let (_tmp, store) = test_store();

        let entries = vec![
            (chunk("a.pdf", 1, 0, "one"), vec![1.0]),
            (chunk("a.pdf", 2, 1, "two"), vec![2.0]),
            (chunk("b.pdf", 1, 0, "three"), vec![3.0]),
        ];
        store.rebuild("all-minilm", &entries).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.dimension, Some(1));
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("index.redb");

        let err = IndexStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::RedbDatabase(_)));
    }

    #[test]
    fn vector_layout_is_header_plus_payload() {
        let bytes = encode_vector(&[1.0, -2.5, 0.25]);

        assert_eq!(bytes.len(), HEADER_SIZE + 3 * 4);
        assert_eq!(&bytes[..HEADER_SIZE], &3u32.to_le_bytes());
        assert_eq!(decode_vector(0, &bytes).unwrap(), vec![1.0, -2.5, 0.25]);
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.redb");

        {
            let store = IndexStore::open(&path).unwrap();
            let entries = vec![(chunk("a.pdf", 1, 0, "kept"), vec![1.0, 2.0])];
            store.rebuild("all-minilm", &entries).unwrap();
        }

        {
            let store = IndexStore::open(&path).unwrap();
            let read = store.entries().unwrap();
            assert_eq!(read.len(), 1);
            assert_eq!(read[0].0.text, "kept");
            assert_eq!(read[0].1, vec![1.0, 2.0]);
        }
    }
}
