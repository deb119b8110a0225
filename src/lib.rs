//! docmind - a retrieval-augmented study assistant for local PDF collections.
//!
//! docmind extracts the text of PDF files, embeds it into a local vector
//! store, and answers topic queries against the store through an
//! [Ollama](https://ollama.com) server: summaries, free-form answers,
//! quizzes, and concept mindmaps.
//!
//! # Quick start
//!
//! ```no_run
//! use docmind::{Assistant, DataDir, IndexStore, OllamaClient, OllamaConfig};
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let store = IndexStore::open(&data_dir.index_db()).unwrap();
//! let client = OllamaClient::new(OllamaConfig::from_env());
//!
//! let assistant = Assistant::new(&client, &client, &store);
//! println!("{}", assistant.summarize("photosynthesis").unwrap());
//!
//! if let Some(map) = assistant.mindmap("photosynthesis").unwrap() {
//!     println!("root '{}', {} branches", map.label, map.children.len());
//! }
//! ```

pub mod assistant;
pub mod chunking;
pub mod cli;
pub mod data_dir;
pub mod error;
pub mod indexer;
pub mod llm;
pub mod mindmap;
pub mod pdf;
pub mod prompt;
pub mod retriever;
pub mod schema;
pub mod store;

pub use assistant::Assistant;
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use llm::{OllamaClient, OllamaConfig};
pub use schema::{Concept, ConceptSet, MindmapNode, QaPair, Quiz};
pub use store::{Chunk, IndexStore};
