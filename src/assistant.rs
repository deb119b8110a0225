//! The four user-facing actions, each one retrieval pass plus one model
//! pipeline.
//!
//! Every action is a single blocking call chain with exactly one model
//! invocation; the mindmap path issues two, strictly in sequence, since
//! the reduction depends on the extraction's output.

use crate::error::Result;
use crate::llm::{Embedder, LanguageModel};
use crate::mindmap;
use crate::prompt;
use crate::retriever::{self, DEFAULT_TOP_K};
use crate::schema::{parse_structured, MindmapNode, Quiz};
use crate::store::{Chunk, IndexStore};

/// Wires the retriever, the model client, and the store together behind
/// the four entry points the CLI exposes.
pub struct Assistant<'a> {
    model: &'a dyn LanguageModel,
    embedder: &'a dyn Embedder,
    store: &'a IndexStore,
    top_k: usize,
}

impl<'a> Assistant<'a> {
    pub fn new(
        model: &'a dyn LanguageModel,
        embedder: &'a dyn Embedder,
        store: &'a IndexStore,
    ) -> Self {
        Self {
            model,
            embedder,
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override the number of chunks retrieved per action.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Summarize what the indexed documents say about `topic`.
    pub fn summarize(&self, topic: &str) -> Result<String> {
        let chunks = self.retrieve(topic)?;
        self.model.invoke(&prompt::summarize(&chunks))
    }

    /// Answer a free-form question from the indexed documents.
    pub fn answer(&self, query: &str) -> Result<String> {
        let chunks = self.retrieve(query)?;
        self.model.invoke(&prompt::answer(query, &chunks))
    }

    /// Generate a quiz about `topic`; `None` when the model's output does
    /// not parse as a quiz.
    pub fn quiz(&self, topic: &str) -> Result<Option<Quiz>> {
        let chunks = self.retrieve(topic)?;
        let raw = self.model.invoke(&prompt::quiz(topic, &chunks))?;
        Ok(parse_structured(&raw))
    }

    /// Build a mindmap of the concepts found for `topic`; `None` when
    /// extraction or reduction fails.
    pub fn mindmap(&self, topic: &str) -> Result<Option<MindmapNode>> {
        let chunks = self.retrieve(topic)?;
        let Some(concepts) = mindmap::extract_concepts(self.model, &chunks)?
        else {
            return Ok(None);
        };
        tracing::debug!("extracted {} concepts", concepts.len());
        mindmap::build_mindmap(self.model, &concepts)
    }

    fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        retriever::retrieve(self.embedder, self.store, query, self.top_k)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;
    use crate::error::Error;
    use crate::llm::ChatRequest;

    /// Replays scripted responses and records every request it sees.
    struct ScriptedModel {
        responses: RefCell<VecDeque<String>>,
        requests: RefCell<Vec<ChatRequest>>,
        calls: Cell<usize>,
    }

    impl ScriptedModel {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: RefCell::new(
                    responses.iter().map(|r| r.to_string()).collect(),
                ),
                requests: RefCell::new(Vec::new()),
                calls: Cell::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.get()
        }

        fn request(&self, index: usize) -> ChatRequest {
            self.requests.borrow()[index].clone()
        }
    }

    impl LanguageModel for ScriptedModel {
        fn invoke(&self, request: &ChatRequest) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| Error::Request("no scripted response".into()))
        }
    }

    /// Scores "alpha"-flavored text close to the fixed query vector.
    struct StubEmbedder;

    impl Embedder for StubEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("alpha") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk {
            source: "notes.pdf".into(),
            page: 1,
            index: 0,
            text: text.into(),
        }
    }

    fn seeded_store() -> (tempfile::TempDir, IndexStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(&tmp.path().join("index.redb")).unwrap();
        store
            .rebuild(
                "all-minilm",
                &[
                    (chunk("alpha context line"), vec![1.0, 0.0]),
                    (chunk("unrelated beta line"), vec![0.0, 1.0]),
                ],
            )
            .unwrap();
        (tmp, store)
    }

    #[test]
    fn summarize_feeds_best_chunk_into_the_instruction() {
        let (_tmp, store) = seeded_store();
        let model = ScriptedModel::new(&["A short summary."]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store).with_top_k(1);

        let summary = assistant.summarize("alpha things").unwrap();
        assert_eq!(summary, "A short summary.");

        let request = model.request(0);
        assert!(request.system.contains("alpha context line"));
        assert!(!request.system.contains("unrelated beta line"));
        assert!(request.format.is_none());
    }

    #[test]
    fn answer_sends_the_question_as_user_message() {
        let (_tmp, store) = seeded_store();
        let model = ScriptedModel::new(&["因为 it is."]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store);

        let reply = assistant.answer("why alpha?").unwrap();
        assert_eq!(reply, "因为 it is.");
        assert_eq!(model.request(0).user.as_deref(), Some("why alpha?"));
    }

    #[test]
    fn quiz_parses_schema_constrained_output() {
        let (_tmp, store) = seeded_store();
        let model = ScriptedModel::new(&[
            r#"{"questions":[{"question":"What is alpha?","answer":"The first."}]}"#,
        ]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store);

        let quiz = assistant.quiz("alpha").unwrap().unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert!(model.request(0).format.is_some());
    }

    #[test]
    fn quiz_malformed_output_is_absent() {
        let (_tmp, store) = seeded_store();
        let model = ScriptedModel::new(&["no quiz today"]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store);

        assert!(assistant.quiz("alpha").unwrap().is_none());
    }

    #[test]
    fn mindmap_runs_extraction_then_reduction() {
        let (_tmp, store) = seeded_store();
        let model = ScriptedModel::new(&[
            r#"{"concepts":[
                {"name":"Alpha","definition":"The first letter."},
                {"name":"Beta","definition":"The second letter."}
            ]}"#,
            r#"{"label":"Alpha","description":"The first letter.","children":[
                {"label":"Beta","description":"The second letter.","children":[]}
            ]}"#,
        ]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store);

        let tree = assistant.mindmap("alpha").unwrap().unwrap();
        assert_eq!(tree.label, "Alpha");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(model.calls(), 2, "extraction then reduction");
    }

    #[test]
    fn mindmap_stops_after_failed_extraction() {
        let (_tmp, store) = seeded_store();
        let model = ScriptedModel::new(&["not a concept set"]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store);

        assert!(assistant.mindmap("alpha").unwrap().is_none());
        assert_eq!(model.calls(), 1, "reduction must not run");
    }

    #[test]
    fn actions_fail_on_an_empty_index() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(&tmp.path().join("index.redb")).unwrap();
        let model = ScriptedModel::new(&[]);
        let assistant = Assistant::new(&model, &StubEmbedder, &store);

        assert!(matches!(
            assistant.summarize("anything"),
            Err(Error::EmptyIndex)
        ));
        assert_eq!(model.calls(), 0);
    }
}
