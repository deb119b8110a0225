//! Typed records for model output, and the strict parse gate between raw
//! response text and the rest of the pipeline.
//!
//! Every record here doubles as a JSON schema (via [`output_schema`]) that
//! is sent to the model server as a structural constraint on its response.
//! Parsing is all-or-nothing: [`parse_structured`] returns a fully formed
//! value or `None`, never a partially populated one.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A single concept extracted from document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Concept {
    /// Short name of the concept.
    pub name: String,
    /// Plain-English definition of the concept.
    pub definition: String,
}

/// The flat set of concepts extracted from retrieved text.
///
/// Order is the model's output order and carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConceptSet {
    pub concepts: Vec<Concept>,
}

impl ConceptSet {
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }
}

/// One node of a mindmap tree.
///
/// The root is this same shape; "root" is a position, not a type. Each
/// node exclusively owns its children, so the tree is finite and acyclic
/// by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MindmapNode {
    /// Concept name carried by this node.
    pub label: String,
    /// Definition of the concept at this node.
    pub description: String,
    /// Child nodes, possibly empty.
    #[serde(default)]
    pub children: Vec<MindmapNode>,
}

impl MindmapNode {
    /// A childless node.
    pub fn leaf(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            children: Vec::new(),
        }
    }
}

/// A quiz question together with its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// A generated quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Quiz {
    pub questions: Vec<QaPair>,
}

/// JSON schema for `T`, in the form the model server accepts as a
/// response-format constraint.
pub fn output_schema<T: JsonSchema>() -> serde_json::Value {
    schemars::schema_for!(T).to_value()
}

/// Strictly parse raw model output as JSON matching `T`.
///
/// Returns `None` on any syntactic or structural mismatch. This absence is
/// the only malformation signal the pipeline emits; callers treat it as
/// "regenerate or abort", never as partial data.
///
/// # Examples
///
/// ```
/// use docmind::schema::{parse_structured, Quiz};
///
/// let quiz: Option<Quiz> =
///     parse_structured(r#"{"questions":[{"question":"Q","answer":"A"}]}"#);
/// assert_eq!(quiz.unwrap().questions.len(), 1);
///
/// let bad: Option<Quiz> = parse_structured("{\"questions\":[{\"ques");
/// assert!(bad.is_none());
/// ```
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!("structured response rejected: {err}");
            None
        }
    }
}
