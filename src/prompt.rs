//! Prompt assembly for the five model tasks.
//!
//! Retrieved context is joined chunk-by-chunk with a single space, with no
//! deduplication, truncation, or token accounting. Behavioral constraints
//! (no hallucination, no invented concepts, formatting rules) are plain
//! directives in the instruction text; enforcement happens after the fact
//! in [`crate::schema::parse_structured`] and the mindmap post-check.

use crate::error::Result;
use crate::llm::ChatRequest;
use crate::schema::{output_schema, ConceptSet, MindmapNode, Quiz};
use crate::store::Chunk;

/// Sampling temperature for summaries, answers, and quizzes.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Sampling temperature for concept extraction and mindmap assembly.
pub const CONCEPT_TEMPERATURE: f32 = 0.8;

/// Join chunk texts into one context block, separated by single spaces.
pub fn context_block(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Instruction to summarize the retrieved context.
pub fn summarize(chunks: &[Chunk]) -> ChatRequest {
    let system = format!(
        "You are a helpful assistant that summarizes long documents. Read \
         the given text, and summarize accurately. Do not hallucinate. Do \
         not give inconsistent summaries. Keep the summary concise and \
         reflective of the given text. Give ONLY the summary. Here are \
         retrieved chunks from the document: {}",
        context_block(chunks)
    );

    ChatRequest {
        system,
        user: None,
        format: None,
        temperature: DEFAULT_TEMPERATURE,
    }
}

/// Instruction to answer a free-form question; the question rides along as
/// the user message.
pub fn answer(query: &str, chunks: &[Chunk]) -> ChatRequest {
    let system = format!(
        "You are a helpful assistant that answers questions based on the \
         given text. Read the given text, and answer the question \
         accurately. Do not hallucinate. Do not give inconsistent answers. \
         Give ONLY the answer. Here are retrieved chunks from the \
         document: {}",
        context_block(chunks)
    );

    ChatRequest {
        system,
        user: Some(query.to_string()),
        format: None,
        temperature: DEFAULT_TEMPERATURE,
    }
}

/// Instruction to generate a quiz bound to a topic, constrained to the
/// [`Quiz`] schema.
pub fn quiz(topic: &str, chunks: &[Chunk]) -> ChatRequest {
    let system = format!(
        "You are a helpful assistant that generates a quiz based on the \
         given text. Read the given text, and generate a quiz accurately. \
         Do not hallucinate. Make sure the quiz questions are related to \
         the topic. Give ONLY the quiz. The quiz topic is: {topic}. Here \
         are retrieved chunks from the document: {}",
        context_block(chunks)
    );

    ChatRequest {
        system,
        user: None,
        format: Some(output_schema::<Quiz>()),
        temperature: DEFAULT_TEMPERATURE,
    }
}

/// Instruction to enumerate concepts found in the retrieved context,
/// constrained to the [`ConceptSet`] schema.
///
/// The ASCII-only rules exist because downstream structural parsing is
/// fragile against escape sequences and math notation.
pub fn extract_concepts(chunks: &[Chunk]) -> ChatRequest {
    let system = format!(
        "You are a helpful assistant that extracts concepts from the given \
         text. Read the given text, and extract concepts ACCURATELY. \
         Extract AS MANY concepts as possible. Do not hallucinate. Do not \
         give inconsistent concepts. Here are retrieved chunks from the \
         document: {}\n\n\
         Rules:\n\
         - Use plain ASCII characters only\n\
         - Do NOT use backslashes (\\)\n\
         - Do NOT use LaTeX or math symbols\n\
         - Do NOT escape characters\n\
         - Write definitions in plain English",
        context_block(chunks)
    );

    ChatRequest {
        system,
        user: None,
        format: Some(output_schema::<ConceptSet>()),
        temperature: CONCEPT_TEMPERATURE,
    }
}

/// Instruction to rearrange the given concepts into a single tree,
/// constrained to the [`MindmapNode`] schema.
///
/// The concepts are serialized one JSON object per line so the model sees
/// name and definition side by side.
pub fn build_mindmap(concepts: &ConceptSet) -> Result<ChatRequest> {
    let system = format!(
        "You are a helpful assistant that organizes concepts into a \
         mindmap. Read the given concepts, and arrange them into a mindmap \
         in the form of a TREE.\n\
         - The concepts are given one per line as JSON\n\
         - ONLY REARRANGE THESE CONCEPTS INTO A TREE, DO NOT CREATE NEW \
         CONCEPTS\n\
         - label is the concept name\n\
         - description is the concept definition\n\
         - children is the list of child concepts\n\
         - Do NOT hallucinate\n\
         - Do NOT give inconsistent mindmaps\n\
         - Do NOT create any concepts not provided\n\n\
         Here are the concepts:\n{}",
        concept_lines(concepts)?
    );

    Ok(ChatRequest {
        system,
        user: None,
        format: Some(output_schema::<MindmapNode>()),
        temperature: CONCEPT_TEMPERATURE,
    })
}

/// Serialize a concept set one JSON object per line.
fn concept_lines(concepts: &ConceptSet) -> Result<String> {
    let mut lines = Vec::with_capacity(concepts.len());
    for concept in &concepts.concepts {
        lines.push(serde_json::to_string(concept)?);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Concept;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            source: "notes.pdf".into(),
            page: 1,
            index: 0,
            text: text.into(),
        }
    }

    fn two_concepts() -> ConceptSet {
        ConceptSet {
            concepts: vec![
                Concept {
                    name: "Linear regression".into(),
                    definition: "Predicts a continuous value.".into(),
                },
                Concept {
                    name: "Gradient descent".into(),
                    definition: "Minimizes a cost function.".into(),
                },
            ],
        }
    }

    #[test]
    fn context_joined_with_single_space() {
        let chunks = vec![chunk("alpha beta"), chunk("gamma"), chunk("delta")];
        assert_eq!(context_block(&chunks), "alpha beta gamma delta");
    }

    #[test]
    fn summarize_is_system_only_free_text() {
        let request = summarize(&[chunk("entropy measures surprise")]);
        assert!(request.system.contains("entropy measures surprise"));
        assert!(request.system.contains("Give ONLY the summary"));
        assert!(request.user.is_none());
        assert!(request.format.is_none());
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn answer_carries_query_as_user_message() {
        let request = answer("What is entropy?", &[chunk("context text")]);
        assert_eq!(request.user.as_deref(), Some("What is entropy?"));
        assert!(request.system.contains("context text"));
        assert!(request.format.is_none());
    }

    #[test]
    fn quiz_binds_topic_and_schema() {
        let request = quiz("Thermodynamics", &[chunk("heat flows")]);
        assert!(request.system.contains("The quiz topic is: Thermodynamics."));
        assert!(request.format.is_some());
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn extraction_states_the_ascii_rules() {
        let request = extract_concepts(&[chunk("some text")]);
        assert!(request.system.contains("Extract AS MANY concepts"));
        assert!(request.system.contains("plain ASCII"));
        assert!(request.system.contains("Do NOT use LaTeX"));
        assert!(request.format.is_some());
        assert_eq!(request.temperature, CONCEPT_TEMPERATURE);
    }

    #[test]
    fn mindmap_serializes_one_concept_per_line() {
        let request = build_mindmap(&two_concepts()).unwrap();
        assert!(request.system.contains("DO NOT CREATE NEW CONCEPTS"));
        assert_eq!(request.temperature, CONCEPT_TEMPERATURE);

        let lines: Vec<&str> = request
            .system
            .lines()
            .filter(|line| line.starts_with('{'))
            .collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: Concept = serde_json::from_str(line).unwrap();
            assert!(!parsed.name.is_empty());
        }
    }

    #[test]
    fn mindmap_escapes_awkward_definitions() {
        let concepts = ConceptSet {
            concepts: vec![Concept {
                name: "Quote".into(),
                definition: "Text with \"quotes\" and a \\ backslash.".into(),
            }],
        };
        let request = build_mindmap(&concepts).unwrap();

        let line = request
            .system
            .lines()
            .find(|line| line.starts_with('{'))
            .unwrap();
        let parsed: Concept = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.definition, "Text with \"quotes\" and a \\ backslash.");
    }
}
