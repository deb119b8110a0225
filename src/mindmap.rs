//! Concept extraction and concept-to-mindmap reduction.
//!
//! The reduction step has the one nontrivial contract in the pipeline: the
//! returned tree must be a reorganization of exactly the input concepts.
//! The instruction text forbids inventing or dropping concepts, but models
//! drift, so the contract is also enforced here after parsing: the
//! multiset of labels in the tree must equal the multiset of input concept
//! names, and any mismatch discards the tree.
//!
//! Hard failures (transport, serving errors) surface as `Err`; a response
//! that parses badly or breaks the preservation contract is `Ok(None)`.

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompt;
use crate::schema::{parse_structured, ConceptSet, MindmapNode};
use crate::store::Chunk;

/// Ask the model to enumerate the concepts found in the given chunks.
///
/// Duplicates and near-duplicates pass through untouched; there is no
/// semantic validation beyond the schema shape.
pub fn extract_concepts(
    model: &dyn LanguageModel,
    chunks: &[Chunk],
) -> Result<Option<ConceptSet>> {
    let request = prompt::extract_concepts(chunks);
    let raw = model.invoke(&request)?;
    Ok(parse_structured(&raw))
}

/// Ask the model to reorganize `concepts` into a single rooted tree.
///
/// An empty concept set has no meaningful mindmap; it returns `None`
/// without invoking the model. A single concept yields a degenerate tree
/// with a root and no children.
pub fn build_mindmap(
    model: &dyn LanguageModel,
    concepts: &ConceptSet,
) -> Result<Option<MindmapNode>> {
    if concepts.is_empty() {
        return Ok(None);
    }

    let request = prompt::build_mindmap(concepts)?;
    let raw = model.invoke(&request)?;

    let Some(tree) = parse_structured::<MindmapNode>(&raw) else {
        return Ok(None);
    };

    if !preserves_concepts(&tree, concepts) {
        tracing::warn!(
            "mindmap does not preserve the concept set; discarding it"
        );
        return Ok(None);
    }

    Ok(Some(tree))
}

/// All labels in the tree, root first, depth first.
pub fn labels(node: &MindmapNode) -> Vec<&str> {
    let mut out = Vec::new();
    collect_labels(node, &mut out);
    out
}

fn collect_labels<'a>(node: &'a MindmapNode, out: &mut Vec<&'a str>) {
    out.push(node.label.as_str());
    for child in &node.children {
        collect_labels(child, out);
    }
}

/// Whether the tree's labels are exactly the input concept names, counted
/// with multiplicity.
fn preserves_concepts(tree: &MindmapNode, concepts: &ConceptSet) -> bool {
    let mut tree_labels = labels(tree);
    let mut names: Vec<&str> = concepts
        .concepts
        .iter()
        .map(|concept| concept.name.as_str())
        .collect();

    tree_labels.sort_unstable();
    names.sort_unstable();
    tree_labels == names
}
