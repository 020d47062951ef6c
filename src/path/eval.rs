//! Compiled-path evaluator.
//!
//! Evaluation is a breadth-first traversal guided by a compiled
//! [`Path`](super::Path). A work queue holds `(element, next segment)`
//! pairs; popping a pair evaluates one segment against one element. When
//! the popped pair's segment is the last one, the segment's candidates
//! merge into the result set; otherwise each candidate re-enters the queue
//! with the following segment. The result keeps elements in the order they
//! first arrived and never holds the same element twice.
//!
//! Evaluation cannot fail: every malformed construct is rejected at
//! compile time, and a path that matches nothing yields an empty list.
//! The tree is never mutated -- the whole traversal runs on `&Document`.

use std::collections::VecDeque;

use crate::tree::{space_match, Document, NodeId};

use super::candidates::CandidateSet;
use super::parser::{Filter, FilterExpr, QueryFn, Segment, SegmentExpr, Selector};

/// An element paired with the index of the next segment to apply to it.
struct QueueNode {
    element: NodeId,
    segment: usize,
}

/// Evaluates a compiled segment list against `start`, returning matching
/// elements in breadth-first first-arrival order, deduplicated by element
/// identity.
pub(crate) fn evaluate(doc: &Document, start: NodeId, segments: &[Segment]) -> Vec<NodeId> {
    debug_assert!(!segments.is_empty(), "a compiled path has segments");

    let mut results = CandidateSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(QueueNode {
        element: start,
        segment: 0,
    });

    while let Some(node) = queue.pop_front() {
        let candidates = eval_segment(doc, node.element, &segments[node.segment]);
        if node.segment + 1 == segments.len() {
            results.merge(candidates.into_vec());
        } else {
            for element in candidates.into_vec() {
                queue.push_back(QueueNode {
                    element,
                    segment: node.segment + 1,
                });
            }
        }
    }

    results.into_vec()
}

/// Evaluates one segment against one element: each union branch runs its
/// selector, narrows through its filters in order, and the branches'
/// outputs merge in evaluation order.
fn eval_segment(doc: &Document, element: NodeId, segment: &Segment) -> CandidateSet {
    let mut merged = CandidateSet::new();
    for expr in &segment.exprs {
        merged.merge(eval_segment_expr(doc, element, expr));
    }
    merged
}

fn eval_segment_expr(doc: &Document, element: NodeId, expr: &SegmentExpr) -> Vec<NodeId> {
    let mut candidates = apply_selector(doc, element, &expr.selector);
    for filter in &expr.filters {
        if candidates.is_empty() {
            break;
        }
        candidates = apply_filter(doc, &candidates, filter);
    }
    candidates
}

/// Produces a selector's candidate list. Child and descendant selectors
/// consider only element-typed children; text, comments, directives, and
/// processing instructions are skipped transparently.
fn apply_selector(doc: &Document, element: NodeId, selector: &Selector) -> Vec<NodeId> {
    match selector {
        Selector::Root => {
            let mut top = element;
            while let Some(parent) = doc.parent(top) {
                top = parent;
            }
            vec![top]
        }
        Selector::Current => vec![element],
        Selector::Parent => doc.parent(element).into_iter().collect(),
        Selector::AllChildren => doc.child_elements(element).collect(),
        Selector::ChildrenByTag { space, tag } => doc
            .child_elements(element)
            .filter(|&c| space_match(space, doc.namespace_prefix(c)) && doc.tag(c) == tag)
            .collect(),
        Selector::Descendants => {
            // Self first, then level by level.
            let mut out = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back(element);
            while let Some(e) = queue.pop_front() {
                out.push(e);
                queue.extend(doc.child_elements(e));
            }
            out
        }
    }
}

/// Applies one filter to a candidate list: the union of each filter
/// expression's accepted subset, in expression order, deduplicated.
fn apply_filter(doc: &Document, candidates: &[NodeId], filter: &Filter) -> Vec<NodeId> {
    let mut accepted = CandidateSet::new();
    for expr in &filter.exprs {
        match expr {
            FilterExpr::Index(index) => {
                if let Some(id) = index_select(candidates, *index) {
                    accepted.add(id);
                }
            }
            _ => {
                for &c in candidates {
                    if accepts(doc, c, expr) {
                        accepted.add(c);
                    }
                }
            }
        }
    }
    accepted.into_vec()
}

/// Resolves a positional filter against a candidate list. Non-negative
/// indices count from the front, negative ones from the end; anything out
/// of range selects nothing.
#[allow(clippy::cast_sign_loss)]
fn index_select(candidates: &[NodeId], index: isize) -> Option<NodeId> {
    let resolved = if index < 0 {
        index.checked_add_unsigned(candidates.len())?
    } else {
        index
    };
    if resolved < 0 {
        return None;
    }
    candidates.get(resolved as usize).copied()
}

/// Reports whether a single candidate passes a non-positional filter
/// expression.
fn accepts(doc: &Document, candidate: NodeId, expr: &FilterExpr) -> bool {
    match expr {
        FilterExpr::Index(_) => unreachable!("positional filters are applied to the whole list"),
        FilterExpr::HasAttr { space, key } => doc
            .attributes(candidate)
            .iter()
            .any(|a| space_match(space, a.namespace_prefix()) && a.name == *key),
        FilterExpr::AttrEquals { space, key, value } => doc
            .attributes(candidate)
            .iter()
            .any(|a| space_match(space, a.namespace_prefix()) && a.name == *key && a.value == *value),
        FilterExpr::HasChildTag { space, tag } => doc
            .child_elements(candidate)
            .any(|c| space_match(space, doc.namespace_prefix(c)) && doc.tag(c) == tag),
        FilterExpr::ChildTagTextEquals { space, tag, value } => {
            doc.child_elements(candidate).any(|c| {
                space_match(space, doc.namespace_prefix(c))
                    && doc.tag(c) == tag
                    && doc.text(c) == *value
            })
        }
        FilterExpr::FuncExists(func) => !func_value(doc, candidate, *func).is_empty(),
        FilterExpr::FuncEquals(func, value) => func_value(doc, candidate, *func) == *value,
    }
}

/// Computes the string a function filter's accessor yields for an element.
fn func_value(doc: &Document, element: NodeId, func: QueryFn) -> String {
    match func {
        QueryFn::LocalName => doc.tag(element).to_string(),
        QueryFn::FullName => doc.full_tag(element),
        QueryFn::NamespacePrefix => doc.namespace_prefix(element).to_string(),
        QueryFn::NamespaceUri => doc.namespace_uri(element).to_string(),
        QueryFn::Text => doc.text(element),
    }
}
