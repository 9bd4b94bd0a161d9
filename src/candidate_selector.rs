//! Candidate selector (4.8): picks the top-scoring candidate from the scored elements
//! produced by the content extractor, resolving ties and near-ties onto a shared ancestor.

use crate::dom;
use crate::scoring::ScoreStore;
use kuchikikiki::NodeRef;

pub struct Selection {
    pub top_candidate: NodeRef,
    pub needed_to_create: bool,
}

/// Collect every scored element into a bounded top-N set, scaling each score by
/// `(1 - link_density)` and writing the scaled score back (Mozilla parity).
fn top_candidates(store: &mut ScoreStore, scored: &[NodeRef], nb_top_candidates: usize) -> Vec<NodeRef> {
    let mut scaled: Vec<(NodeRef, f64)> = Vec::new();
    for node in scored {
        if !store.is_initialized(node) {
            continue;
        }
        let link_density = dom::get_link_density(node);
        let scaled_score = store.content_score(node) * (1.0 - link_density);
        store.set_content_score(node, scaled_score);
        scaled.push((node.clone(), scaled_score));
    }
    scaled.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scaled.truncate(nb_top_candidates.max(1));
    scaled.into_iter().map(|(n, _)| n).collect()
}

/// Move all of `body`'s child nodes into a fresh `<div>`, used when no element scored.
fn synthesize_body_candidate(body: &NodeRef) -> NodeRef {
    let container = dom::new_element("div", vec![]);
    while let Some(child) = body.first_child() {
        child.detach();
        container.append(child);
    }
    body.append(container.clone());
    container
}

/// If ≥3 other candidates score within 75% of the best, pick the ancestor shared by at
/// least 3 of their ancestor lists (walking up from the best), skipping `<body>`.
fn alternative_ancestor(store: &ScoreStore, best: &NodeRef, others: &[NodeRef]) -> Option<NodeRef> {
    let best_score = store.content_score(best);
    let strong_rivals: Vec<&NodeRef> = others
        .iter()
        .filter(|n| dom::node_identity(n) != dom::node_identity(best))
        .filter(|n| store.content_score(n) >= best_score * 0.75)
        .collect();

    if strong_rivals.len() < 3 {
        return None;
    }

    let rival_ancestors: Vec<Vec<dom::NodePath>> = strong_rivals
        .iter()
        .map(|n| {
            dom::get_node_ancestors(n, 0)
                .iter()
                .map(dom::node_identity)
                .collect()
        })
        .collect();

    for ancestor in dom::get_node_ancestors(best, 0) {
        if dom::is_tag(&ancestor, "BODY") {
            break;
        }
        let key = dom::node_identity(&ancestor);
        let count = rival_ancestors.iter().filter(|list| list.contains(&key)).count();
        if count >= 3 {
            return Some(ancestor);
        }
    }

    None
}

/// Walk up while the parent is initialized and scores at least a third of the top
/// candidate, moving up only when the parent's score strictly exceeds the current node's.
fn parent_score_traversal(store: &ScoreStore, start: &NodeRef) -> NodeRef {
    let mut current = start.clone();
    loop {
        let Some(parent) = current.parent() else { break };
        if dom::is_tag(&parent, "BODY") || !store.is_initialized(&parent) {
            break;
        }
        let current_score = store.content_score(&current);
        let top_score = store.content_score(start);
        if store.content_score(&parent) < top_score / 3.0 {
            break;
        }
        if store.content_score(&parent) > current_score {
            current = parent;
        } else {
            break;
        }
    }
    current
}

fn count_element_children(node: &NodeRef) -> usize {
    node.children().filter(|c| c.as_element().is_some()).count()
}

/// While the candidate's parent has exactly one element child, promote to the parent.
fn single_child_promotion(node: &NodeRef) -> NodeRef {
    let mut current = node.clone();
    loop {
        let Some(parent) = current.parent() else { break };
        if dom::is_tag(&parent, "BODY") {
            break;
        }
        if count_element_children(&parent) != 1 {
            break;
        }
        current = parent;
    }
    current
}

/// Select the top candidate from the scored element set (4.8).
pub fn select(
    store: &mut ScoreStore,
    body: &NodeRef,
    scored: &[NodeRef],
    nb_top_candidates: usize,
) -> Selection {
    let candidates = top_candidates(store, scored, nb_top_candidates);

    let Some(best) = candidates.first().cloned() else {
        return Selection {
            top_candidate: synthesize_body_candidate(body),
            needed_to_create: true,
        };
    };

    let promoted = alternative_ancestor(store, &best, &candidates).unwrap_or(best);
    let promoted = parent_score_traversal(store, &promoted);
    let promoted = single_child_promotion(&promoted);

    Selection {
        top_candidate: promoted,
        needed_to_create: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ParseFlags;
    use crate::scoring;

    fn parse_body(html: &str) -> NodeRef {
        let document = kuchikikiki::parse_html().one(html);
        document.select_first("body").unwrap().as_node().clone()
    }

    #[test]
    fn falls_back_to_synthesized_body_div_when_nothing_scored() {
        let body = parse_body("<span>tiny</span>");
        let mut store = ScoreStore::new();
        let selection = select(&mut store, &body, &[], 5);
        assert!(selection.needed_to_create);
        assert!(dom::is_tag(&selection.top_candidate, "DIV"));
    }

    #[test]
    fn picks_highest_scoring_initialized_candidate() {
        let body = parse_body(
            "<div><p id=\"a\">Short</p><p id=\"b\">A much longer paragraph with several, commas, in it, to raise the score considerably above the short one.</p></div>",
        );
        let mut store = ScoreStore::new();
        let flags = ParseFlags::WEIGHT_CLASSES;
        let mut scored = Vec::new();
        for p in body.select("p").unwrap() {
            let node = p.as_node().clone();
            let base = scoring::initialize_node_score(&node, flags);
            store.ensure_initialized(&node, base);
            let content = scoring::calculate_content_score(&node, 0.0);
            store.add_to_score(&node, content);
            scored.push(node);
        }

        let selection = select(&mut store, &body, &scored, 5);
        assert_eq!(dom::get_attr(&selection.top_candidate, "id").as_deref(), Some("b"));
    }
}
