//! Sibling merger (4.9): builds the final article container from the top candidate and
//! whichever of its siblings look like they belong to the same article.

use crate::constants::ALTER_TO_DIV_EXCEPTIONS;
use crate::dom;
use crate::scoring::ScoreStore;
use kuchikikiki::NodeRef;

fn has_sentence_boundary(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?', '\u{3002}', '\u{ff01}', '\u{ff1f}'])
}

fn is_good_sibling_paragraph(node: &NodeRef) -> bool {
    if !dom::is_tag(node, "P") {
        return false;
    }
    let text = dom::get_inner_text(node, true);
    let len = crate::utils::char_count(&text);
    let link_density = dom::get_link_density(node);

    (len > 80 && link_density < 0.25) || (len > 0 && len <= 80 && link_density == 0.0 && has_sentence_boundary(&text))
}

fn shares_class(a: &NodeRef, b: &NodeRef) -> bool {
    let (ca, cb) = (dom::get_attr(a, "class"), dom::get_attr(b, "class"));
    match (ca, cb) {
        (Some(ca), Some(cb)) if !ca.trim().is_empty() => {
            let set_b: std::collections::HashSet<&str> = cb.split_whitespace().collect();
            ca.split_whitespace().any(|c| set_b.contains(c))
        }
        _ => false,
    }
}

/// Rewrap `node` as a `<div>` unless its tag is already in the alter-to-div exceptions.
fn rewrap_as_div(node: &NodeRef) -> NodeRef {
    let tag = dom::tag_name(node).unwrap_or_default().to_lowercase();
    if ALTER_TO_DIV_EXCEPTIONS.contains(&tag.as_str()) {
        node.clone()
    } else {
        dom::rename_element(node, "div")
    }
}

fn is_pure_paragraph_wrapper(node: &NodeRef) -> bool {
    node.children()
        .filter(|c| c.as_element().is_some())
        .all(|c| dom::is_tag(&c, "P"))
}

/// Build the article container (4.9). `is_rtl` suppresses the trailing anonymous-wrapper
/// unwrap step, matching the reference's RTL carve-out.
pub fn merge(store: &ScoreStore, top_candidate: &NodeRef, is_rtl: bool) -> NodeRef {
    let container = dom::new_element("div", vec![]);
    dom::set_attr(&container, "id", "readability-content");

    let top_score = store.content_score(top_candidate);
    let threshold = (top_score * 0.2).max(10.0);

    let parent = top_candidate.parent();
    let siblings: Vec<NodeRef> = match &parent {
        Some(p) => p.children().collect(),
        None => vec![top_candidate.clone()],
    };

    for sibling in siblings {
        let is_top = dom::node_identity(&sibling) == dom::node_identity(top_candidate);

        let include = if is_top {
            true
        } else if sibling.as_element().is_none() {
            false
        } else {
            let sibling_score = store.content_score(&sibling);
            let class_bonus = if shares_class(&sibling, top_candidate) {
                top_score * 0.2
            } else {
                0.0
            };
            if sibling_score + class_bonus >= threshold {
                true
            } else {
                is_good_sibling_paragraph(&sibling)
            }
        };

        if !include {
            continue;
        }

        sibling.detach();
        let appended = if is_top {
            sibling
        } else {
            rewrap_as_div(&sibling)
        };
        container.append(appended);
    }

    // Unwrap a single anonymous, no-attribute div child unless it's a pure-paragraph
    // wrapper, contains a table, or the article is RTL.
    if !is_rtl {
        let element_children: Vec<NodeRef> =
            container.children().filter(|c| c.as_element().is_some()).collect();
        if element_children.len() == 1 {
            let only = &element_children[0];
            let anonymous = dom::is_tag(only, "DIV")
                && dom::get_attr(only, "id").is_none()
                && dom::get_attr(only, "class").is_none();
            let has_table = only.select("table").map(|mut it| it.next().is_some()).unwrap_or(false);
            if anonymous && !is_pure_paragraph_wrapper(only) && !has_table {
                while let Some(child) = only.first_child() {
                    child.detach();
                    container.append(child);
                }
                only.detach();
            }
        }
    }

    container
}
