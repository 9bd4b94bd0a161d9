//! Content extractor (4.7): orchestrates one extraction attempt over a prepared body —
//! node cleaning, div normalization, scoring, candidate selection, and sibling merging.

use crate::candidate_selector::{self, Selection};
use crate::constants::{ParseFlags, DEFAULT_TAGS_TO_SCORE};
use crate::dom;
use crate::node_cleaner;
use crate::scoring::{self, ScoreStore};
use crate::sibling_merger;
use kuchikikiki::NodeRef;

pub struct AttemptResult {
    pub container: NodeRef,
    pub text_length: usize,
    pub needed_to_create: bool,
}

/// Run one full extraction attempt against `body` (already document-prepared). `title` is
/// the already-resolved article title, used to drop duplicate headers. `byline` is mutated
/// in place if a byline is found in the body and none was already resolved from metadata.
pub fn run_attempt(
    body: &NodeRef,
    title: &str,
    byline: &mut Option<String>,
    flags: ParseFlags,
    link_density_modifier: f64,
    nb_top_candidates: usize,
    is_rtl: bool,
) -> AttemptResult {
    if flags.contains(ParseFlags::STRIP_UNLIKELYS) {
        node_cleaner::clean_unlikely_and_empty(body, flags);
    } else {
        // Even without STRIP_UNLIKELYS, role/empty-container removal and strict
        // visibility still run every attempt (4.2, 4.7 step 2).
        node_cleaner::clean_unlikely_and_empty(body, ParseFlags::empty());
    }
    remove_strictly_hidden(body);

    let mut store = ScoreStore::new();
    let mut elements_to_score = Vec::new();

    let mut current = body.first_child();
    while let Some(node) = current {
        if node.as_element().is_none() {
            current = dom::get_next_node(&node, body, false);
            continue;
        }

        if byline.is_none() {
            if let Some(extracted) = node_cleaner::extract_byline(&node) {
                *byline = Some(extracted);
                current = dom::remove_and_get_next(&node, body);
                continue;
            }
        }

        if node_cleaner::is_title_duplicate_header(&node, title) {
            current = dom::remove_and_get_next(&node, body);
            continue;
        }

        if is_empty_heading(&node) {
            current = dom::remove_and_get_next(&node, body);
            continue;
        }

        if let Some(tag) = dom::tag_name(&node) {
            if DEFAULT_TAGS_TO_SCORE.contains(&tag.as_str()) {
                elements_to_score.push(node.clone());
            }

            if tag == "DIV" {
                normalize_div(&node, &mut elements_to_score);
            }
        }

        current = dom::get_next_node(&node, body, false);
    }

    for element in &elements_to_score {
        let base = scoring::initialize_node_score(element, flags);
        store.ensure_initialized(element, base);
        let content = scoring::calculate_content_score(element, link_density_modifier);
        if content > 0.0 {
            store.add_to_score(element, content);
            let own_score = store.content_score(element);
            scoring::propagate_score_to_ancestors(&mut store, element, own_score - base);
        }
    }

    let scored: Vec<NodeRef> = elements_to_score;
    let Selection {
        top_candidate,
        needed_to_create,
    } = candidate_selector::select(&mut store, body, &scored, nb_top_candidates);

    let container = sibling_merger::merge(&store, &top_candidate, is_rtl);
    let text_length = crate::utils::char_count(&dom::get_inner_text(&container, true));

    AttemptResult {
        container,
        text_length,
        needed_to_create,
    }
}

fn remove_strictly_hidden(body: &NodeRef) {
    let mut targets = Vec::new();
    for node in body.descendants() {
        if node.as_element().is_some() && dom::is_hidden_strict(&node) {
            targets.push(node);
        }
    }
    for node in targets {
        node.detach();
    }
}

fn is_empty_heading(node: &NodeRef) -> bool {
    matches!(
        dom::tag_name(node).as_deref(),
        Some("H1") | Some("H2") | Some("H3") | Some("H4") | Some("H5") | Some("H6")
    ) && dom::is_element_without_content(node)
}

fn has_container_identity(node: &NodeRef) -> bool {
    dom::get_attr(node, "id").filter(|s| !s.is_empty()).is_some()
        || dom::get_attr(node, "class").filter(|s| !s.is_empty()).is_some()
}

fn has_embedded_media(node: &NodeRef) -> bool {
    for tag in ["img", "video", "audio", "iframe", "embed", "object"] {
        if node.select(tag).map(|mut it| it.next().is_some()).unwrap_or(false) {
            return true;
        }
    }
    false
}

/// 4.7 step 4: normalize a `<div>` in place — group phrasing runs into `<p>`s, collapse a
/// single-paragraph div, or retag a block-free div to `<p>` and mark it for scoring.
fn normalize_div(div: &NodeRef, elements_to_score: &mut Vec<NodeRef>) {
    group_phrasing_runs_into_paragraphs(div);

    if let Some(only_p) = single_paragraph_child(div) {
        let link_density = dom::get_link_density(&only_p);
        if link_density < 0.25 && !has_container_identity(div) && !has_embedded_media(div) {
            dom::replace_node(div, &only_p);
            elements_to_score.push(only_p);
            return;
        }
    }

    if !dom::has_child_block_element(div) && !has_container_identity(div) {
        let renamed = dom::rename_element(div, "p");
        elements_to_score.push(renamed);
    }
}

fn single_paragraph_child(div: &NodeRef) -> Option<NodeRef> {
    let mut elements = div.children().filter(|c| c.as_element().is_some());
    let only = elements.next()?;
    if elements.next().is_some() || !dom::is_tag(&only, "P") {
        return None;
    }
    Some(only)
}

/// Wrap consecutive phrasing-content children (text + inline elements) of `div` in new
/// `<p>` wrappers, skipping leading/trailing whitespace-only runs.
pub(crate) fn group_phrasing_runs_into_paragraphs(div: &NodeRef) {
    let children: Vec<NodeRef> = div.children().collect();
    let mut run: Vec<NodeRef> = Vec::new();

    let flush = |run: &mut Vec<NodeRef>, anchor: &NodeRef| {
        while run.last().map(dom::is_whitespace).unwrap_or(false) {
            run.pop();
        }
        while run.first().map(dom::is_whitespace).unwrap_or(false) {
            run.remove(0);
        }
        if run.is_empty() {
            return;
        }
        let p = dom::new_element("p", vec![]);
        anchor.insert_before(p.clone());
        for node in run.drain(..) {
            node.detach();
            p.append(node);
        }
    };

    for child in children {
        let is_phrasing = child.as_text().is_some() || dom::is_phrasing_content(&child);
        if is_phrasing {
            run.push(child);
        } else {
            flush(&mut run, &child);
        }
    }
    if let Some(last) = run.last().cloned() {
        flush(&mut run, &last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_body(html: &str) -> NodeRef {
        let document = kuchikikiki::parse_html().one(html);
        document.select_first("body").unwrap().as_node().clone()
    }

    #[test]
    fn scores_and_selects_longest_paragraph() {
        let body = parse_body(
            "<div><p>Short bit.</p><p>A considerably longer paragraph, with several commas, \
             intended to score much higher than its sibling in this extraction test.</p></div>",
        );
        let mut byline = None;
        let result = run_attempt(
            &body,
            "Untitled",
            &mut byline,
            ParseFlags::all(),
            0.0,
            5,
            false,
        );
        assert!(result.text_length > 0);
        assert!(result.container.text_contents().contains("considerably longer"));
    }

    #[test]
    fn synthesizes_body_div_when_nothing_scores() {
        let body = parse_body("<span>x</span>");
        let mut byline = None;
        let result = run_attempt(&body, "Untitled", &mut byline, ParseFlags::all(), 0.0, 5, false);
        assert!(result.needed_to_create);
    }

    #[test]
    fn removes_duplicate_title_heading() {
        let body = parse_body("<h1>My Great Article</h1><p>Body text with plenty of content here, repeated for length purposes.</p>");
        let mut byline = None;
        let result = run_attempt(
            &body,
            "My Great Article",
            &mut byline,
            ParseFlags::all(),
            0.0,
            5,
            false,
        );
        assert!(!result.container.text_contents().contains("My Great Article"));
    }

    #[test]
    fn trailing_phrasing_run_keeps_its_text() {
        let body = parse_body("<div>Plain text only</div>");
        group_phrasing_runs_into_paragraphs(body.select_first("div").unwrap().as_node());
        let p = body.select_first("p").expect("trailing run wraps into a <p>");
        assert_eq!(p.as_node().text_contents(), "Plain text only");
    }
}
