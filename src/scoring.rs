//! Content scoring algorithms for determining article quality (4.6), plus the scoring
//! store that associates a score with a node's structural identity across one attempt.

use crate::constants::{ParseFlags, REGEXPS};
use crate::dom::{self, NodePath};
use kuchikikiki::NodeRef;
use std::collections::HashMap;

/// A node's scoring record: content score plus whether it has been touched by the
/// initializer. Only elements the initializer has visited are ever promoted to candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreRecord {
    pub content_score: f64,
    pub initialized: bool,
}

/// Per-attempt scoring store, keyed by structural node identity. Created empty at the start
/// of each extraction attempt and discarded at attempt end.
#[derive(Debug, Default)]
pub struct ScoreStore {
    scores: HashMap<NodePath, ScoreRecord>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &NodeRef) -> Option<ScoreRecord> {
        self.scores.get(&dom::node_identity(node)).copied()
    }

    pub fn is_initialized(&self, node: &NodeRef) -> bool {
        self.get(node).map(|r| r.initialized).unwrap_or(false)
    }

    pub fn content_score(&self, node: &NodeRef) -> f64 {
        self.get(node).map(|r| r.content_score).unwrap_or(0.0)
    }

    /// Initialize `node`'s score to `base` if it has not been touched yet; returns the
    /// resulting record either way.
    pub fn ensure_initialized(&mut self, node: &NodeRef, base: f64) -> ScoreRecord {
        let key = dom::node_identity(node);
        *self.scores.entry(key).or_insert(ScoreRecord {
            content_score: base,
            initialized: true,
        })
    }

    pub fn add_to_score(&mut self, node: &NodeRef, delta: f64) {
        let key = dom::node_identity(node);
        let entry = self.scores.entry(key).or_insert(ScoreRecord {
            content_score: 0.0,
            initialized: true,
        });
        entry.content_score += delta;
    }

    pub fn set_content_score(&mut self, node: &NodeRef, value: f64) {
        let key = dom::node_identity(node);
        let entry = self.scores.entry(key).or_insert(ScoreRecord {
            content_score: 0.0,
            initialized: true,
        });
        entry.content_score = value;
    }

    pub fn multiply_score(&mut self, node: &NodeRef, factor: f64) {
        let key = dom::node_identity(node);
        if let Some(entry) = self.scores.get_mut(&key) {
            entry.content_score *= factor;
        }
    }
}

/// +25/-25/0 class-or-id weight; gated entirely by `WEIGHT_CLASSES`.
pub fn get_class_weight(node: &NodeRef, flags: ParseFlags) -> i32 {
    if !flags.contains(ParseFlags::WEIGHT_CLASSES) {
        return 0;
    }

    let mut weight = 0;

    if let Some(class) = dom::get_attr(node, "class") {
        if !class.is_empty() {
            if REGEXPS.negative.is_match(&class) {
                weight -= 25;
            } else if REGEXPS.positive.is_match(&class) {
                weight += 25;
            }
        }
    }

    if let Some(id) = dom::get_attr(node, "id") {
        if !id.is_empty() {
            if REGEXPS.negative.is_match(&id) {
                weight -= 25;
            } else if REGEXPS.positive.is_match(&id) {
                weight += 25;
            }
        }
    }

    weight
}

/// Base score by tag, plus class weight (4.6): `DIV`=5; `PRE`/`TD`/`BLOCKQUOTE`=3;
/// `ADDRESS`/`OL`/`UL`/`DD`/`DT`/`LI`/`FORM`=-3; `H1`-`H6`/`TH`=-5; others default 0.
pub fn initialize_node_score(node: &NodeRef, flags: ParseFlags) -> f64 {
    let mut score = 0.0;

    if let Some(tag) = dom::tag_name(node) {
        match tag.as_str() {
            "DIV" => score += 5.0,
            "PRE" | "TD" | "BLOCKQUOTE" => score += 3.0,
            "ADDRESS" | "OL" | "UL" | "DD" | "DT" | "LI" | "FORM" => score -= 3.0,
            "H1" | "H2" | "H3" | "H4" | "H5" | "H6" | "TH" => score -= 5.0,
            _ => {}
        }
    }

    score += get_class_weight(node, flags) as f64;
    score
}

/// Per-element content score: base 1 + comma count + length bonus, scaled by link density.
/// Returns 0 outright for elements whose text is under 25 Unicode scalars.
pub fn calculate_content_score(node: &NodeRef, link_density_modifier: f64) -> f64 {
    let inner_text = dom::get_inner_text(node, false);
    if crate::utils::char_count(&inner_text) < 25 {
        return 0.0;
    }

    let mut score = 1.0;
    let comma_count = REGEXPS.commas.find_iter(&inner_text).count();
    score += comma_count as f64;

    let length_bonus = (crate::utils::char_count(&inner_text) as f64 / 100.0).min(3.0);
    score += length_bonus;

    let link_density = dom::get_link_density(node);
    score *= 1.0 - link_density + link_density_modifier;

    score
}

/// Propagate `node`'s own content score to ancestors up to depth 5: full weight to the
/// parent, halved to the grandparent, divided by `level * 3` beyond that (4.6).
pub fn propagate_score_to_ancestors(store: &mut ScoreStore, node: &NodeRef, own_score: f64) {
    if own_score <= 0.0 {
        return;
    }
    for (level, ancestor) in dom::get_node_ancestors(node, 5).iter().enumerate() {
        if dom::is_tag(ancestor, "BODY") {
            break;
        }
        let divider = match level {
            0 => 1.0,
            1 => 2.0,
            _ => (level as f64) * 3.0,
        };
        store.ensure_initialized(ancestor, 0.0);
        store.add_to_score(ancestor, own_score / divider);
    }
}

/// A node is a valid byline candidate if it declares `rel="author"`, an `itemprop`
/// containing "author", or its class/id matches the byline pattern, and its text is
/// non-empty and under 100 characters.
pub fn is_valid_byline(node: &NodeRef, match_string: &str) -> bool {
    let rel = dom::get_attr(node, "rel").unwrap_or_default();
    let itemprop = dom::get_attr(node, "itemprop").unwrap_or_default();
    let byline_length = crate::utils::char_count(&dom::get_inner_text(node, false));

    (rel == "author" || itemprop.contains("author") || REGEXPS.byline.is_match(match_string))
        && byline_length > 0
        && byline_length < 100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_body(html: &str) -> NodeRef {
        let document = kuchikikiki::parse_html().one(html);
        document.select_first("body").unwrap().as_node().clone()
    }

    #[test]
    fn class_weight_detects_positive_and_negative() {
        let body = parse_body(
            r#"<div class="article content">Positive</div>
               <div class="sidebar ad">Negative</div>
               <div id="main-content">Positive ID</div>"#,
        );
        let flags = ParseFlags::WEIGHT_CLASSES;
        let positive = body.select_first(".article").unwrap();
        let negative = body.select_first(".sidebar").unwrap();
        let positive_id = body.select_first("#main-content").unwrap();

        assert!(get_class_weight(positive.as_node(), flags) > 0);
        assert!(get_class_weight(negative.as_node(), flags) < 0);
        assert!(get_class_weight(positive_id.as_node(), flags) > 0);
    }

    #[test]
    fn base_score_matches_tag_table() {
        let flags = ParseFlags::WEIGHT_CLASSES;

        // P, SECTION, and ARTICLE are not in the tag table (4.6) and default to 0.
        let p = parse_body("<p>Content</p>");
        let p_node = p.select_first("p").unwrap();
        assert_eq!(initialize_node_score(p_node.as_node(), flags), 0.0);

        let h1 = parse_body("<h1>Title</h1>");
        let h1_node = h1.select_first("h1").unwrap();
        assert_eq!(initialize_node_score(h1_node.as_node(), flags), -5.0);

        // DIV is unconditionally 5, regardless of block-level children.
        let div_as_p = parse_body("<div>Text content only</div>");
        let div_node = div_as_p.select_first("div").unwrap();
        assert_eq!(initialize_node_score(div_node.as_node(), flags), 5.0);

        let div_container = parse_body("<div><p>Nested paragraph</p></div>");
        let container_node = div_container.select_first("div").unwrap();
        assert_eq!(initialize_node_score(container_node.as_node(), flags), 5.0);

        let article = parse_body("<article>Content</article>");
        let article_node = article.select_first("article").unwrap();
        assert_eq!(initialize_node_score(article_node.as_node(), flags), 0.0);
    }

    #[test]
    fn content_score_rewards_length_and_commas() {
        let body = parse_body(
            "<p>This is a long paragraph with enough content to be scored. It has some commas, which increase the score.</p>",
        );
        let p = body.select_first("p").unwrap();
        assert!(calculate_content_score(p.as_node(), 0.0) > 1.0);
    }

    #[test]
    fn short_content_scores_zero() {
        let body = parse_body("<p>Short</p>");
        let p = body.select_first("p").unwrap();
        assert_eq!(calculate_content_score(p.as_node(), 0.0), 0.0);
    }

    #[test]
    fn score_store_tracks_and_propagates() {
        let body = parse_body("<div><p>Inner text here, with commas, to score well.</p></div>");
        let mut store = ScoreStore::new();
        let p = body.select_first("p").unwrap().as_node().clone();
        let score = calculate_content_score(&p, 0.0);
        store.ensure_initialized(&p, 0.0);
        store.set_content_score(&p, score);
        propagate_score_to_ancestors(&mut store, &p, score);

        let div = body.select_first("div").unwrap().as_node().clone();
        assert!(store.content_score(&div) > 0.0);
    }
}
