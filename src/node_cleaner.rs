//! Node cleaner (4.5): unlikely-candidate removal, ARIA-role removal, empty-container
//! removal, byline extraction from HTML, and header-duplicates-title detection.

use crate::constants::{ParseFlags, REGEXPS, UNLIKELY_ROLES};
use crate::dom;
use crate::utils;
use kuchikikiki::NodeRef;

/// Roles (4.5) whose presence marks an element for removal outright.
fn has_unlikely_role(node: &NodeRef) -> bool {
    dom::get_attr(node, "role")
        .map(|r| UNLIKELY_ROLES.contains(&r.as_str()))
        .unwrap_or(false)
}

/// class+id match the unlikely pattern, don't match the maybe-candidate exception, aren't
/// within depth 3 of `<table>`/`<code>`, and aren't `BODY`/`A`.
fn is_unlikely_candidate(node: &NodeRef) -> bool {
    if dom::is_tag(node, "BODY") || dom::is_tag(node, "A") {
        return false;
    }

    let class = dom::get_attr(node, "class").unwrap_or_default();
    let id = dom::get_attr(node, "id").unwrap_or_default();
    let match_string = format!("{class} {id}");

    if match_string.trim().is_empty() {
        return false;
    }

    let unlikely = REGEXPS.unlikely_candidates.is_match(&match_string);
    let maybe = REGEXPS.ok_maybe_its_a_candidate.is_match(&match_string);

    if !unlikely || maybe {
        return false;
    }

    if dom::has_ancestor_tag(node, "TABLE", 3, None) || dom::has_ancestor_tag(node, "CODE", 3, None)
    {
        return false;
    }

    // Explicit article-container exceptions: itemprop/role/id that name a real body.
    if let Some(itemprop) = dom::get_attr(node, "itemprop") {
        if itemprop.contains("articleBody") {
            return false;
        }
    }
    if dom::get_attr(node, "role").as_deref() == Some("main") {
        return false;
    }

    true
}

fn is_empty_container(node: &NodeRef) -> bool {
    matches!(
        dom::tag_name(node).as_deref(),
        Some("DIV") | Some("SECTION") | Some("HEADER") | Some("H1") | Some("H2") | Some("H3")
            | Some("H4") | Some("H5") | Some("H6")
    ) && dom::is_element_without_content(node)
}

/// Walk `root` in document order, removing unlikely candidates, disallowed ARIA roles, and
/// empty containers. When `strip_unlikelys` is false only the role/empty-container checks
/// run (mirroring 4.7 step 1's gating on `STRIP_UNLIKELYS`).
pub fn clean_unlikely_and_empty(root: &NodeRef, flags: ParseFlags) {
    let mut current = root.first_child();
    while let Some(node) = current {
        if node.as_element().is_none() {
            current = dom::get_next_node(&node, root, false);
            continue;
        }

        let strip = flags.contains(ParseFlags::STRIP_UNLIKELYS);
        if strip && is_unlikely_candidate(&node) {
            current = dom::remove_and_get_next(&node, root);
            continue;
        }
        if has_unlikely_role(&node) {
            current = dom::remove_and_get_next(&node, root);
            continue;
        }
        if is_empty_container(&node) {
            current = dom::remove_and_get_next(&node, root);
            continue;
        }

        current = dom::get_next_node(&node, root, false);
    }
}

/// A node is not eligible for byline extraction if it sits inside a comments container or
/// `<pre>`, or declares a role identifying it as a title/author-bio element instead.
fn is_byline_ineligible(node: &NodeRef) -> bool {
    if dom::has_ancestor_tag(node, "PRE", 0, None) {
        return true;
    }
    if let Some(id_or_class) = dom::get_attr(node, "id")
        .into_iter()
        .chain(dom::get_attr(node, "class"))
        .find(|s| s.to_lowercase().contains("comment"))
    {
        let _ = id_or_class;
        return true;
    }
    matches!(dom::get_attr(node, "role").as_deref(), Some("heading") | Some("doc-subtitle"))
}

/// Strip a trailing time-of-day / timezone suffix unless the text begins with "updated".
fn strip_trailing_time(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.trim_start().starts_with("updated") {
        return text.to_string();
    }
    REGEXPS.byline_trailing_time.replace(text, "").trim().to_string()
}

/// Extract a byline from `node` if it is a valid byline container (4.5). Prefers a
/// `itemprop*=name` child, then an `<a rel=author>`/`/author/` link, then the node's own
/// text. Returns `None` for URL-like or disqualified text.
pub fn extract_byline(node: &NodeRef) -> Option<String> {
    if is_byline_ineligible(node) {
        return None;
    }

    let class = dom::get_attr(node, "class").unwrap_or_default();
    let id = dom::get_attr(node, "id").unwrap_or_default();
    let match_string = format!("{class} {id}");

    if !crate::scoring::is_valid_byline(node, &match_string) {
        return None;
    }

    let text = if let Ok(mut named) = node.select("[itemprop*=name]") {
        named.next().map(|m| dom::get_inner_text(m.as_node(), true))
    } else {
        None
    }
    .or_else(|| {
        node.select("a[rel=author]")
            .ok()
            .and_then(|mut it| it.next())
            .map(|m| dom::get_inner_text(m.as_node(), true))
    })
    .or_else(|| {
        node.select("a")
            .ok()
            .and_then(|it| {
                it.filter(|m| {
                    dom::get_attr(m.as_node(), "href")
                        .map(|h| h.contains("/author/"))
                        .unwrap_or(false)
                })
                .next()
            })
            .map(|m| dom::get_inner_text(m.as_node(), true))
    })
    .unwrap_or_else(|| dom::get_inner_text(node, true));

    let cleaned = strip_trailing_time(&text);

    if cleaned.is_empty() || utils::char_count(&cleaned) >= 100 || utils::looks_like_url(&cleaned) {
        return None;
    }

    Some(cleaned)
}

/// True for `<h1>`/`<h2>` (excluding `<h2>` with a non-empty id) whose text is >75% similar
/// to `title` by token-set similarity.
pub fn is_title_duplicate_header(node: &NodeRef, title: &str) -> bool {
    let tag = match dom::tag_name(node) {
        Some(t) if t == "H1" || t == "H2" => t,
        _ => return false,
    };
    if tag == "H2" {
        if let Some(id) = dom::get_attr(node, "id") {
            if !id.is_empty() {
                return false;
            }
        }
    }

    let text = dom::get_inner_text(node, true);
    utils::token_similarity(&text, title) > 0.75
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ParseFlags;

    fn parse_body(html: &str) -> NodeRef {
        let document = kuchikikiki::parse_html().one(html);
        document.select_first("body").unwrap().as_node().clone()
    }

    #[test]
    fn removes_unlikely_candidate_by_class() {
        let body = parse_body(r#"<div class="sidebar">junk</div><p>keep</p>"#);
        clean_unlikely_and_empty(&body, ParseFlags::STRIP_UNLIKELYS);
        assert!(body.select_first("div").is_err());
        assert_eq!(dom::get_inner_text(&body, true), "keep");
    }

    #[test]
    fn keeps_maybe_candidate_despite_unlikely_match() {
        let body = parse_body(r#"<div class="sidebar-content article">keep</div>"#);
        clean_unlikely_and_empty(&body, ParseFlags::STRIP_UNLIKELYS);
        assert!(body.select_first("div").is_ok());
    }

    #[test]
    fn removes_disallowed_aria_role() {
        let body = parse_body(r#"<div role="navigation">nav</div><p>keep</p>"#);
        clean_unlikely_and_empty(&body, ParseFlags::empty());
        assert!(body.select_first("div").is_err());
    }

    #[test]
    fn removes_empty_div() {
        let body = parse_body("<div>   </div><p>keep</p>");
        clean_unlikely_and_empty(&body, ParseFlags::empty());
        assert!(body.select_first("div").is_err());
    }

    #[test]
    fn extracts_byline_via_rel_author() {
        let body = parse_body(r#"<span rel="author">Jane Doe</span>"#);
        let span = body.select_first("span").unwrap().as_node().clone();
        assert_eq!(extract_byline(&span).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn accepts_multibyte_byline_under_100_scalars_but_over_100_bytes() {
        // 40 three-byte CJK characters: 40 Unicode scalars, 120 UTF-8 bytes.
        let name = "名".repeat(40);
        let body = parse_body(&format!(r#"<span rel="author">{name}</span>"#));
        let span = body.select_first("span").unwrap().as_node().clone();
        assert_eq!(extract_byline(&span).as_deref(), Some(name.as_str()));
    }

    #[test]
    fn rejects_url_like_byline() {
        let body = parse_body(r#"<span class="byline">https://example.com/x</span>"#);
        let span = body.select_first("span").unwrap().as_node().clone();
        assert_eq!(extract_byline(&span), None);
    }

    #[test]
    fn detects_duplicate_header() {
        let body = parse_body("<h1>Big Story About Cats</h1>");
        let h1 = body.select_first("h1").unwrap().as_node().clone();
        assert!(is_title_duplicate_header(&h1, "Big Story About Cats"));
        assert!(!is_title_duplicate_header(&h1, "Completely Unrelated Topic"));
    }
}
