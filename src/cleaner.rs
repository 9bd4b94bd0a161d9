//! Article cleaner (4.11): the nine-step pass applied to the merged container before
//! serialization — unwanted-element removal, presentational-attribute stripping, lazy-image
//! fixing, div/paragraph normalization, nested-element simplification, the `_prepArticle`
//! tail, conditional cleaning, header cleanup, and URL resolution.

use crate::constants::{
    ParseFlags, DEPRECATED_SIZE_ATTRIBUTES, PRESENTATIONAL_ATTRIBUTES, REGEXPS,
};
use crate::content_extractor;
use crate::dom;
use crate::options::ReadabilityOptions;
use crate::scoring;
use kuchikikiki::NodeRef;
use url::Url;

/// Run the full article-cleaning pipeline over `container` in place. `flags` is the flag set
/// the winning extraction attempt ran under (conditional cleaning is gated on
/// `CLEAN_CONDITIONALLY`); `base_url` resolves relative `href`/`src` values, if supplied.
pub fn clean_article(
    container: &NodeRef,
    options: &ReadabilityOptions,
    flags: ParseFlags,
    base_url: Option<&Url>,
) {
    remove_unwanted(container);
    clean_styles(container, options);
    fix_lazy_images(container);
    convert_divs_to_paragraphs(container);
    simplify_nested_elements(container);
    prep_article_tail(container);
    if flags.contains(ParseFlags::CLEAN_CONDITIONALLY) {
        mark_data_tables(container);
        for tag in ["form", "fieldset", "table", "ul", "div"] {
            clean_conditionally_tag(container, tag, options);
        }
    }
    clean_headers(container, flags);
    if let Some(base) = base_url {
        resolve_urls(container, base);
    }
}

/// 4.11 step 1: drop script/style/noscript, anything hidden, and share/social widgets.
fn remove_unwanted(container: &NodeRef) {
    let mut targets = Vec::new();
    for node in container.descendants() {
        if node.as_element().is_none() {
            continue;
        }
        let is_unwanted_tag = dom::is_tag(&node, "SCRIPT")
            || dom::is_tag(&node, "STYLE")
            || dom::is_tag(&node, "NOSCRIPT");
        let is_hidden = dom::is_hidden_strict(&node);
        let is_share = {
            let class = dom::get_attr(&node, "class").unwrap_or_default();
            let id = dom::get_attr(&node, "id").unwrap_or_default();
            let match_string = format!("{class} {id}");
            !match_string.trim().is_empty() && REGEXPS.share_elements.is_match(&match_string)
        };
        if is_unwanted_tag || is_hidden || is_share {
            targets.push(node);
        }
    }
    for node in targets {
        node.detach();
    }
}

/// 4.11 step 2: strip presentational attributes and size attributes on table-ish elements,
/// unless `keep_classes` is set. Reduce `class` to the preserved set either way.
fn clean_styles(container: &NodeRef, options: &ReadabilityOptions) {
    for node in container.descendants() {
        if node.as_element().is_none() {
            continue;
        }

        if !options.keep_classes {
            for attr in PRESENTATIONAL_ATTRIBUTES {
                dom::remove_attr(&node, attr);
            }
            let is_size_tagged = matches!(
                dom::tag_name(&node).as_deref(),
                Some("TABLE") | Some("TH") | Some("TD") | Some("HR") | Some("PRE")
            );
            if is_size_tagged {
                for attr in DEPRECATED_SIZE_ATTRIBUTES {
                    dom::remove_attr(&node, attr);
                }
            }
        }

        if let Some(class) = dom::get_attr(&node, "class") {
            let kept: Vec<&str> = class
                .split_whitespace()
                .filter(|c| options.keep_classes || options.is_class_preserved(c))
                .collect();
            if kept.is_empty() {
                dom::remove_attr(&node, "class");
            } else {
                dom::set_attr(&node, "class", &kept.join(" "));
            }
        }
    }
}

/// 4.11 step 3: for `<img>`/`<picture>`/`<figure>`, copy a `data-*` attribute holding an
/// image-URL-shaped value (named like `...src...`/`...original...`) over to `src`.
fn fix_lazy_images(container: &NodeRef) {
    for node in container.descendants() {
        let Some(element) = node.as_element() else {
            continue;
        };
        if !matches!(
            dom::tag_name(&node).as_deref(),
            Some("IMG") | Some("PICTURE") | Some("FIGURE")
        ) {
            continue;
        }

        let candidate = {
            let attrs = element.attributes.borrow();
            attrs
                .map
                .iter()
                .find(|(name, attr)| {
                    let local = name.local.as_ref();
                    local.starts_with("data-")
                        && (local.contains("src") || local.contains("original"))
                        && REGEXPS.lazy_image_src.is_match(&attr.value)
                })
                .map(|(_, attr)| attr.value.clone())
        };

        if let Some(value) = candidate {
            dom::set_attr(&node, "src", &value);
        }
    }
}

/// 4.11 step 4: retag block-free `<div>`s to `<p>`, else group their phrasing-content runs
/// into new `<p>` wrappers.
fn convert_divs_to_paragraphs(container: &NodeRef) {
    let divs: Vec<NodeRef> = container
        .descendants()
        .filter(|n| dom::is_tag(n, "DIV"))
        .collect();

    for div in divs {
        if !dom::has_child_block_element(&div) {
            dom::rename_element(&div, "p");
        } else {
            content_extractor::group_phrasing_runs_into_paragraphs(&div);
        }
    }
}

/// 4.11 step 5: remove empty `<div>`/`<section>`; collapse a text-free wrapper around a
/// single `<div>`/`<section>` child into that child, merging the wrapper's attributes onto
/// it wherever the child doesn't already declare them.
fn simplify_nested_elements(container: &NodeRef) {
    let mut candidates: Vec<NodeRef> = container
        .descendants()
        .filter(|n| dom::is_tag(n, "DIV") || dom::is_tag(n, "SECTION"))
        .collect();
    // Deepest nodes first, so a wrapper's child has already been resolved before the
    // wrapper itself is considered.
    candidates.reverse();

    for node in candidates {
        if node.parent().is_none() {
            continue; // already detached by an earlier iteration
        }

        if dom::is_element_without_content(&node) && node.first_child().is_none() {
            node.detach();
            continue;
        }

        let only_child = {
            let mut elements = node.children().filter(|c| c.as_element().is_some());
            let first = elements.next();
            if elements.next().is_some() {
                None
            } else {
                first
            }
        };

        if let (Some(child), true) = (
            only_child,
            dom::get_inner_text(&node, false).trim().is_empty(),
        ) {
            if dom::is_tag(&child, "DIV") || dom::is_tag(&child, "SECTION") {
                if let Some(element) = node.as_element() {
                    let parent_attrs = element.attributes.borrow().clone();
                    for (name, attr) in parent_attrs.map.iter() {
                        let local = name.local.as_ref();
                        if dom::get_attr(&child, local).is_none() {
                            dom::set_attr(&child, local, &attr.value);
                        }
                    }
                }
                dom::replace_node(&node, &child);
            }
        }
    }
}

/// 4.11 step 6: the `_prepArticle` tail — drop text-and-media-free paragraphs, demote
/// `<h1>` to `<h2>`, and flatten single-row/single-cell tables into their cell's content.
fn prep_article_tail(container: &NodeRef) {
    let paragraphs: Vec<NodeRef> = container.descendants().filter(|n| dom::is_tag(n, "P")).collect();
    for p in paragraphs {
        if dom::get_inner_text(&p, false).trim().is_empty() && !has_embedded_media(&p) {
            p.detach();
        }
    }

    let h1s: Vec<NodeRef> = container.descendants().filter(|n| dom::is_tag(n, "H1")).collect();
    for h1 in h1s {
        dom::rename_element(&h1, "h2");
    }

    let tables: Vec<NodeRef> = container.descendants().filter(|n| dom::is_tag(n, "TABLE")).collect();
    for table in tables {
        if table.parent().is_none() {
            continue;
        }
        if let Some(cell) = single_cell_of_single_row(&table) {
            let all_phrasing = cell
                .children()
                .all(|c| c.as_text().is_some() || dom::is_phrasing_content(&c));
            let replacement = dom::new_element(if all_phrasing { "p" } else { "div" }, vec![]);
            while let Some(child) = cell.first_child() {
                child.detach();
                replacement.append(child);
            }
            dom::replace_node(&table, &replacement);
        }
    }
}

fn has_embedded_media(node: &NodeRef) -> bool {
    for tag in ["img", "embed", "object", "iframe", "video", "audio"] {
        if node.select(tag).map(|mut it| it.next().is_some()).unwrap_or(false) {
            return true;
        }
    }
    false
}

fn single_cell_of_single_row(table: &NodeRef) -> Option<NodeRef> {
    let rows: Vec<NodeRef> = table.select("tr").ok()?.map(|m| m.as_node().clone()).collect();
    if rows.len() != 1 {
        return None;
    }
    let cells: Vec<NodeRef> = rows[0]
        .children()
        .filter(|c| dom::is_tag(c, "TD") || dom::is_tag(c, "TH"))
        .collect();
    if cells.len() == 1 {
        Some(cells.into_iter().next().unwrap())
    } else {
        None
    }
}

/// 4.11 step 8: remove `<h1>`/`<h2>` whose class weight is negative.
fn clean_headers(container: &NodeRef, flags: ParseFlags) {
    let headers: Vec<NodeRef> = container
        .descendants()
        .filter(|n| dom::is_tag(n, "H1") || dom::is_tag(n, "H2"))
        .collect();
    for header in headers {
        if scoring::get_class_weight(&header, flags) < 0 {
            header.detach();
        }
    }
}

/// 4.11 step 9: resolve every `href`/`src` against `base`, and unwrap `<a>` elements whose
/// `href` is a `javascript:` URI (keeping their children in place).
fn resolve_urls(container: &NodeRef, base: &Url) {
    let anchors: Vec<NodeRef> = container.descendants().filter(|n| dom::is_tag(n, "A")).collect();
    for anchor in anchors {
        if let Some(href) = dom::get_attr(&anchor, "href") {
            if href.trim_start().to_lowercase().starts_with("javascript:") {
                while let Some(child) = anchor.first_child() {
                    child.detach();
                    anchor.insert_before(child);
                }
                anchor.detach();
                continue;
            }
        }
    }

    for node in container.descendants() {
        if node.as_element().is_none() {
            continue;
        }
        for attr in ["href", "src"] {
            if let Some(value) = dom::get_attr(&node, attr) {
                if value.is_empty() || REGEXPS.protocol_or_fragment.is_match(&value) {
                    continue;
                }
                if let Ok(resolved) = base.join(&value) {
                    dom::set_attr(&node, attr, resolved.as_str());
                }
            }
        }
    }
}

fn mark_data_tables(container: &NodeRef) {
    let Ok(tables) = container.select("table") else {
        return;
    };
    for table in tables {
        let node = table.as_node();
        let is_data = detect_data_table(node);
        dom::set_attr(node, "data-readability-datatable", if is_data { "true" } else { "false" });
    }
}

fn detect_data_table(table: &NodeRef) -> bool {
    if dom::get_attr(table, "role").as_deref() == Some("presentation") {
        return false;
    }
    if dom::get_attr(table, "datatable").as_deref() == Some("0") {
        return false;
    }
    if dom::get_attr(table, "summary").is_some() {
        return true;
    }
    if table.select("caption").ok().and_then(|mut it| it.next()).is_some() {
        return true;
    }
    let has_data_descendant = ["col", "colgroup", "tfoot", "thead", "th"]
        .iter()
        .any(|tag| table.select(tag).ok().and_then(|mut it| it.next()).is_some());
    if has_data_descendant {
        return true;
    }
    if table.select("table").ok().and_then(|mut it| it.next()).is_some() {
        return false;
    }

    let (rows, columns) = row_and_column_count(table);
    if rows == 0 || columns == 0 || rows == 1 || columns == 1 {
        return false;
    }
    if rows >= 10 || columns > 4 {
        return true;
    }
    rows * columns > 10
}

fn row_and_column_count(table: &NodeRef) -> (usize, usize) {
    let mut rows = 0;
    let mut columns = 0;
    if let Ok(trs) = table.select("tr") {
        for tr in trs {
            rows += 1;
            let cols = tr
                .as_node()
                .children()
                .filter(|c| dom::is_tag(c, "TD") || dom::is_tag(c, "TH"))
                .count();
            columns = columns.max(cols);
        }
    }
    (rows, columns)
}

fn is_data_table(table: &NodeRef) -> bool {
    dom::get_attr(table, "data-readability-datatable").as_deref() == Some("true")
}

fn node_contains_data_table(node: &NodeRef) -> bool {
    node.select("table")
        .map(|it| it.map(|m| m.as_node().clone()).any(|t| is_data_table(&t)))
        .unwrap_or(false)
}

fn clean_conditionally_tag(root: &NodeRef, tag: &str, options: &ReadabilityOptions) {
    let Ok(matches) = root.select(tag) else {
        return;
    };
    let nodes: Vec<NodeRef> = matches.map(|m| m.as_node().clone()).collect();
    for node in nodes {
        if node.parent().is_some() && should_remove_conditionally(&node, tag, options) {
            node.detach();
        }
    }
}

/// Ported from the teacher's `should_remove_dom_node` onto the new `dom`/`scoring`
/// utilities; the allowed-video check now uses the configured `allowed_video_regex` instead
/// of a hardcoded host list.
fn should_remove_conditionally(node: &NodeRef, tag: &str, options: &ReadabilityOptions) -> bool {
    let trimmed = dom::get_inner_text(node, false);
    if crate::utils::char_count(&trimmed) > 600 {
        return false;
    }

    let mut is_list = tag.eq_ignore_ascii_case("ul") || tag.eq_ignore_ascii_case("ol");
    if !is_list {
        let node_text_len = crate::utils::char_count(&trimmed).max(1);
        let list_text_len: usize = node
            .select("ul, ol")
            .map(|it| {
                it.map(|n| crate::utils::char_count(&dom::get_inner_text(n.as_node(), false)))
                    .sum()
            })
            .unwrap_or(0);
        is_list = (list_text_len as f64 / node_text_len as f64) > 0.9;
    }

    if tag.eq_ignore_ascii_case("table") && is_data_table(node) {
        return false;
    }
    if dom::has_ancestor_tag(node, "TABLE", 0, Some(&|a| is_data_table(a))) {
        return false;
    }
    if dom::has_ancestor_tag(node, "CODE", 0, None) {
        return false;
    }
    if node_contains_data_table(node) {
        return false;
    }

    let content_length = crate::utils::char_count(&trimmed);
    let link_density = dom::get_link_density(node);
    let weight = scoring::get_class_weight(node, ParseFlags::WEIGHT_CLASSES);

    // A negative class weight alone doesn't justify removal; page builders often use
    // generic container classes like "widget" for legitimate content, not just sidebars.
    if weight < 0 && (link_density > 0.25 || content_length < 100) {
        return true;
    }

    let comma_count = REGEXPS.commas.find_iter(&trimmed).count();
    if comma_count >= 10 {
        return false;
    }

    let p = count_matching(node, "p");
    let img = count_matching(node, "img");
    let li = count_matching(node, "li").saturating_sub(100);
    let input = count_matching(node, "input");
    let heading_density = text_density(node, &["h1", "h2", "h3", "h4", "h5", "h6"]);

    let mut embed_count = 0;
    if let Ok(embeds) = node.select("object, embed, iframe") {
        for embed in embeds {
            let embed_node = embed.as_node().clone();
            if node_has_allowed_video(&embed_node, options) {
                return false;
            }
            embed_count += 1;
        }
    }

    if REGEXPS.ad_words.is_match(trimmed.trim()) || REGEXPS.loading_words.is_match(trimmed.trim()) {
        return true;
    }

    let text_density = text_density(node, &textish_tags());
    let is_figure_child = dom::has_ancestor_tag(node, "FIGURE", 0, None);

    let mut should_remove = false;
    if !is_figure_child && img > 1 && p > 0 && (p as f64 / img as f64) < 0.5 {
        should_remove = true;
    }
    if !is_list && li > p {
        should_remove = true;
    }
    if input > p / 3 {
        should_remove = true;
    }
    if !is_list && !is_figure_child && heading_density < 0.9 && content_length < 25 && link_density > 0.0 {
        should_remove = true;
    }
    if !is_list && weight < 25 && link_density > 0.2 {
        should_remove = true;
    }
    if weight >= 25 && link_density > 0.5 {
        should_remove = true;
    }
    if (embed_count == 1 && content_length < 75) || embed_count > 1 {
        should_remove = true;
    }
    if img == 0 && text_density == 0.0 {
        should_remove = true;
    }

    if is_list && should_remove {
        let simple_children = node.children().all(|child| {
            if child.as_element().is_none() {
                return true;
            }
            child.children().filter(|c| c.as_element().is_some()).count() <= 1
        });
        if simple_children {
            let li_count = count_matching(node, "li");
            if li_count > 0 && img == li_count {
                should_remove = false;
            }
        }
    }

    should_remove
}

fn count_matching(node: &NodeRef, selector: &str) -> usize {
    node.select(selector).map(|it| it.count()).unwrap_or(0)
}

fn node_has_allowed_video(node: &NodeRef, options: &ReadabilityOptions) -> bool {
    if let Some(element) = node.as_element() {
        let attrs = element.attributes.borrow();
        for (_, attribute) in attrs.map.iter() {
            if options.allowed_video_regex.is_match(&attribute.value) {
                return true;
            }
        }
    }
    if dom::is_tag(node, "OBJECT") && options.allowed_video_regex.is_match(&node.text_contents()) {
        return true;
    }
    false
}

fn textish_tags() -> Vec<String> {
    let mut tags: Vec<String> = vec!["span".into(), "li".into(), "td".into()];
    tags.extend(crate::constants::DIV_TO_P_ELEMS.iter().map(|t| t.to_lowercase()));
    tags
}

fn text_density(node: &NodeRef, tags: &[impl AsRef<str>]) -> f64 {
    let total_text = crate::utils::char_count(&dom::get_inner_text(node, false)) as f64;
    if total_text == 0.0 {
        return 0.0;
    }
    let mut child_text = 0.0;
    for tag in tags {
        if let Ok(matches) = node.select(tag.as_ref()) {
            for child in matches {
                child_text += crate::utils::char_count(&dom::get_inner_text(child.as_node(), false)) as f64;
            }
        }
    }
    child_text / total_text
}
