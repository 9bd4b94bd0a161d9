//! DOM manipulation and traversal utilities built on `kuchikiki`'s mutable tree.
//!
//! Node identity for the scoring store (4.6/4.7) is the node's structural path from the
//! document root (a sequence of sibling indices), not a pointer address: `kuchikiki` does
//! not expose the raw `Rc` behind a `NodeRef`, so identity is derived purely from
//! `previous_sibling`/`parent` traversal. The path is only meaningful within the tree that
//! produced it and is never serialized or compared across documents.

use crate::constants::{PHRASING_ELEMS, REGEXPS};
use html5ever::{local_name, namespace_url, ns, LocalName, QualName};
use kuchikikiki::{Attribute, ExpandedName, NodeData, NodeRef};
use std::collections::BTreeMap;

/// A node's position within its document, expressed as sibling indices from the root.
/// Two `NodePath`s compare equal iff they refer to the same node in the same tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

/// A stable identity for a node within a single parse, derived from its position in the
/// tree rather than a pointer. Stable across repeated calls for the same node; two
/// structurally-equivalent-but-distinct nodes (e.g. after a rebuild) never compare equal.
pub fn node_identity(node: &NodeRef) -> NodePath {
    let mut path = Vec::new();
    let mut current = node.clone();
    loop {
        let mut index = 0;
        let mut walker = current.clone();
        while let Some(prev) = walker.previous_sibling() {
            index += 1;
            walker = prev;
        }
        path.push(index);
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    NodePath(path)
}

macro_rules! qualname {
    ($name:expr) => {
        QualName::new(None, ns!(html), LocalName::from($name))
    };
}

/// Build a new HTML element node with the given lowercase tag name and attributes.
pub fn new_element(tag: &str, attrs: Vec<(&str, String)>) -> NodeRef {
    let map: BTreeMap<ExpandedName, Attribute> = attrs
        .into_iter()
        .map(|(name, value)| {
            (
                ExpandedName::new(ns!(), LocalName::from(name)),
                Attribute {
                    prefix: None,
                    value,
                },
            )
        })
        .collect();
    NodeRef::new_element(qualname!(tag), map)
}

/// Uppercased tag name of an element node, or `None` for non-element nodes.
pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|e| e.name.local.to_uppercase())
}

/// True if `node` is an element with the given uppercase tag name.
pub fn is_tag(node: &NodeRef, tag: &str) -> bool {
    tag_name(node).as_deref() == Some(tag)
}

pub fn get_attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|e| e.attributes.borrow().get(name).map(str::to_string))
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(e) = node.as_element() {
        e.attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(e) = node.as_element() {
        e.attributes.borrow_mut().remove(name);
    }
}

/// Full text content of the subtree rooted at `node`, completely unnormalized.
pub fn text_content(node: &NodeRef) -> String {
    node.text_contents()
}

/// Inner text matching the reference's cross-browser `textContent` behavior: trimmed, and
/// optionally collapsed to single spaces.
pub fn get_inner_text(node: &NodeRef, normalize_spaces: bool) -> String {
    let text = text_content(node);
    let trimmed = text.trim();
    if normalize_spaces {
        crate::utils::normalize_whitespace(trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Proportion of `node`'s text that sits inside `<a>` elements, weighting hash-fragment
/// links at 0.3 to match the reference's treatment of in-page anchors.
pub fn get_link_density(node: &NodeRef) -> f64 {
    let text_length = crate::utils::char_count(&get_inner_text(node, false));
    if text_length == 0 {
        return 0.0;
    }

    let mut link_length = 0.0;
    if let Ok(links) = node.select("a") {
        for link in links {
            let link_node = link.as_node();
            if let Some(href) = get_attr(link_node, "href") {
                let coefficient = if REGEXPS.hash_url.is_match(&href) {
                    0.3
                } else {
                    1.0
                };
                link_length +=
                    crate::utils::char_count(&get_inner_text(link_node, false)) as f64
                        * coefficient;
            }
        }
    }

    link_length / text_length as f64
}

/// Phrasing (inline) content per the HTML5 content model: true text-level markup, plus
/// `<a>`/`<del>`/`<ins>` when every child is itself phrasing content.
pub fn is_phrasing_content(node: &NodeRef) -> bool {
    match tag_name(node) {
        Some(tag) if PHRASING_ELEMS.contains(&tag.as_str()) => true,
        Some(tag) if tag == "A" || tag == "DEL" || tag == "INS" => node
            .children()
            .all(|child| child.as_text().is_some() || is_phrasing_content(&child)),
        Some(_) => false,
        None => node.as_text().is_some(),
    }
}

/// True unless `node` or an ancestor is styled/attributed as hidden. The `aria-hidden`
/// check is waived for elements carrying a `fallback-image` class, mirroring the
/// reference's handling of accessible image replacements.
pub fn is_probably_visible(node: &NodeRef) -> bool {
    let mut current = Some(node.clone());

    while let Some(n) = current {
        if let Some(style) = get_attr(&n, "style") {
            let style_lower = style.to_lowercase();
            if style_lower.contains("display:none") || style_lower.contains("display: none") {
                return false;
            }
            if style_lower.contains("visibility:hidden")
                || style_lower.contains("visibility: hidden")
            {
                return false;
            }
        }

        if get_attr(&n, "hidden").is_some() {
            return false;
        }

        if let Some(aria_hidden) = get_attr(&n, "aria-hidden") {
            if aria_hidden == "true" {
                let is_fallback_image = get_attr(&n, "class")
                    .map(|c| c.contains("fallback-image"))
                    .unwrap_or(false);
                if !is_fallback_image {
                    return false;
                }
            }
        }

        current = n.parent();
    }

    true
}

/// Strict-removal visibility check (4.2): tests `node` itself only, no ancestor walk and no
/// `fallback-image` exception. Used when the caller is already iterating a selection of
/// candidate-for-removal nodes (the document preparer).
pub fn is_hidden_strict(node: &NodeRef) -> bool {
    if let Some(style) = get_attr(node, "style") {
        let style_lower = style.to_lowercase();
        if style_lower.contains("display:none") || style_lower.contains("display: none") {
            return true;
        }
        if style_lower.contains("visibility:hidden") || style_lower.contains("visibility: hidden")
        {
            return true;
        }
    }
    if get_attr(node, "hidden").is_some() {
        return true;
    }
    if get_attr(node, "aria-hidden").as_deref() == Some("true") {
        return true;
    }
    false
}

/// Ancestors of `node`, direct parent first, stopping after `max_depth` steps (0 = unbounded).
pub fn get_node_ancestors(node: &NodeRef, max_depth: usize) -> Vec<NodeRef> {
    let mut ancestors = Vec::new();
    let mut current = node.clone();
    let mut i = 0;

    while let Some(parent) = current.parent() {
        ancestors.push(parent.clone());
        i += 1;
        if max_depth > 0 && i >= max_depth {
            break;
        }
        current = parent;
    }

    ancestors
}

/// True if `node` has at least one element child that is not phrasing content.
pub fn has_child_block_element(node: &NodeRef) -> bool {
    node.children()
        .filter(|c| c.as_element().is_some())
        .any(|child| !is_phrasing_content(&child))
}

/// `dir` attribute of the document's `<html>` element, if it is one of `ltr`/`rtl`/`auto`.
pub fn get_article_direction(document: &NodeRef) -> Option<String> {
    let html = document.select_first("html").ok()?;
    let dir = get_attr(html.as_node(), "dir")?;
    let dir = dir.trim().to_lowercase();
    if dir == "ltr" || dir == "rtl" || dir == "auto" {
        Some(dir)
    } else {
        None
    }
}

/// In-order descent used by whole-tree walkers: first child, else next sibling, else the
/// nearest ancestor with a next sibling. Returns `None` past `root`. When
/// `ignore_self_and_kids` is set, children of `node` are skipped (used by `remove_and_get_next`
/// to resume traversal after detaching `node`).
pub fn get_next_node(node: &NodeRef, root: &NodeRef, ignore_self_and_kids: bool) -> Option<NodeRef> {
    if !ignore_self_and_kids {
        if let Some(child) = node.first_child() {
            return Some(child);
        }
    }
    if let Some(sibling) = node.next_sibling() {
        return Some(sibling);
    }
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if identity_eq(&ancestor, root) {
            return None;
        }
        if let Some(sibling) = ancestor.next_sibling() {
            return Some(sibling);
        }
        current = ancestor.parent();
    }
    None
}

/// Capture the node that traversal should resume at after `node` is removed, detach `node`,
/// and return the captured successor.
pub fn remove_and_get_next(node: &NodeRef, root: &NodeRef) -> Option<NodeRef> {
    let next = get_next_node(node, root, true);
    node.detach();
    next
}

fn identity_eq(a: &NodeRef, b: &NodeRef) -> bool {
    node_identity(a) == node_identity(b)
}

/// True if any ancestor of `node`, up to `max_depth` steps (0 = unbounded), has the given
/// uppercase tag name and (if provided) satisfies `filter`.
pub fn has_ancestor_tag(
    node: &NodeRef,
    tag: &str,
    max_depth: usize,
    filter: Option<&dyn Fn(&NodeRef) -> bool>,
) -> bool {
    get_node_ancestors(node, max_depth)
        .iter()
        .any(|a| is_tag(a, tag) && filter.map(|f| f(a)).unwrap_or(true))
}

/// Whitespace-only text node, or a `<br>` element.
pub fn is_whitespace(node: &NodeRef) -> bool {
    if is_tag(node, "BR") {
        return true;
    }
    if let Some(text) = node.as_text() {
        return text.borrow().trim().is_empty();
    }
    false
}

/// True if `node`'s text is whitespace-only and its only element children (if any) are
/// `<br>`/`<hr>`.
pub fn is_element_without_content(node: &NodeRef) -> bool {
    if !get_inner_text(node, false).trim().is_empty() {
        return false;
    }
    node.children()
        .filter(|c| c.as_element().is_some())
        .all(|c| is_tag(&c, "BR") || is_tag(&c, "HR"))
}

/// Deep clone of `node`'s subtree, preserving mixed element/text child order and attributes.
pub fn clone_element(node: &NodeRef) -> NodeRef {
    let cloned = match node.data() {
        NodeData::Element(e) => {
            NodeRef::new_element(e.name.clone(), e.attributes.borrow().clone().map)
        }
        NodeData::Text(t) => NodeRef::new_text(t.borrow().clone()),
        _ => NodeRef::new_element(qualname!("div"), BTreeMap::new()),
    };
    for child in node.children() {
        cloned.append(clone_element(&child));
    }
    cloned
}

/// Detach `old` from the tree and put `new` in its place.
pub fn replace_node(old: &NodeRef, new: &NodeRef) {
    old.insert_before(new.clone());
    old.detach();
}

/// Move every child of `old` onto `new`, preserving order, then swap `old` for `new` in the
/// tree. Used by the retagging operations (`<div>` &rarr; `<p>`, font &rarr; span, ...).
pub fn rename_element(node: &NodeRef, new_tag: &str) -> NodeRef {
    let attrs = node
        .as_element()
        .map(|e| e.attributes.borrow().clone())
        .unwrap_or_default();
    let replacement = NodeRef::new_element(qualname!(new_tag), attrs.map);
    while let Some(child) = node.first_child() {
        child.detach();
        replacement.append(child);
    }
    replace_node(node, &replacement);
    replacement
}

/// Count of all descendant nodes (elements, text, comments, ...) of `node`, used to enforce
/// `max_elems_to_parse`.
pub fn count_descendants(node: &NodeRef) -> usize {
    node.descendants().count()
}

/// Serialize `node` (and its subtree) back to an HTML string.
pub fn serialize_to_string(node: &NodeRef) -> String {
    let mut out = Vec::new();
    node.serialize(&mut out).expect("serialization to Vec<u8> cannot fail");
    String::from_utf8(out).expect("kuchikiki only ever emits valid UTF-8")
}
