//! Document preparer: the mutation pass applied once, before any scoring happens.
//!
//! Grounded in the teacher's `cleaner.rs::prep_document`/`replace_brs` (string-based) and
//! the real-DOM `replace_brs` pattern from a kuchiki-based reference port; this version
//! performs genuine node mutation rather than regex rewriting.

use crate::dom;
use kuchikikiki::NodeRef;

/// Run the full preparer pass over `body` in place.
pub fn prepare(body: &NodeRef) {
    promote_noscript_lazy_images(body);
    remove_scripts_and_styles(body);
    remove_strictly_hidden(body);
    replace_fonts_with_spans(body);
    replace_brs(body);
}

fn remove_scripts_and_styles(body: &NodeRef) {
    for tag in ["script", "style"] {
        if let Ok(matches) = body.select(tag) {
            for m in matches.collect::<Vec<_>>() {
                m.as_node().detach();
            }
        }
    }
    if let Ok(matches) = body.select("noscript") {
        for m in matches.collect::<Vec<_>>() {
            m.as_node().detach();
        }
    }
}

/// Must run before `remove_scripts_and_styles`, which detaches every `<noscript>`: if a
/// `<noscript>` wraps a single `<img>` that looks like a lazy-load fallback for an adjacent
/// lazy-loaded `<img>`, promote the fallback image in place of the lazy placeholder before
/// the wrapper (and its contents) are gone.
fn promote_noscript_lazy_images(body: &NodeRef) {
    let noscripts: Vec<NodeRef> = body
        .select("noscript")
        .map(|iter| iter.map(|m| m.as_node().clone()).collect())
        .unwrap_or_default();

    for noscript in noscripts {
        let fallback_img = match single_img_child(&noscript) {
            Some(img) => img,
            None => continue,
        };
        let prev_img = noscript
            .previous_sibling()
            .filter(|n| dom::is_tag(n, "IMG"));
        let prev_img = match prev_img {
            Some(img) => img,
            None => continue,
        };
        if !is_lazy_image(&prev_img) {
            continue;
        }
        for name in ["src", "srcset", "data-src", "data-srcset"] {
            if let Some(v) = dom::get_attr(&fallback_img, name) {
                dom::set_attr(&prev_img, name, &v);
            }
        }
    }
}

fn single_img_child(noscript: &NodeRef) -> Option<NodeRef> {
    let mut elements = noscript.children().filter(|c| c.as_element().is_some());
    let only = elements.next()?;
    if elements.next().is_some() || !dom::is_tag(&only, "IMG") {
        return None;
    }
    Some(only)
}

fn is_lazy_image(img: &NodeRef) -> bool {
    ["data-src", "data-srcset", "data-original", "data-lazy-src"]
        .iter()
        .any(|a| dom::get_attr(img, a).is_some())
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

fn replace_fonts_with_spans(body: &NodeRef) {
    let fonts: Vec<NodeRef> = body
        .select("font")
        .map(|iter| iter.map(|m| m.as_node().clone()).collect())
        .unwrap_or_default();
    for font in fonts {
        dom::rename_element(&font, "span");
    }
}

/// Replace runs of two-or-more `<br>` (whitespace-separated) with a `<p>` absorbing the
/// phrasing content that follows, per 4.3.
fn replace_brs(body: &NodeRef) {
    let brs: Vec<NodeRef> = body
        .select("br")
        .map(|iter| iter.map(|m| m.as_node().clone()).collect())
        .unwrap_or_default();

    for br in brs {
        if br.parent().is_none() {
            continue; // already absorbed by an earlier iteration
        }

        let mut next = skip_whitespace(br.next_sibling());
        let mut replaced = false;
        while let Some(next_elem) = next.clone() {
            if dom::is_tag(&next_elem, "BR") {
                replaced = true;
                let after = next_elem.next_sibling();
                next_elem.detach();
                next = skip_whitespace(after);
            } else {
                break;
            }
        }

        if !replaced {
            continue;
        }

        let p = dom::new_element("p", vec![]);
        br.insert_before(p.clone());
        br.detach();

        let mut cursor = p.next_sibling();
        while let Some(sibling) = cursor {
            if dom::is_tag(&sibling, "BR") {
                if let Some(second) = sibling.next_sibling() {
                    if dom::is_tag(&second, "BR") {
                        break;
                    }
                }
            }
            if !dom::is_phrasing_content(&sibling) {
                break;
            }
            let next_cursor = sibling.next_sibling();
            sibling.detach();
            p.append(sibling);
            cursor = next_cursor;
        }

        while let Some(first) = p.first_child() {
            if dom::is_whitespace(&first) {
                first.detach();
            } else {
                break;
            }
        }
        while let Some(last) = p.last_child() {
            if dom::is_whitespace(&last) {
                last.detach();
            } else {
                break;
            }
        }

        if let Some(parent) = p.parent() {
            if dom::is_tag(&parent, "P") {
                dom::rename_element(&parent, "div");
            }
        }
    }
}

fn skip_whitespace(mut node: Option<NodeRef>) -> Option<NodeRef> {
    while let Some(n) = &node {
        if n.as_text().map(|t| t.borrow().trim().is_empty()).unwrap_or(false) {
            node = n.next_sibling();
        } else {
            break;
        }
    }
    node
}
