//! Metadata extractor (4.4): title, byline, excerpt, site name, published time, dir/lang.
//!
//! Reads from a snapshot of the unmutated document (selected from `<head>` plus `<html>`)
//! before the preparer rewrites anything, following the reference's "read before mutate"
//! ordering (5's "metadata extractor reads the DOM's `<head>` before structural mutation").

use crate::dom;
use crate::options::ReadabilityOptions;
use crate::utils;
use kuchikikiki::NodeRef;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    pub dir: Option<String>,
    pub lang: Option<String>,
}

/// One `<meta>` tag's resolved `(keys, content)`, keys split on whitespace since
/// `property="a b"` names more than one metadata key at once (4.4).
struct MetaEntry {
    keys: Vec<String>,
    content: String,
}

fn collect_meta(document: &NodeRef) -> Vec<MetaEntry> {
    let mut out = Vec::new();
    let Ok(metas) = document.select("meta") else {
        return out;
    };
    for meta in metas {
        let node = meta.as_node();
        // html5ever decodes entity references while tokenizing attribute values, so
        // `content` here is already unescaped; no separate unescape pass is needed.
        let content = match dom::get_attr(node, "content") {
            Some(c) if !c.trim().is_empty() => c,
            _ => continue,
        };
        let mut keys = Vec::new();
        for attr in ["property", "name"] {
            if let Some(v) = dom::get_attr(node, attr) {
                keys.extend(v.split_whitespace().map(str::to_string));
            }
        }
        if !keys.is_empty() {
            out.push(MetaEntry { keys, content });
        }
    }
    out
}

fn lookup<'a>(entries: &'a [MetaEntry], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|e| e.keys.iter().any(|k| k == key))
        .map(|e| e.content.as_str())
}

/// Parse every `<script type="application/ld+json">` block, returning the first object
/// whose `@type` matches `REGEXPS.json_ld_article_types`.
fn find_json_ld_article(document: &NodeRef) -> Option<Value> {
    let scripts = document.select("script[type=\"application/ld+json\"]").ok()?;
    for script in scripts {
        let text = dom::text_content(script.as_node());
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        let candidates: Vec<&Value> = match &value {
            Value::Array(items) => items.iter().collect(),
            _ => vec![&value],
        };
        for candidate in candidates {
            if let Some(Value::String(ty)) = candidate.get("@type") {
                if crate::constants::REGEXPS.json_ld_article_types.is_match(ty) {
                    return Some(candidate.clone());
                }
            }
        }
    }
    None
}

fn json_ld_author(value: &Value) -> Option<String> {
    match value.get("author")? {
        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => {
            let names: Vec<String> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn json_ld_site_name(value: &Value) -> Option<String> {
    value
        .get("publisher")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Extract article metadata. `document` is the whole parsed document (including `<head>`);
/// `body` is used only for dir/lang ancestor resolution relative to the article container.
pub fn extract_metadata(
    document: &NodeRef,
    article_container: Option<&NodeRef>,
    options: &ReadabilityOptions,
) -> Metadata {
    let entries = collect_meta(document);
    let json_ld = if options.disable_json_ld {
        None
    } else {
        find_json_ld_article(document)
    };

    let title = extract_title(document, &entries, json_ld.as_ref());
    let byline = json_ld
        .as_ref()
        .and_then(json_ld_author)
        .or_else(|| lookup(&entries, "dc:creator").map(str::to_string))
        .or_else(|| lookup(&entries, "author").map(str::to_string))
        .or_else(|| lookup(&entries, "parsely-author").map(str::to_string))
        .or_else(|| lookup(&entries, "weibo:webpage:creator").map(str::to_string))
        .or_else(|| lookup(&entries, "twitter:creator").map(str::to_string))
        .or_else(|| lookup(&entries, "og:author").map(str::to_string));

    let excerpt = json_ld
        .as_ref()
        .and_then(|v| v.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| lookup(&entries, "dc:description").map(str::to_string))
        .or_else(|| lookup(&entries, "og:description").map(str::to_string))
        .or_else(|| lookup(&entries, "weibo:webpage:description").map(str::to_string))
        .or_else(|| lookup(&entries, "description").map(str::to_string))
        .or_else(|| lookup(&entries, "twitter:description").map(str::to_string));

    let site_name = json_ld
        .as_ref()
        .and_then(json_ld_site_name)
        .or_else(|| lookup(&entries, "og:site_name").map(str::to_string))
        .or_else(|| lookup(&entries, "twitter:site").map(str::to_string))
        .or_else(|| lookup(&entries, "dc:publisher").map(str::to_string));

    let published_time = json_ld
        .as_ref()
        .and_then(|v| v.get("datePublished"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| lookup(&entries, "article:published_time").map(str::to_string))
        .or_else(|| lookup(&entries, "parsely-pub-date").map(str::to_string));

    let (dir, lang) = extract_dir_lang(document, article_container);

    Metadata {
        title,
        byline,
        excerpt,
        site_name,
        published_time,
        dir,
        lang,
    }
}

fn extract_title(document: &NodeRef, entries: &[MetaEntry], json_ld: Option<&Value>) -> String {
    let raw = json_ld
        .and_then(|v| v.get("headline"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| lookup(entries, "dc:title").map(str::to_string))
        .or_else(|| lookup(entries, "dcterm:title").map(str::to_string))
        .or_else(|| lookup(entries, "og:title").map(str::to_string))
        .or_else(|| lookup(entries, "twitter:title").map(str::to_string))
        .or_else(|| lookup(entries, "parsely-title").map(str::to_string))
        .or_else(|| {
            document
                .select_first("title")
                .ok()
                .map(|t| dom::get_inner_text(t.as_node(), true))
        })
        .unwrap_or_default();

    resolve_title_split(document, &raw)
}

/// When the chosen title contains a separator, decide which side wins by comparing each
/// side against the page's `<h1>` text (4.4).
fn resolve_title_split(document: &NodeRef, raw: &str) -> String {
    let Some((left, right)) = utils::split_title(raw) else {
        return raw.trim().to_string();
    };
    let (left, right) = (left.trim(), right.trim());

    let h1_text = document
        .select_first("h1")
        .ok()
        .map(|h| dom::get_inner_text(h.as_node(), true));

    if let Some(h1) = &h1_text {
        if utils::token_similarity(left, h1) > 0.75 {
            return left.to_string();
        }
        if utils::token_similarity(right, h1) > 0.75 {
            return right.to_string();
        }
    }

    if left.len() >= right.len() {
        left.to_string()
    } else {
        right.to_string()
    }
}

fn extract_dir_lang(document: &NodeRef, article_container: Option<&NodeRef>) -> (Option<String>, Option<String>) {
    let mut dir = None;
    let mut lang = None;

    if let Some(container) = article_container {
        for ancestor in std::iter::once(container.clone()).chain(dom::get_node_ancestors(container, 0)) {
            if dir.is_none() {
                dir = dom::get_attr(&ancestor, "dir");
            }
            if lang.is_none() {
                lang = dom::get_attr(&ancestor, "lang");
            }
            if dir.is_some() && lang.is_some() {
                break;
            }
        }
    }

    if dir.is_none() || lang.is_none() {
        if let Ok(html) = document.select_first("html") {
            if dir.is_none() {
                dir = dom::get_attr(html.as_node(), "dir");
            }
            if lang.is_none() {
                lang = dom::get_attr(html.as_node(), "lang");
            }
        }
    }

    dir = dir.filter(|d| matches!(d.as_str(), "ltr" | "rtl" | "auto"));
    (dir, lang)
}
