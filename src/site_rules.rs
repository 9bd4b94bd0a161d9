//! Site-specific rules (4.12 / §9): a small, fixed registry of per-publisher adjustments
//! layered on top of the generic pipeline, rather than special-cased branches inside it.
//!
//! Each rule pairs a `matcher` (tests the whole document — host, generator meta, etc.)
//! with a `hook`. `PromoteSelector` forces a specific element to be treated as the article
//! container, bypassing scoring entirely; `RemoveSelector` strips known site chrome before
//! extraction begins; `OverrideSiteName` substitutes a better site name than the generic
//! metadata ladder would find on its own.

use crate::dom;
use kuchikikiki::NodeRef;
use serde_json::Value;

pub enum SiteRuleHook {
    PromoteSelector(&'static str),
    RemoveSelector(&'static str),
    OverrideSiteName(fn(&NodeRef) -> Option<String>),
}

pub struct SiteRule {
    pub matcher: fn(&NodeRef) -> bool,
    pub hook: SiteRuleHook,
}

pub type SiteRuleSet = Vec<SiteRule>;

/// The canonical URL's host, read from `<link rel="canonical">` first, then `<meta
/// property="og:url">`. Absent on most documents; rules that need it simply won't match.
fn document_host(document: &NodeRef) -> Option<String> {
    let href = document
        .select_first("link[rel=\"canonical\"]")
        .ok()
        .and_then(|m| dom::get_attr(m.as_node(), "href"))
        .or_else(|| {
            document
                .select_first("meta[property=\"og:url\"]")
                .ok()
                .and_then(|m| dom::get_attr(m.as_node(), "content"))
        })?;
    url::Url::parse(&href).ok().and_then(|u| u.host_str().map(str::to_string))
}

fn host_ends_with(document: &NodeRef, suffix: &str) -> bool {
    document_host(document).map(|h| h.ends_with(suffix)).unwrap_or(false)
}

fn generator_contains(document: &NodeRef, needle: &str) -> bool {
    document
        .select("meta[name=\"generator\"]")
        .into_iter()
        .flatten()
        .filter_map(|m| dom::get_attr(m.as_node(), "content"))
        .any(|content| content.to_lowercase().contains(needle))
}

fn is_nytimes(document: &NodeRef) -> bool {
    host_ends_with(document, "nytimes.com")
}

fn is_firefox_nightly_blog(document: &NodeRef) -> bool {
    host_ends_with(document, "blog.nightly.mozilla.org") || host_ends_with(document, "blog.mozilla.org")
}

fn is_breitbart(document: &NodeRef) -> bool {
    host_ends_with(document, "breitbart.com")
}

fn is_wordpress(document: &NodeRef) -> bool {
    generator_contains(document, "wordpress")
}

fn is_wikimedia(document: &NodeRef) -> bool {
    host_ends_with(document, "wikipedia.org") || host_ends_with(document, "wikimedia.org")
}

/// Reads the publisher name out of the first Article-typed JSON-LD block, falling back to
/// a fixed "Wikipedia" since Wikimedia's own JSON-LD rarely carries a `publisher.name`.
fn wikimedia_site_name(document: &NodeRef) -> Option<String> {
    let scripts = document.select("script[type=\"application/ld+json\"]").ok()?;
    for script in scripts {
        let text = dom::text_content(script.as_node());
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            if let Some(name) = value.get("publisher").and_then(|p| p.get("name")).and_then(Value::as_str) {
                return Some(name.to_string());
            }
        }
    }
    Some("Wikipedia".to_string())
}

pub fn built_in_rules() -> SiteRuleSet {
    vec![
        SiteRule {
            matcher: is_nytimes,
            hook: SiteRuleHook::PromoteSelector("#story, .StoryBodyCompanionColumn"),
        },
        SiteRule {
            matcher: is_firefox_nightly_blog,
            hook: SiteRuleHook::PromoteSelector("div.entry-content"),
        },
        SiteRule {
            matcher: is_breitbart,
            hook: SiteRuleHook::PromoteSelector("article.article"),
        },
        SiteRule {
            matcher: is_wordpress,
            hook: SiteRuleHook::RemoveSelector(".nav-links, .post-navigation, .pagination"),
        },
        SiteRule {
            matcher: is_wikimedia,
            hook: SiteRuleHook::OverrideSiteName(wikimedia_site_name),
        },
    ]
}

/// Remove every element matching a `RemoveSelector` rule whose matcher fires against
/// `document`. Run once, against `body`, before the preparer mutates anything else.
pub fn apply_removals(rules: &SiteRuleSet, document: &NodeRef, body: &NodeRef) {
    for rule in rules {
        let SiteRuleHook::RemoveSelector(selector) = &rule.hook else {
            continue;
        };
        if !(rule.matcher)(document) {
            continue;
        }
        let Ok(matches) = body.select(selector) else {
            continue;
        };
        let targets: Vec<NodeRef> = matches.map(|m| m.as_node().clone()).collect();
        for target in targets {
            target.detach();
        }
    }
}

/// The selector of the first matching `PromoteSelector` rule, if any fires against `document`.
pub fn promoted_selector(rules: &SiteRuleSet, document: &NodeRef) -> Option<&'static str> {
    rules.iter().find_map(|rule| {
        if !(rule.matcher)(document) {
            return None;
        }
        match &rule.hook {
            SiteRuleHook::PromoteSelector(selector) => Some(*selector),
            _ => None,
        }
    })
}

/// The site name produced by the first matching `OverrideSiteName` rule, if any fires.
pub fn site_name_override(rules: &SiteRuleSet, document: &NodeRef) -> Option<String> {
    rules.iter().find_map(|rule| {
        if !(rule.matcher)(document) {
            return None;
        }
        match &rule.hook {
            SiteRuleHook::OverrideSiteName(f) => f(document),
            _ => None,
        }
    })
}
