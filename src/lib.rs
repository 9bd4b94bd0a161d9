//! A readable-content extraction engine for web pages, in the spirit of Mozilla's
//! Readability: given raw HTML, produces a cleaned article container plus metadata
//! (title, byline, excerpt, site name, publish time, direction/language).
//!
//! ```no_run
//! let html = "<html><body><article><h1>Hi</h1><p>...</p></article></body></html>";
//! let result = lucidread::parse(html, None, None).unwrap();
//! println!("{}", result.title);
//! ```

pub mod candidate_selector;
pub mod cleaner;
pub mod constants;
pub mod content_extractor;
pub mod dom;
pub mod error;
pub mod metadata;
pub mod node_cleaner;
pub mod options;
pub mod preparer;
pub mod scoring;
pub mod sibling_merger;
pub mod site_rules;
pub mod utils;

use constants::ParseFlags;
use error::{ReadabilityError, Result};
use options::ReadabilityOptions;
use url::Url;

/// The outcome of a successful parse.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub title: String,
    pub byline: Option<String>,
    pub dir: Option<String>,
    pub lang: Option<String>,
    /// Serialized HTML fragment, rooted at `<div id="readability-page-1" class="page">`.
    pub content: String,
    /// Whitespace-normalized inner text of `content`.
    pub text_content: String,
    /// Unicode scalar count of `text_content`.
    pub length: usize,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
}

/// The fallback attempt sequence (4.10): each entry clears one more flag than the last,
/// in this order, so the first attempt is the strictest and the last is the most lenient.
fn attempt_flags() -> [ParseFlags; 4] {
    [
        ParseFlags::STRIP_UNLIKELYS | ParseFlags::WEIGHT_CLASSES | ParseFlags::CLEAN_CONDITIONALLY,
        ParseFlags::WEIGHT_CLASSES | ParseFlags::CLEAN_CONDITIONALLY,
        ParseFlags::CLEAN_CONDITIONALLY,
        ParseFlags::empty(),
    ]
}

/// A single-use extraction engine over one HTML document.
///
/// Construct with [`Engine::new`], then call [`Engine::parse`] exactly once; a second call
/// returns [`ReadabilityError::AlreadyParsed`]. Owning the instance this way (rather than
/// consuming `self` in `parse`) matches the reference's reusable-but-guarded object, and
/// lets callers hold onto the instance across the call for diagnostics.
pub struct Engine {
    html: String,
    base_url: Option<Url>,
    options: ReadabilityOptions,
    parsed: bool,
}

impl Engine {
    /// Build a new engine over `html`. `base_url`, if given, must parse as an absolute URL.
    pub fn new(html: impl Into<String>, base_url: Option<&str>, options: Option<ReadabilityOptions>) -> Result<Self> {
        let base_url = base_url.map(Url::parse).transpose()?;
        Ok(Self {
            html: html.into(),
            base_url,
            options: options.unwrap_or_default(),
            parsed: false,
        })
    }

    /// Run the full pipeline once: prepare, snapshot metadata, extract with fallback,
    /// select, merge, clean, and serialize.
    pub fn parse(&mut self) -> Result<ParseResult> {
        if self.parsed {
            return Err(ReadabilityError::AlreadyParsed);
        }
        self.parsed = true;

        let document = kuchikikiki::parse_html().one(self.html.as_str());

        if self.options.max_elems_to_parse > 0 {
            let count = dom::count_descendants(&document);
            if count > self.options.max_elems_to_parse {
                log::debug!("document has {count} elements, exceeding the configured budget");
                return Err(ReadabilityError::TooManyElements {
                    max: self.options.max_elems_to_parse,
                });
            }
        }

        let body = document
            .select_first("body")
            .ok()
            .map(|m| m.as_node().clone())
            .ok_or(ReadabilityError::ElementNotFound("body"))?;

        let rules = site_rules::built_in_rules();
        site_rules::apply_removals(&rules, &document, &body);

        let mut meta = metadata::extract_metadata(&document, None, &self.options);
        if let Some(name) = site_rules::site_name_override(&rules, &document) {
            meta.site_name = Some(name);
        }
        log::trace!("resolved title {:?}, byline {:?}", meta.title, meta.byline);

        let is_rtl = meta.dir.as_deref() == Some("rtl");

        preparer::prepare(&body);
        let snapshot = dom::clone_element(&body);

        let mut byline = meta.byline.clone();

        let promoted = site_rules::promoted_selector(&rules, &document)
            .and_then(|selector| snapshot.select_first(selector).ok())
            .map(|m| dom::clone_element(&m.as_node().clone()));

        let (best, best_flags, accepted) = if let Some(container) = promoted {
            log::debug!("site rule promoted a selector match; skipping scoring for this attempt");
            let text_length = utils::char_count(&dom::get_inner_text(&container, true));
            (
                content_extractor::AttemptResult {
                    container,
                    text_length,
                    needed_to_create: false,
                },
                attempt_flags()[0],
                true,
            )
        } else {
            let mut best: Option<content_extractor::AttemptResult> = None;
            let mut best_flags = attempt_flags()[0];
            let mut accepted = false;

            for &flags in attempt_flags().iter() {
                let attempt_body = dom::clone_element(&snapshot);
                let mut attempt_byline = byline.clone();
                let result = content_extractor::run_attempt(
                    &attempt_body,
                    &meta.title,
                    &mut attempt_byline,
                    flags,
                    self.options.link_density_modifier,
                    self.options.nb_top_candidates,
                    is_rtl,
                );
                log::debug!(
                    "attempt with flags {flags:?} produced {} chars (needed_to_create={})",
                    result.text_length,
                    result.needed_to_create
                );

                let better = best.as_ref().map(|b| result.text_length > b.text_length).unwrap_or(true);
                if better {
                    byline = attempt_byline;
                    best_flags = flags;
                    best = Some(result);
                }

                if best.as_ref().unwrap().text_length >= self.options.char_threshold {
                    accepted = true;
                    break;
                }
            }

            (best.expect("attempt_flags() is non-empty"), best_flags, accepted)
        };

        if !accepted && best.text_length == 0 {
            return Err(ReadabilityError::ContentTooShort {
                actual: 0,
                threshold: self.options.char_threshold,
            });
        }

        cleaner::clean_article(&best.container, &self.options, best_flags, self.base_url.as_ref());

        let page = dom::new_element("div", vec![("id", "readability-page-1".into()), ("class", "page".into())]);
        while let Some(child) = best.container.first_child() {
            child.detach();
            page.append(child);
        }

        let text_content = dom::get_inner_text(&page, true);
        let length = utils::char_count(&text_content);
        let content = dom::serialize_to_string(&page);

        Ok(ParseResult {
            title: meta.title,
            byline,
            dir: meta.dir,
            lang: meta.lang,
            content,
            text_content,
            length,
            excerpt: meta.excerpt,
            site_name: meta.site_name,
            published_time: meta.published_time,
        })
    }
}

/// Convenience entry point: parse `html` once with a fresh engine instance.
pub fn parse(html: &str, base_url: Option<&str>, options: Option<ReadabilityOptions>) -> Result<ParseResult> {
    Engine::new(html, base_url, options)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_article() {
        let html = r#"<html><head><title>Hi</title></head><body><article><h1>Hi</h1>
            <p>Paragraph with enough commas, and content, to clear the threshold easily.</p>
            </article></body></html>"#;
        let opts = ReadabilityOptions::builder().char_threshold(20).build();
        let result = parse(html, None, Some(opts)).unwrap();
        assert_eq!(result.title, "Hi");
        assert!(result.content.contains("readability-page-1"));
        assert!(result.text_content.contains("Paragraph with"));
    }

    #[test]
    fn second_parse_on_same_engine_fails() {
        let html = "<html><body><p>Short.</p></body></html>";
        let mut engine = Engine::new(html, None, None).unwrap();
        let _ = engine.parse();
        assert!(matches!(engine.parse(), Err(ReadabilityError::AlreadyParsed)));
    }

    #[test]
    fn empty_body_yields_content_too_short() {
        // An HTML5-compliant parser always synthesizes a <body>, so this exercises the
        // "every attempt produced zero text" failure path rather than ElementNotFound.
        let html = "<html><body></body></html>";
        let result = parse(html, None, None);
        assert!(matches!(result, Err(ReadabilityError::ContentTooShort { actual: 0, .. })));
    }

    #[test]
    fn falls_back_to_best_effort_when_below_threshold() {
        let html = "<html><body><p>Short paragraph.</p></body></html>";
        let opts = ReadabilityOptions::builder().char_threshold(5000).build();
        let result = parse(html, None, Some(opts)).unwrap();
        assert!(result.length > 0);
    }

    #[test]
    fn resolves_relative_urls_against_base() {
        let html = r#"<html><body><article><p>Text with a <a href="/page">link</a> and plenty more content, here, to pass threshold.</p></article></body></html>"#;
        let opts = ReadabilityOptions::builder().char_threshold(10).build();
        let result = parse(html, Some("https://example.com/dir/"), Some(opts)).unwrap();
        assert!(result.content.contains("https://example.com/page"));
    }

    #[test]
    fn wordpress_generator_strips_nav_links_before_extraction() {
        let html = r#"<html><head><meta name="generator" content="WordPress 6.4"></head>
            <body><article>
                <p>A full paragraph of article text, with enough commas, and length, to pass the threshold comfortably.</p>
                <div class="nav-links">Previous post / Next post</div>
            </article></body></html>"#;
        let opts = ReadabilityOptions::builder().char_threshold(20).build();
        let result = parse(html, None, Some(opts)).unwrap();
        assert!(!result.text_content.contains("Previous post"));
        assert!(result.text_content.contains("full paragraph"));
    }

    #[test]
    fn nytimes_host_promotes_story_container_directly() {
        let html = r#"<html><head><link rel="canonical" href="https://www.nytimes.com/2024/1/1/us/story.html"></head>
            <body>
                <div id="story"><p>The promoted story body, long enough to clear any threshold on its own merits.</p></div>
                <div class="ad">Unrelated ad copy that should never appear in the result.</div>
            </body></html>"#;
        let opts = ReadabilityOptions::builder().char_threshold(20).build();
        let result = parse(html, None, Some(opts)).unwrap();
        assert!(result.text_content.contains("promoted story body"));
        assert!(!result.text_content.contains("Unrelated ad copy"));
    }
}
