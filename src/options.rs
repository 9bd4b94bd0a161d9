//! Runtime configuration surface for a parse.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Default regex matching src hosts that are allowed to survive conditional cleaning
/// even when embedded as `<iframe>`/`<embed>`/`<object>`.
static DEFAULT_ALLOWED_VIDEO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq|bilibili|live.bilibili)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    )
    .unwrap()
});

/// Options accepted by [`crate::Engine::new`].
///
/// Mirrors the reference implementation's option surface one-to-one; see each field's doc
/// comment for the runtime effect it has (or explicitly does not have).
#[derive(Debug, Clone)]
pub struct ReadabilityOptions {
    /// Minimum `textContent` length (Unicode scalars) for an attempt to be accepted outright.
    pub char_threshold: usize,
    /// Size of the bounded top-N candidate set.
    pub nb_top_candidates: usize,
    /// Class names retained verbatim when stripping classes in the article cleaner.
    /// `caption` and `page` are always implicitly preserved in addition to this set.
    pub classes_to_preserve: HashSet<String>,
    /// If set, classes are preserved wholesale and presentational attributes are kept.
    pub keep_classes: bool,
    /// Skip the JSON-LD metadata source entirely.
    pub disable_json_ld: bool,
    /// Regex matched against embed `src` attributes; a match survives conditional cleaning.
    pub allowed_video_regex: Regex,
    /// Additive adjustment applied to the `(1 - link_density)` term when scoring.
    pub link_density_modifier: f64,
    /// Upper bound on total elements parsed; `0` means unlimited. When exceeded the parse
    /// fails fast with [`crate::error::ReadabilityError::TooManyElements`].
    pub max_elems_to_parse: usize,
}

impl Default for ReadabilityOptions {
    fn default() -> Self {
        Self {
            char_threshold: 500,
            nb_top_candidates: 5,
            classes_to_preserve: HashSet::new(),
            keep_classes: false,
            disable_json_ld: false,
            allowed_video_regex: DEFAULT_ALLOWED_VIDEO_REGEX.clone(),
            link_density_modifier: 0.0,
            max_elems_to_parse: 0,
        }
    }
}

impl ReadabilityOptions {
    pub fn builder() -> ReadabilityOptionsBuilder {
        ReadabilityOptionsBuilder::default()
    }

    /// Class names that survive class-stripping regardless of `classes_to_preserve`.
    pub fn is_class_preserved(&self, class: &str) -> bool {
        class == "caption" || class == "page" || self.classes_to_preserve.contains(class)
    }
}

/// Fluent builder for [`ReadabilityOptions`], matching the teacher's builder-style API.
#[derive(Debug, Default)]
pub struct ReadabilityOptionsBuilder {
    opts: OptionalFields,
}

#[derive(Debug, Default)]
struct OptionalFields {
    char_threshold: Option<usize>,
    nb_top_candidates: Option<usize>,
    classes_to_preserve: Option<HashSet<String>>,
    keep_classes: Option<bool>,
    disable_json_ld: Option<bool>,
    allowed_video_regex: Option<Regex>,
    link_density_modifier: Option<f64>,
    max_elems_to_parse: Option<usize>,
}

impl ReadabilityOptionsBuilder {
    pub fn char_threshold(mut self, value: usize) -> Self {
        self.opts.char_threshold = Some(value);
        self
    }

    pub fn nb_top_candidates(mut self, value: usize) -> Self {
        self.opts.nb_top_candidates = Some(value);
        self
    }

    pub fn classes_to_preserve<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.classes_to_preserve = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn keep_classes(mut self, value: bool) -> Self {
        self.opts.keep_classes = Some(value);
        self
    }

    pub fn disable_json_ld(mut self, value: bool) -> Self {
        self.opts.disable_json_ld = Some(value);
        self
    }

    pub fn allowed_video_regex(mut self, regex: Regex) -> Self {
        self.opts.allowed_video_regex = Some(regex);
        self
    }

    pub fn link_density_modifier(mut self, value: f64) -> Self {
        self.opts.link_density_modifier = Some(value);
        self
    }

    pub fn max_elems_to_parse(mut self, value: usize) -> Self {
        self.opts.max_elems_to_parse = Some(value);
        self
    }

    pub fn build(self) -> ReadabilityOptions {
        let defaults = ReadabilityOptions::default();
        ReadabilityOptions {
            char_threshold: self.opts.char_threshold.unwrap_or(defaults.char_threshold),
            nb_top_candidates: self
                .opts
                .nb_top_candidates
                .unwrap_or(defaults.nb_top_candidates),
            classes_to_preserve: self
                .opts
                .classes_to_preserve
                .unwrap_or(defaults.classes_to_preserve),
            keep_classes: self.opts.keep_classes.unwrap_or(defaults.keep_classes),
            disable_json_ld: self
                .opts
                .disable_json_ld
                .unwrap_or(defaults.disable_json_ld),
            allowed_video_regex: self
                .opts
                .allowed_video_regex
                .unwrap_or(defaults.allowed_video_regex),
            link_density_modifier: self
                .opts
                .link_density_modifier
                .unwrap_or(defaults.link_density_modifier),
            max_elems_to_parse: self
                .opts
                .max_elems_to_parse
                .unwrap_or(defaults.max_elems_to_parse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference() {
        let opts = ReadabilityOptions::default();
        assert_eq!(opts.char_threshold, 500);
        assert_eq!(opts.nb_top_candidates, 5);
        assert!(!opts.keep_classes);
        assert!(opts.is_class_preserved("caption"));
        assert!(opts.is_class_preserved("page"));
        assert!(!opts.is_class_preserved("sidebar"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let opts = ReadabilityOptions::builder()
            .char_threshold(100)
            .classes_to_preserve(["highlight"])
            .build();
        assert_eq!(opts.char_threshold, 100);
        assert!(opts.is_class_preserved("highlight"));
    }
}
