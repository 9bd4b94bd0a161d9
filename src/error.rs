//! Error types for the readability engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReadabilityError>;

/// Everything that can go wrong during a parse.
///
/// Structural failures (no body, instance reuse) terminate the parse immediately.
/// `ContentTooShort` is special: it is only ever returned when *every* fallback attempt
/// produced zero text; if any attempt produced non-zero text that attempt is returned as
/// a best-effort success instead of this error. There is no separate "unparseable input"
/// or "no content" variant: the underlying HTML5 parser always recovers into a tree (it
/// never fails outright), and a document with nothing in it surfaces as either
/// `ElementNotFound` (no `<body>`) or `ContentTooShort` (a `<body>` with no usable text).
#[derive(Debug, Error)]
pub enum ReadabilityError {
    #[error("this engine instance has already been used to parse a document")]
    AlreadyParsed,

    #[error("extracted content ({actual} chars) is below the required threshold ({threshold} chars)")]
    ContentTooShort { actual: usize, threshold: usize },

    #[error("required element not found: {0}")]
    ElementNotFound(&'static str),

    #[error("document contains more than the configured element budget ({max})")]
    TooManyElements { max: usize },

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}
