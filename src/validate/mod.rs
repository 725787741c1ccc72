//! Content validation and normalization.
//!
//! Both validators parse their input, fail with a [`ValidationError`] on
//! malformed content, and otherwise return a canonically reformatted copy.
//! Reformatting is deterministic, so the same input always yields the same
//! bytes in the packaged archive.

mod css;
mod xml;

use thiserror::Error;

pub use css::prettify_css;
pub use xml::prettify_xml;

/// Reason a markup or stylesheet fragment was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed markup at byte {position}: {message}")]
    Markup { position: u64, message: String },

    #[error("malformed stylesheet at line {line}, column {column}: {message}")]
    Stylesheet {
        line: u32,
        column: u32,
        message: String,
    },
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Whether `c` may start an XML name (ignoring the `:` namespace separator).
pub(crate) fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Whether `c` may appear after the first character of an XML name.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '.' | '_')
}

/// Whether `s` is a non-empty XML name without a namespace prefix.
pub(crate) fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}
