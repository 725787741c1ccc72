//! Rules for the filenames callers give to sections and resources.

use crate::error::{Error, Result};
use crate::paths::{NAV_DOCUMENT, NCX_DOCUMENT, PACKAGE_DOCUMENT, SECTION_DIR};

use super::ResourceKind;

/// Check that `filename` is a clean relative path inside the package.
///
/// Sections live in a flat directory, so their names may not contain `/`.
pub(crate) fn check_filename(kind: ResourceKind, filename: &str) -> Result<()> {
    let reason = if filename.is_empty() {
        Some("filename is empty")
    } else if filename.starts_with('/') {
        Some("filename must be relative")
    } else if filename.contains('\\') {
        Some("filename must use forward slashes")
    } else if kind == ResourceKind::Section && filename.contains('/') {
        Some("section filenames cannot contain directories")
    } else if filename
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        Some("filename has an empty, '.' or '..' path segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidFilename {
            kind,
            filename: filename.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Whether a stylesheet or asset would land on a path the packager owns.
pub(crate) fn is_reserved(filename: &str) -> bool {
    filename == PACKAGE_DOCUMENT
        || filename == NAV_DOCUMENT
        || filename == NCX_DOCUMENT
        || filename == SECTION_DIR
        || filename
            .strip_prefix(SECTION_DIR)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_and_nested_names() {
        assert!(check_filename(ResourceKind::Section, "section1.xhtml").is_ok());
        assert!(check_filename(ResourceKind::Stylesheet, "css/epub.css").is_ok());
        assert!(check_filename(ResourceKind::Asset, "images/a b.png").is_ok());
    }

    #[test]
    fn test_rejects_bad_names() {
        for name in ["", "/abs.css", "a\\b.css", "a//b.css", "../up.css", "./x.css", "dir/"] {
            assert!(
                matches!(
                    check_filename(ResourceKind::Stylesheet, name),
                    Err(Error::InvalidFilename { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_sections_are_flat() {
        assert!(check_filename(ResourceKind::Section, "part1/ch1.xhtml").is_err());
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("package.opf"));
        assert!(is_reserved("nav.xhtml"));
        assert!(is_reserved("toc.ncx"));
        assert!(is_reserved("xhtml/image.png"));
        assert!(!is_reserved("xhtml-notes.css"));
        assert!(!is_reserved("epub.css"));
    }
}
