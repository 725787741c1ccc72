//! Internal archive paths and the hrefs that point at them.
//!
//! Entry names always use forward slashes. Hrefs are relative to the file
//! that contains them and are percent-encoded segment by segment; entry names
//! are not encoded.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

pub const MIMETYPE: &str = "mimetype";
pub const CONTAINER_XML: &str = "META-INF/container.xml";

/// Directory holding the package document and every publication resource.
pub const PACKAGE_DIR: &str = "EPUB";
/// Subdirectory of [`PACKAGE_DIR`] holding section documents.
pub const SECTION_DIR: &str = "xhtml";

pub const PACKAGE_DOCUMENT: &str = "package.opf";
pub const NAV_DOCUMENT: &str = "nav.xhtml";
pub const NCX_DOCUMENT: &str = "toc.ncx";

/// Characters that may not appear unescaped in a path segment of an href.
const HREF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Archive entry for a file that lives beside the package document.
pub fn package_entry(filename: &str) -> String {
    format!("{PACKAGE_DIR}/{filename}")
}

/// Archive entry for a section document.
pub fn section_entry(filename: &str) -> String {
    format!("{PACKAGE_DIR}/{SECTION_DIR}/{filename}")
}

/// Href of a stylesheet or asset, relative to the package document.
pub fn resource_href(filename: &str) -> String {
    encode_href(filename)
}

/// Href of a section, relative to the package document (and to the
/// navigation document, which sits beside it).
pub fn section_href(filename: &str) -> String {
    format!("{SECTION_DIR}/{}", encode_href(filename))
}

/// Href of a stylesheet as seen from a section document one directory down.
pub fn stylesheet_href_from_section(filename: &str) -> String {
    format!("../{}", encode_href(filename))
}

fn encode_href(path: &str) -> String {
    utf8_percent_encode(path, HREF_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries() {
        assert_eq!(package_entry(PACKAGE_DOCUMENT), "EPUB/package.opf");
        assert_eq!(package_entry("css/epub.css"), "EPUB/css/epub.css");
        assert_eq!(section_entry("section1.xhtml"), "EPUB/xhtml/section1.xhtml");
    }

    #[test]
    fn test_hrefs() {
        assert_eq!(section_href("section1.xhtml"), "xhtml/section1.xhtml");
        assert_eq!(stylesheet_href_from_section("epub.css"), "../epub.css");
        assert_eq!(resource_href("images/cover.png"), "images/cover.png");
    }

    #[test]
    fn test_hrefs_are_percent_encoded() {
        assert_eq!(section_href("chapter one.xhtml"), "xhtml/chapter%20one.xhtml");
        assert_eq!(resource_href("caf\u{e9}#1.png"), "caf%C3%A9%231.png");
    }
}
