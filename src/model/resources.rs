//! The three kinds of content a publication holds.

use std::fmt;

use crate::paths::stylesheet_href_from_section;
use crate::validate::escape_xml;

/// Which collection of a [`Publication`](super::Publication) an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Section,
    Stylesheet,
    Asset,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Section => "section",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Asset => "asset",
        })
    }
}

/// One content document, rendered and validated when it was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub(crate) filename: String,
    pub(crate) title: String,
    pub(crate) stylesheet: Option<String>,
    pub(crate) exclude_from_toc: bool,
    pub(crate) document: String,
}

impl Section {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Filename of the linked stylesheet, if the reference resolved.
    pub fn stylesheet(&self) -> Option<&str> {
        self.stylesheet.as_deref()
    }

    pub fn exclude_from_toc(&self) -> bool {
        self.exclude_from_toc
    }

    /// The complete XHTML document that will be written to the archive.
    pub fn document(&self) -> &str {
        &self.document
    }
}

/// A CSS resource, stored as it will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub(crate) filename: String,
    pub(crate) content: String,
}

impl Stylesheet {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A binary resource such as an image or font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub(crate) filename: String,
    pub(crate) media_type: String,
    pub(crate) data: Vec<u8>,
}

impl Asset {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Options for [`Publication::add_section`](super::Publication::add_section).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOptions {
    /// Filename of a previously added stylesheet to link from the section.
    pub css_filename: Option<String>,
    /// Leave the section out of `nav.xhtml` and `toc.ncx`. It stays in the
    /// manifest and spine.
    pub exclude_from_toc: bool,
    /// Check the rendered document for well-formedness and re-indent it.
    pub validate: bool,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            css_filename: None,
            exclude_from_toc: false,
            validate: true,
        }
    }
}

impl SectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stylesheet(mut self, css_filename: impl Into<String>) -> Self {
        self.css_filename = Some(css_filename.into());
        self
    }

    pub fn excluded_from_toc(mut self) -> Self {
        self.exclude_from_toc = true;
        self
    }

    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }
}

/// Wrap a body fragment in the XHTML envelope every section document shares.
pub(crate) fn render_section_document(
    title: &str,
    body: &str,
    stylesheet: Option<&str>,
) -> String {
    let mut doc = String::new();
    doc.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
"#,
    );
    doc.push_str(&format!("<title>{}</title>\n", escape_xml(title)));
    if let Some(css) = stylesheet {
        doc.push_str(&format!(
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>\n",
            escape_xml(&stylesheet_href_from_section(css))
        ));
    }
    doc.push_str("</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("\n</body>\n</html>");
    doc
}
