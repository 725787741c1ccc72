//! The in-memory publication a caller builds up before packaging.
//!
//! Every `add_*` call checks its input straight away: filename rules and
//! uniqueness first, then content validation. A failed call leaves the
//! publication exactly as it was. Registration order is kept and becomes the
//! manifest, spine and table-of-contents order.

mod filename;
mod media_type;
mod resources;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::validate::{prettify_css, prettify_xml};

use filename::{check_filename, is_reserved};

pub use media_type::guess_media_type;
pub use resources::{Asset, ResourceKind, Section, SectionOptions, Stylesheet};

/// Publication metadata (Dublin Core).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubOptions {
    /// Unique identifier, e.g. `urn:uuid:...`.
    pub identifier: String,
    pub title: String,
    /// Language code such as `en`. Not validated beyond being copied through.
    pub language: String,
    pub author: Option<String>,
}

impl EpubOptions {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            language: language.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// What to do when a section names a stylesheet that was never added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Fail the `add_section` call with [`Error::UnresolvedReference`].
    #[default]
    Reject,
    /// Add the section without a stylesheet link.
    Ignore,
}

/// A publication under construction.
///
/// # Example
///
/// ```
/// use epubpack::{EpubOptions, Publication, SectionOptions};
///
/// let mut publication = Publication::new(EpubOptions::new(
///     "urn:uuid:38e9a65c-8077-45b7-a59e-8d0ae827ca5f",
///     "My title",
///     "en",
/// ));
/// publication.add_stylesheet("epub.css", "h1 { text-align: center; }")?;
/// publication.add_section(
///     "section1.xhtml",
///     "First section",
///     "<h1>Hello world</h1>",
///     SectionOptions::new().with_stylesheet("epub.css"),
/// )?;
/// # Ok::<(), epubpack::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Publication {
    options: EpubOptions,
    reference_policy: ReferencePolicy,
    sections: Vec<Section>,
    stylesheets: Vec<Stylesheet>,
    assets: Vec<Asset>,
}

impl Publication {
    pub fn new(options: EpubOptions) -> Self {
        Self {
            options,
            reference_policy: ReferencePolicy::default(),
            sections: Vec::new(),
            stylesheets: Vec::new(),
            assets: Vec::new(),
        }
    }

    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    pub fn options(&self) -> &EpubOptions {
        &self.options
    }

    pub fn identifier(&self) -> &str {
        &self.options.identifier
    }

    pub fn title(&self) -> &str {
        &self.options.title
    }

    pub fn language(&self) -> &str {
        &self.options.language
    }

    /// The author, if one was given and is not blank.
    pub fn author(&self) -> Option<&str> {
        self.options
            .author
            .as_deref()
            .filter(|author| !author.trim().is_empty())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn stylesheet(&self, filename: &str) -> Option<&Stylesheet> {
        self.stylesheets.iter().find(|s| s.filename == filename)
    }

    /// Add a stylesheet, validating and reformatting its content.
    pub fn add_stylesheet(&mut self, filename: impl Into<String>, content: &str) -> Result<()> {
        self.insert_stylesheet(filename.into(), content, true)
    }

    /// Add a stylesheet exactly as given, without validation.
    pub fn add_raw_stylesheet(
        &mut self,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        let content = content.into();
        self.insert_stylesheet(filename.into(), &content, false)
    }

    fn insert_stylesheet(&mut self, filename: String, content: &str, validate: bool) -> Result<()> {
        let kind = ResourceKind::Stylesheet;
        check_filename(kind, &filename)?;
        if self.stylesheet(&filename).is_some() {
            return Err(Error::DuplicateResource { kind, filename });
        }
        self.check_package_path(kind, &filename)?;

        let content = if validate {
            match prettify_css(content) {
                Ok(css) => css,
                Err(source) => {
                    return Err(Error::InvalidContent {
                        kind,
                        filename,
                        source,
                    });
                }
            }
        } else {
            content.to_string()
        };

        debug!(%filename, validate, bytes = content.len(), "added stylesheet");
        self.stylesheets.push(Stylesheet { filename, content });
        Ok(())
    }

    /// Add a binary asset, deriving its media type from the extension.
    pub fn add_asset(&mut self, filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<()> {
        let filename = filename.into();
        let media_type = guess_media_type(&filename);
        self.insert_asset(filename, data.into(), media_type.to_string())
    }

    /// Add a binary asset with an explicit media type.
    pub fn add_asset_with_media_type(
        &mut self,
        filename: impl Into<String>,
        data: impl Into<Vec<u8>>,
        media_type: impl Into<String>,
    ) -> Result<()> {
        self.insert_asset(filename.into(), data.into(), media_type.into())
    }

    fn insert_asset(&mut self, filename: String, data: Vec<u8>, media_type: String) -> Result<()> {
        let kind = ResourceKind::Asset;
        check_filename(kind, &filename)?;
        if self.assets.iter().any(|a| a.filename == filename) {
            return Err(Error::DuplicateResource { kind, filename });
        }
        self.check_package_path(kind, &filename)?;

        debug!(%filename, %media_type, bytes = data.len(), "added asset");
        self.assets.push(Asset {
            filename,
            media_type,
            data,
        });
        Ok(())
    }

    /// Add a section whose `body` goes between the `<body>` tags.
    ///
    /// The full XHTML document is rendered now, and validated unless
    /// `options.validate` is false, so malformed markup is reported by this
    /// call rather than at packaging time.
    pub fn add_section(
        &mut self,
        filename: impl Into<String>,
        title: impl Into<String>,
        body: &str,
        options: SectionOptions,
    ) -> Result<()> {
        let kind = ResourceKind::Section;
        let filename = filename.into();
        let title = title.into();
        check_filename(kind, &filename)?;
        if self.sections.iter().any(|s| s.filename == filename) {
            return Err(Error::DuplicateResource { kind, filename });
        }

        let stylesheet = match options.css_filename {
            Some(css) if self.stylesheet(&css).is_some() => Some(css),
            Some(css) => match self.reference_policy {
                ReferencePolicy::Reject => {
                    return Err(Error::UnresolvedReference {
                        section: filename,
                        stylesheet: css,
                    });
                }
                ReferencePolicy::Ignore => {
                    warn!(section = %filename, stylesheet = %css, "ignoring unknown stylesheet");
                    None
                }
            },
            None => None,
        };

        let document = resources::render_section_document(&title, body, stylesheet.as_deref());
        let document = if options.validate {
            match prettify_xml(&document) {
                Ok(xml) => xml,
                Err(source) => {
                    return Err(Error::InvalidContent {
                        kind,
                        filename,
                        source,
                    });
                }
            }
        } else {
            document
        };

        debug!(
            %filename,
            validate = options.validate,
            exclude_from_toc = options.exclude_from_toc,
            "added section"
        );
        self.sections.push(Section {
            filename,
            title,
            stylesheet,
            exclude_from_toc: options.exclude_from_toc,
            document,
        });
        Ok(())
    }

    /// Stylesheets and assets share the package directory; make sure a new
    /// one does not land on a path that is already taken.
    fn check_package_path(&self, kind: ResourceKind, filename: &str) -> Result<()> {
        let taken = is_reserved(filename)
            || self.stylesheets.iter().any(|s| s.filename == filename)
            || self.assets.iter().any(|a| a.filename == filename);
        if taken {
            return Err(Error::PathConflict {
                kind,
                filename: filename.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publication() -> Publication {
        Publication::new(EpubOptions::new("urn:uuid:1", "My title", "en"))
    }

    #[test]
    fn test_sections_keep_registration_order() {
        let mut p = publication();
        for name in ["c.xhtml", "a.xhtml", "b.xhtml"] {
            p.add_section(name, name, "<p/>", SectionOptions::new()).unwrap();
        }
        let names: Vec<_> = p.sections().iter().map(Section::filename).collect();
        assert_eq!(names, ["c.xhtml", "a.xhtml", "b.xhtml"]);
    }

    #[test]
    fn test_duplicate_section_leaves_first_untouched() {
        let mut p = publication();
        p.add_section("s.xhtml", "First", "<p>one</p>", SectionOptions::new())
            .unwrap();
        let err = p
            .add_section("s.xhtml", "Second", "<p>two</p>", SectionOptions::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateResource {
                kind: ResourceKind::Section,
                ..
            }
        ));
        assert_eq!(p.sections().len(), 1);
        assert_eq!(p.sections()[0].title(), "First");
    }

    #[test]
    fn test_duplicate_stylesheet_and_asset() {
        let mut p = publication();
        p.add_stylesheet("epub.css", "p { margin: 0 }").unwrap();
        assert!(matches!(
            p.add_stylesheet("epub.css", "h1 { margin: 0 }"),
            Err(Error::DuplicateResource {
                kind: ResourceKind::Stylesheet,
                ..
            })
        ));
        assert_eq!(p.stylesheets()[0].content(), "p {\n  margin: 0;\n}");

        p.add_asset("a.png", vec![1, 2, 3]).unwrap();
        assert!(matches!(
            p.add_asset("a.png", vec![4]),
            Err(Error::DuplicateResource {
                kind: ResourceKind::Asset,
                ..
            })
        ));
        assert_eq!(p.assets()[0].data(), &[1, 2, 3]);
    }

    #[test]
    fn test_invalid_section_is_not_inserted() {
        let mut p = publication();
        let err = p
            .add_section(
                "bad.xhtml",
                "Bad",
                "<p><p>This is not valid XML",
                SectionOptions::new(),
            )
            .unwrap_err();
        match err {
            Error::InvalidContent { kind, filename, .. } => {
                assert_eq!(kind, ResourceKind::Section);
                assert_eq!(filename, "bad.xhtml");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(p.sections().is_empty());

        // The name is still free afterwards.
        p.add_section("bad.xhtml", "Fixed", "<p>ok</p>", SectionOptions::new())
            .unwrap();
    }

    #[test]
    fn test_unescaped_ampersand_in_link_is_rejected() {
        let mut p = publication();
        let err = p
            .add_section(
                "link.xhtml",
                "Link",
                r#"<p><a href="x?a=1&b=2">link</a></p>"#,
                SectionOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidContent {
                kind: ResourceKind::Section,
                ..
            }
        ));
        assert!(p.sections().is_empty());

        p.add_section(
            "link.xhtml",
            "Link",
            r#"<p><a href="x?a=1&amp;b=2">link</a></p>"#,
            SectionOptions::new(),
        )
        .unwrap();
        assert!(p.sections()[0].document().contains(r#"href="x?a=1&amp;b=2""#));
    }

    #[test]
    fn test_unvalidated_section_is_stored_verbatim() {
        let mut p = publication();
        p.add_section(
            "raw.xhtml",
            "Raw",
            "<p>unchecked",
            SectionOptions::new().without_validation(),
        )
        .unwrap();
        assert!(p.sections()[0].document().contains("<body>\n<p>unchecked\n</body>"));
    }

    #[test]
    fn test_invalid_stylesheet() {
        let mut p = publication();
        let err = p
            .add_stylesheet("bad.css", "This is not valid CSS")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidContent {
                kind: ResourceKind::Stylesheet,
                ..
            }
        ));
        assert!(p.stylesheets().is_empty());
    }

    #[test]
    fn test_raw_stylesheet_skips_validation() {
        let mut p = publication();
        p.add_raw_stylesheet("raw.css", "not css at all").unwrap();
        assert_eq!(p.stylesheets()[0].content(), "not css at all");
    }

    #[test]
    fn test_section_links_registered_stylesheet() {
        let mut p = publication();
        p.add_stylesheet("epub.css", "p { margin: 0 }").unwrap();
        p.add_section(
            "s.xhtml",
            "S",
            "<p/>",
            SectionOptions::new().with_stylesheet("epub.css"),
        )
        .unwrap();
        let section = &p.sections()[0];
        assert_eq!(section.stylesheet(), Some("epub.css"));
        assert!(section.document().contains(
            r#"<link rel="stylesheet" type="text/css" href="../epub.css"/>"#
        ));
    }

    #[test]
    fn test_unknown_stylesheet_is_rejected_by_default() {
        let mut p = publication();
        let err = p
            .add_section(
                "s.xhtml",
                "S",
                "<p/>",
                SectionOptions::new().with_stylesheet("missing.css"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
        assert!(p.sections().is_empty());
    }

    #[test]
    fn test_unknown_stylesheet_can_be_ignored() {
        let mut p = publication().with_reference_policy(ReferencePolicy::Ignore);
        p.add_section(
            "s.xhtml",
            "S",
            "<p/>",
            SectionOptions::new().with_stylesheet("missing.css"),
        )
        .unwrap();
        assert_eq!(p.sections()[0].stylesheet(), None);
        assert!(!p.sections()[0].document().contains("<link"));
    }

    #[test]
    fn test_asset_media_types() {
        let mut p = publication();
        p.add_asset("cover.JPG", vec![0xff, 0xd8]).unwrap();
        p.add_asset_with_media_type("data.bin", vec![0], "application/x-custom")
            .unwrap();
        assert_eq!(p.assets()[0].media_type(), "image/jpeg");
        assert_eq!(p.assets()[1].media_type(), "application/x-custom");
    }

    #[test]
    fn test_package_paths_cannot_collide() {
        let mut p = publication();
        p.add_stylesheet("shared.css", "").unwrap();
        assert!(matches!(
            p.add_asset("shared.css", vec![0]),
            Err(Error::PathConflict { .. })
        ));
        assert!(matches!(
            p.add_asset("nav.xhtml", vec![0]),
            Err(Error::PathConflict { .. })
        ));
        assert!(matches!(
            p.add_raw_stylesheet("package.opf", ""),
            Err(Error::PathConflict { .. })
        ));
    }

    #[test]
    fn test_section_and_stylesheet_may_share_a_name() {
        let mut p = publication();
        p.add_raw_stylesheet("same", "").unwrap();
        p.add_section("same", "Same", "<p/>", SectionOptions::new())
            .unwrap();
    }

    #[test]
    fn test_blank_author_is_omitted() {
        let p = Publication::new(EpubOptions::new("id", "t", "en").with_author("  "));
        assert_eq!(p.author(), None);
        let p = Publication::new(EpubOptions::new("id", "t", "en").with_author("Me"));
        assert_eq!(p.author(), Some("Me"));
    }
}
