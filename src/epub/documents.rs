//! Templates for the package files: container.xml, package.opf, nav.xhtml
//! and toc.ncx.
//!
//! The generators emit one element per line without indentation; the writer
//! runs the result through the markup validator, which indents it and
//! catches any template or escaping mistake before it reaches the archive.

use crate::model::Publication;
use crate::paths::{NAV_DOCUMENT, NCX_DOCUMENT, resource_href, section_href};
use crate::validate::escape_xml;

use super::ids::{ManifestIds, NAV_ID, NCX_ID};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Container.xml, already in its final form.
pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Generate package.opf: metadata, manifest and spine.
pub(crate) fn package_document(
    publication: &Publication,
    ids: &ManifestIds,
    modified: &str,
) -> String {
    let mut opf = String::new();
    opf.push_str(XML_DECLARATION);
    opf.push_str(
        r#"
<package version="3.0" unique-identifier="pub-id" xmlns="http://www.idpf.org/2007/opf">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );

    opf.push_str(&format!(
        "<dc:identifier id=\"pub-id\">{}</dc:identifier>\n",
        escape_xml(publication.identifier())
    ));
    opf.push_str(&format!(
        "<dc:title>{}</dc:title>\n",
        escape_xml(publication.title())
    ));
    if let Some(author) = publication.author() {
        opf.push_str(&format!(
            "<dc:creator id=\"creator\">{}</dc:creator>\n",
            escape_xml(author)
        ));
    }
    opf.push_str(&format!(
        "<dc:language>{}</dc:language>\n",
        escape_xml(publication.language())
    ));
    opf.push_str(&format!(
        "<meta property=\"dcterms:modified\">{}</meta>\n",
        escape_xml(modified)
    ));
    opf.push_str("</metadata>\n<manifest>\n");

    opf.push_str(&format!(
        "<item id=\"{NAV_ID}\" href=\"{NAV_DOCUMENT}\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n"
    ));
    opf.push_str(&format!(
        "<item id=\"{NCX_ID}\" href=\"{NCX_DOCUMENT}\" media-type=\"application/x-dtbncx+xml\"/>\n"
    ));
    for (stylesheet, id) in publication.stylesheets().iter().zip(&ids.stylesheets) {
        push_item(&mut opf, id, &resource_href(stylesheet.filename()), "text/css");
    }
    for (asset, id) in publication.assets().iter().zip(&ids.assets) {
        push_item(
            &mut opf,
            id,
            &resource_href(asset.filename()),
            asset.media_type(),
        );
    }
    for (section, id) in publication.sections().iter().zip(&ids.sections) {
        push_item(
            &mut opf,
            id,
            &section_href(section.filename()),
            "application/xhtml+xml",
        );
    }

    opf.push_str(&format!("</manifest>\n<spine toc=\"{NCX_ID}\">\n"));
    for id in &ids.sections {
        opf.push_str(&format!("<itemref idref=\"{}\"/>\n", escape_xml(id)));
    }
    opf.push_str("</spine>\n</package>\n");
    opf
}

fn push_item(opf: &mut String, id: &str, href: &str, media_type: &str) {
    opf.push_str(&format!(
        "<item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
        escape_xml(id),
        escape_xml(href),
        escape_xml(media_type)
    ));
}

/// Generate the EPUB 3 navigation document.
pub(crate) fn navigation_document(publication: &Publication) -> String {
    let mut nav = String::new();
    nav.push_str(XML_DECLARATION);
    nav.push_str(
        r#"
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
"#,
    );
    nav.push_str(&format!(
        "<title>{}</title>\n",
        escape_xml(publication.title())
    ));
    nav.push_str(
        r#"</head>
<body>
<nav epub:type="toc">
<h1>Table of Contents</h1>
<ol>
"#,
    );

    for section in publication.sections().iter().filter(|s| !s.exclude_from_toc()) {
        nav.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_xml(&section_href(section.filename())),
            escape_xml(section.title())
        ));
    }

    nav.push_str("</ol>\n</nav>\n</body>\n</html>\n");
    nav
}

/// Generate toc.ncx for EPUB 2 reading systems.
pub(crate) fn ncx_document(publication: &Publication) -> String {
    let mut ncx = String::new();
    ncx.push_str(XML_DECLARATION);
    ncx.push_str(
        r#"
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
<head>
"#,
    );
    ncx.push_str(&format!(
        "<meta name=\"dtb:uid\" content=\"{}\"/>\n",
        escape_xml(publication.identifier())
    ));
    ncx.push_str(&format!(
        "</head>\n<docTitle>\n<text>{}</text>\n</docTitle>\n<navMap>\n",
        escape_xml(publication.title())
    ));

    let included = publication
        .sections()
        .iter()
        .filter(|s| !s.exclude_from_toc());
    for (index, section) in included.enumerate() {
        ncx.push_str(&format!(
            "<navPoint id=\"navPoint-{}\">\n<navLabel>\n<text>{}</text>\n</navLabel>\n<content src=\"{}\"/>\n</navPoint>\n",
            index + 1,
            escape_xml(section.title()),
            escape_xml(&section_href(section.filename()))
        ));
    }

    ncx.push_str("</navMap>\n</ncx>\n");
    ncx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EpubOptions, SectionOptions};
    use crate::validate::prettify_xml;

    fn sample() -> Publication {
        let mut p = Publication::new(
            EpubOptions::new("urn:uuid:1", "Fish & Chips", "en").with_author("A. Writer"),
        );
        p.add_raw_stylesheet("epub.css", "").unwrap();
        p.add_asset("cover.png", vec![0]).unwrap();
        p.add_section("one.xhtml", "One", "<p/>", SectionOptions::new())
            .unwrap();
        p.add_section(
            "two.xhtml",
            "Two",
            "<p/>",
            SectionOptions::new().excluded_from_toc(),
        )
        .unwrap();
        p.add_section("three.xhtml", "Three", "<p/>", SectionOptions::new())
            .unwrap();
        p
    }

    #[test]
    fn test_container_xml_is_already_normalized() {
        assert_eq!(prettify_xml(CONTAINER_XML).unwrap(), CONTAINER_XML);
    }

    #[test]
    fn test_package_document_is_well_formed() {
        let p = sample();
        let ids = ManifestIds::assign(&p);
        let opf = prettify_xml(&package_document(&p, &ids, "2023-02-16T18:35:03Z")).unwrap();
        assert!(opf.contains("<dc:title>Fish &amp; Chips</dc:title>"));
        assert!(opf.contains("<dc:creator id=\"creator\">A. Writer</dc:creator>"));
        assert!(opf.contains(
            "<item id=\"cover.png\" href=\"cover.png\" media-type=\"image/png\"/>"
        ));
        assert!(opf.contains("<itemref idref=\"two.xhtml\"/>"));
    }

    #[test]
    fn test_manifest_order() {
        let p = sample();
        let ids = ManifestIds::assign(&p);
        let opf = package_document(&p, &ids, "2023-02-16T18:35:03Z");
        let order: Vec<usize> = [
            "id=\"nav\"",
            "id=\"ncx\"",
            "id=\"epub.css\"",
            "id=\"cover.png\"",
            "id=\"one.xhtml\"",
            "id=\"two.xhtml\"",
            "id=\"three.xhtml\"",
        ]
        .iter()
        .map(|needle| opf.find(needle).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{opf}");
    }

    #[test]
    fn test_navigation_skips_excluded_sections() {
        let nav = navigation_document(&sample());
        assert!(nav.contains("<a href=\"xhtml/one.xhtml\">One</a>"));
        assert!(!nav.contains("two.xhtml"));
        assert!(nav.contains("<a href=\"xhtml/three.xhtml\">Three</a>"));
        assert!(prettify_xml(&nav).is_ok());
    }

    #[test]
    fn test_ncx_numbers_included_sections_sequentially() {
        let ncx = ncx_document(&sample());
        assert!(ncx.contains("<navPoint id=\"navPoint-1\">\n<navLabel>\n<text>One</text>"));
        assert!(ncx.contains("<navPoint id=\"navPoint-2\">\n<navLabel>\n<text>Three</text>"));
        assert!(!ncx.contains("navPoint-3"));
        assert!(!ncx.contains("two.xhtml"));
        assert!(prettify_xml(&ncx).is_ok());
    }
}
