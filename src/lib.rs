//! # epubpack
//!
//! Assemble EPUB 3 publications from XHTML sections, stylesheets and binary
//! assets.
//!
//! ## Features
//!
//! - Build a [`Publication`] in memory; every addition is checked immediately
//! - Markup and CSS validation with normalized, two-space indented output
//! - EPUB 3 navigation document plus a legacy NCX for EPUB 2 reading systems
//! - Reproducible archives when packaging with a [`FixedClock`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use epubpack::{EpubOptions, Publication, SectionOptions, write_epub};
//!
//! let mut publication = Publication::new(
//!     EpubOptions::new("urn:uuid:38e9a65c-8077-45b7-a59e-8d0ae827ca5f", "My title", "en")
//!         .with_author("Jane Doe"),
//! );
//! publication.add_stylesheet("epub.css", "h1 { text-align: center; }")?;
//! publication.add_asset("cover.png", std::fs::read("cover.png")?)?;
//! publication.add_section(
//!     "section1.xhtml",
//!     "First section",
//!     "<h1>Hello world</h1>",
//!     SectionOptions::new().with_stylesheet("epub.css"),
//! )?;
//!
//! write_epub(&publication, "my-title.epub")?;
//! # Ok::<(), epubpack::Error>(())
//! ```
//!
//! ## Archive layout
//!
//! ```text
//! mimetype
//! META-INF/container.xml
//! EPUB/package.opf
//! EPUB/nav.xhtml
//! EPUB/toc.ncx
//! EPUB/<stylesheets>
//! EPUB/<assets>
//! EPUB/xhtml/<sections>
//! ```

pub mod clock;
pub mod epub;
pub mod error;
pub mod model;
pub(crate) mod paths;
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock, modified_timestamp};
pub use epub::{EpubConfig, EpubWriter, package, write_epub, write_epub_to_writer};
pub use error::{Error, Result};
pub use model::{
    Asset, EpubOptions, Publication, ReferencePolicy, ResourceKind, Section, SectionOptions,
    Stylesheet, guess_media_type,
};
pub use validate::{ValidationError, prettify_css, prettify_xml};
