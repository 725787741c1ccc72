use std::io::{Cursor, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock, modified_timestamp, zip_timestamp};
use crate::error::{Error, Result};
use crate::model::Publication;
use crate::paths::{
    CONTAINER_XML as CONTAINER_PATH, NAV_DOCUMENT, NCX_DOCUMENT, PACKAGE_DOCUMENT, package_entry,
    section_entry,
};
use crate::validate::prettify_xml;

use super::container::Container;
use super::documents::{self, CONTAINER_XML};
use super::ids::ManifestIds;

/// Default deflate level for every entry except `mimetype`.
const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

/// Deflate levels accepted by [`EpubConfig::compression_level`].
const COMPRESSION_LEVELS: std::ops::RangeInclusive<i64> = 1..=9;

/// Configuration for EPUB packaging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpubConfig {
    /// Compression level for deflate (1-9, default 6).
    ///
    /// Packaging fails with [`Error::InvalidCompressionLevel`] for any other
    /// value.
    pub compression_level: Option<i64>,
}

/// Packages a [`Publication`] into an EPUB archive.
///
/// Entries are written in the order the OCF container format requires:
/// `mimetype` (stored), `META-INF/container.xml`, `EPUB/package.opf`,
/// `EPUB/nav.xhtml`, `EPUB/toc.ncx`, then stylesheets, assets and sections
/// in registration order.
///
/// # Example
///
/// ```
/// use epubpack::{EpubOptions, EpubWriter, FixedClock, Publication, SectionOptions};
///
/// let mut publication = Publication::new(EpubOptions::new("urn:uuid:1", "My title", "en"));
/// publication.add_section("section1.xhtml", "First section", "<p>Hi</p>", SectionOptions::new())?;
///
/// let clock = FixedClock::parse("2023-02-16T18:35:03Z").unwrap();
/// let bytes = EpubWriter::new().with_clock(clock).package(&publication)?;
/// assert_eq!(&bytes[30..38], b"mimetype");
/// # Ok::<(), epubpack::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EpubWriter<C = SystemClock> {
    config: EpubConfig,
    clock: C,
}

impl EpubWriter<SystemClock> {
    /// Create a new writer with default configuration and the system clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> EpubWriter<C> {
    /// Configure the writer with custom settings.
    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` for the `dcterms:modified` stamp and entry times.
    pub fn with_clock<D: Clock>(self, clock: D) -> EpubWriter<D> {
        EpubWriter {
            config: self.config,
            clock,
        }
    }

    /// Package `publication` and return the archive bytes.
    ///
    /// Either the whole archive is produced or an error is returned; no
    /// partial output escapes.
    #[tracing::instrument(skip_all, fields(identifier = %publication.identifier()))]
    pub fn package(&self, publication: &Publication) -> Result<Vec<u8>> {
        let level = self
            .config
            .compression_level
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL);
        if !COMPRESSION_LEVELS.contains(&level) {
            return Err(Error::InvalidCompressionLevel(level));
        }
        if publication.sections().is_empty() {
            return Err(Error::EmptySpine);
        }

        let instant = self.clock.now();
        let ids = ManifestIds::assign(publication);
        let opf = normalize(
            PACKAGE_DOCUMENT,
            &documents::package_document(publication, &ids, &modified_timestamp(instant)),
        )?;
        let nav = normalize(NAV_DOCUMENT, &documents::navigation_document(publication))?;
        let ncx = normalize(NCX_DOCUMENT, &documents::ncx_document(publication))?;

        let mut container = Container::new(Cursor::new(Vec::new()), level, zip_timestamp(instant));

        // 1. mimetype (must be first, uncompressed)
        container.add_mimetype()?;

        // 2. META-INF/container.xml
        container.add_text(CONTAINER_PATH, CONTAINER_XML)?;

        // 3-5. Package document, navigation document, legacy NCX
        container.add_text(&package_entry(PACKAGE_DOCUMENT), &opf)?;
        container.add_text(&package_entry(NAV_DOCUMENT), &nav)?;
        container.add_text(&package_entry(NCX_DOCUMENT), &ncx)?;

        // 6. Stylesheets, already normalized when added
        for stylesheet in publication.stylesheets() {
            container.add_text(&package_entry(stylesheet.filename()), stylesheet.content())?;
        }

        // 7. Assets
        for asset in publication.assets() {
            container.add_bytes(&package_entry(asset.filename()), asset.data())?;
        }

        // 8. Sections, rendered and validated when added
        for section in publication.sections() {
            container.add_text(&section_entry(section.filename()), section.document())?;
        }

        let bytes = container.finish()?.into_inner();
        debug!(
            sections = publication.sections().len(),
            stylesheets = publication.stylesheets().len(),
            assets = publication.assets().len(),
            bytes = bytes.len(),
            "packaged publication"
        );
        Ok(bytes)
    }

    /// Package `publication` into any [`Write`] destination.
    ///
    /// Nothing is written unless packaging succeeds.
    pub fn write<W: Write>(&self, publication: &Publication, mut writer: W) -> Result<()> {
        let bytes = self.package(publication)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Package `publication` into a file on disk.
    ///
    /// The file is only created once packaging has succeeded, and is removed
    /// again if writing it fails.
    pub fn write_to_path<P: AsRef<Path>>(&self, publication: &Publication, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.package(publication)?;
        if let Err(e) = std::fs::write(path, &bytes) {
            if let Err(cleanup) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %cleanup, "could not remove partial archive");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Run a generated package file through the markup validator.
///
/// Generated files are built from escaped, already-checked input, so a
/// failure here is a bug rather than bad caller input.
fn normalize(name: &str, document: &str) -> Result<String> {
    prettify_xml(document).map_err(|e| Error::Internal(format!("generated {name} is malformed: {e}")))
}

/// Package a [`Publication`] with the default configuration and system clock.
pub fn package(publication: &Publication) -> Result<Vec<u8>> {
    EpubWriter::new().package(publication)
}

/// Write a [`Publication`] to an EPUB file on disk.
pub fn write_epub<P: AsRef<Path>>(publication: &Publication, path: P) -> Result<()> {
    EpubWriter::new().write_to_path(publication, path)
}

/// Write a [`Publication`] to any [`Write`] destination.
pub fn write_epub_to_writer<W: Write>(publication: &Publication, writer: W) -> Result<()> {
    EpubWriter::new().write(publication, writer)
}
