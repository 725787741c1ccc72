//! Narrow archive sink over [`zip::ZipWriter`].

use std::io::{Seek, Write};

use tracing::trace;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::paths::MIMETYPE;

/// The EPUB media type, written verbatim as the first entry.
pub(crate) const EPUB_MEDIA_TYPE: &[u8] = b"application/epub+zip";

/// An archive being written. Consumed by [`Container::finish`].
pub(crate) struct Container<W: Write + Seek> {
    zip: ZipWriter<W>,
    deflated: SimpleFileOptions,
}

impl<W: Write + Seek> Container<W> {
    pub fn new(writer: W, compression_level: i64, modified: zip::DateTime) -> Self {
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level))
            .last_modified_time(modified);
        Self {
            zip: ZipWriter::new(writer),
            deflated,
        }
    }

    /// Write the `mimetype` entry: stored, zip-epoch time, no extra fields.
    pub fn add_mimetype(&mut self) -> Result<()> {
        let stored = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(zip::DateTime::default());
        self.zip.start_file(MIMETYPE, stored)?;
        self.zip.write_all(EPUB_MEDIA_TYPE)?;
        trace!(entry = MIMETYPE, "wrote stored entry");
        Ok(())
    }

    pub fn add_text(&mut self, name: &str, text: &str) -> Result<()> {
        self.add_bytes(name, text.as_bytes())
    }

    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.deflated)?;
        self.zip.write_all(data)?;
        trace!(entry = name, bytes = data.len(), "wrote entry");
        Ok(())
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}
