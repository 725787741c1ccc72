//! EPUB packaging.
//!
//! Turns a finished [`Publication`](crate::Publication) into an OCF zip
//! container. All content was validated when it was added to the
//! publication; packaging only renders the generated files and streams
//! everything into the archive in the mandated order.

mod container;
mod documents;
mod ids;
mod writer;

pub use writer::{EpubConfig, EpubWriter, package, write_epub, write_epub_to_writer};
