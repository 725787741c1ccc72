//! Benchmarks for validation and packaging.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use epubpack::{
    EpubOptions, EpubWriter, FixedClock, Publication, SectionOptions, prettify_css, prettify_xml,
};

const STYLESHEET: &str = "body { margin: 0 5%; line-height: 1.4 }
h1, h2 { text-align: center; font-weight: bold }
p { text-indent: 1.5em; margin: 0 }
@media (min-width: 600px) { body { margin: 0 10% } }";

/// A chapter body of a few hundred paragraphs with inline markup.
fn chapter_body() -> String {
    let mut body = String::from("<h1>Chapter</h1>\n");
    for i in 0..300 {
        body.push_str(&format!(
            "<p>Paragraph {i} with <em>emphasis</em> &amp; a <a href=\"#n{i}\">note</a>.</p>\n"
        ));
    }
    body
}

fn sample_publication(chapters: usize) -> Publication {
    let body = chapter_body();
    let mut publication =
        Publication::new(EpubOptions::new("urn:uuid:bench", "Benchmark", "en").with_author("A"));
    publication.add_stylesheet("style.css", STYLESHEET).unwrap();
    for n in 1..=chapters {
        publication
            .add_section(
                format!("chapter{n}.xhtml"),
                format!("Chapter {n}"),
                &body,
                SectionOptions::new().with_stylesheet("style.css"),
            )
            .unwrap();
    }
    publication
}

// ============================================================================
// Validation Benchmarks
// ============================================================================

fn bench_prettify_xml(c: &mut Criterion) {
    let document = format!("<html><body>{}</body></html>", chapter_body());
    c.bench_function("prettify_xml", |b| {
        b.iter(|| prettify_xml(&document).unwrap());
    });
}

fn bench_prettify_css(c: &mut Criterion) {
    c.bench_function("prettify_css", |b| {
        b.iter(|| prettify_css(STYLESHEET).unwrap());
    });
}

fn bench_add_section(c: &mut Criterion) {
    let body = chapter_body();
    c.bench_function("add_section", |b| {
        b.iter(|| {
            let mut publication = Publication::new(EpubOptions::new("id", "t", "en"));
            publication
                .add_section("chapter.xhtml", "Chapter", &body, SectionOptions::new())
                .unwrap();
            publication
        });
    });
}

// ============================================================================
// Packaging Benchmarks
// ============================================================================

fn bench_package(c: &mut Criterion) {
    let publication = sample_publication(20);
    let writer = EpubWriter::new().with_clock(FixedClock::parse("2023-02-16T18:35:03Z").unwrap());
    c.bench_function("package", |b| {
        b.iter(|| writer.package(&publication).unwrap());
    });
}

criterion_group!(
    benches,
    bench_prettify_xml,
    bench_prettify_css,
    bench_add_section,
    bench_package,
);

criterion_main!(benches);
