//! epubpack - Assemble EPUB 3 publications from a project manifest

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use epubpack::{
    EpubConfig, EpubOptions, EpubWriter, Publication, ReferencePolicy, SectionOptions,
};

#[derive(Parser)]
#[command(name = "epubpack")]
#[command(version, about = "Assemble EPUB 3 publications", long_about = None)]
#[command(after_help = "EXAMPLES:
    epubpack build book.json -o book.epub    Package the project described by book.json
    epubpack check book.json                 Validate every file without writing")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log progress (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Package a project into an EPUB file
    Build {
        /// Project manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Deflate level (1-9)
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=9))]
        compression_level: Option<i64>,
    },
    /// Validate a project without writing anything
    Check {
        /// Project manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },
}

/// A project manifest. File paths are relative to the manifest itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    identifier: String,
    title: String,
    language: String,
    #[serde(default)]
    author: Option<String>,
    /// Drop links to stylesheets that are not part of the project instead of failing.
    #[serde(default)]
    ignore_missing_stylesheets: bool,
    #[serde(default)]
    stylesheets: Vec<StylesheetEntry>,
    #[serde(default)]
    assets: Vec<AssetEntry>,
    sections: Vec<SectionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StylesheetEntry {
    filename: String,
    path: PathBuf,
    #[serde(default)]
    raw: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetEntry {
    filename: String,
    path: PathBuf,
    #[serde(default)]
    media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionEntry {
    filename: String,
    title: String,
    path: PathBuf,
    #[serde(default)]
    stylesheet: Option<String>,
    #[serde(default)]
    exclude_from_toc: bool,
    #[serde(default = "default_validate")]
    validate: bool,
}

fn default_validate() -> bool {
    true
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build {
            manifest,
            output,
            compression_level,
        } => build(&manifest, &output, compression_level),
        Command::Check { manifest } => check(&manifest),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "epubpack=info",
        2 => "epubpack=debug",
        _ => "epubpack=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(manifest: &Path, output: &Path, compression_level: Option<i64>) -> Result<(), String> {
    let publication = load(manifest)?;
    EpubWriter::new()
        .with_config(EpubConfig { compression_level })
        .write_to_path(&publication, output)
        .map_err(|e| e.to_string())?;
    info!(output = %output.display(), "wrote publication");
    println!("{}", output.display());
    Ok(())
}

fn check(manifest: &Path) -> Result<(), String> {
    let publication = load(manifest)?;
    println!("Title: {}", publication.title());
    if let Some(author) = publication.author() {
        println!("Author: {author}");
    }
    println!("Sections: {}", publication.sections().len());
    println!("Stylesheets: {}", publication.stylesheets().len());
    println!("Assets: {}", publication.assets().len());
    if publication.sections().is_empty() {
        return Err("publication has no sections".to_string());
    }
    Ok(())
}

/// Read a manifest and every file it names into a [`Publication`].
fn load(manifest_path: &Path) -> Result<Publication, String> {
    let json = fs::read_to_string(manifest_path)
        .map_err(|e| format!("{}: {e}", manifest_path.display()))?;
    let manifest: Manifest = serde_json::from_str(&json)
        .map_err(|e| format!("{}: {e}", manifest_path.display()))?;
    let root = manifest_path.parent().unwrap_or(Path::new("."));

    let mut options = EpubOptions::new(manifest.identifier, manifest.title, manifest.language);
    options.author = manifest.author;
    let policy = if manifest.ignore_missing_stylesheets {
        ReferencePolicy::Ignore
    } else {
        ReferencePolicy::Reject
    };
    let mut publication = Publication::new(options).with_reference_policy(policy);

    for entry in manifest.stylesheets {
        let content = read_text(root, &entry.path)?;
        let added = if entry.raw {
            publication.add_raw_stylesheet(entry.filename, content)
        } else {
            publication.add_stylesheet(entry.filename, &content)
        };
        added.map_err(|e| e.to_string())?;
    }

    for entry in manifest.assets {
        let path = root.join(&entry.path);
        let data = fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        let added = match entry.media_type {
            Some(media_type) => {
                publication.add_asset_with_media_type(entry.filename, data, media_type)
            }
            None => publication.add_asset(entry.filename, data),
        };
        added.map_err(|e| e.to_string())?;
    }

    for entry in manifest.sections {
        let body = read_text(root, &entry.path)?;
        let mut options = SectionOptions::new();
        if let Some(css) = entry.stylesheet {
            options = options.with_stylesheet(css);
        }
        if entry.exclude_from_toc {
            options = options.excluded_from_toc();
        }
        if !entry.validate {
            options = options.without_validation();
        }
        publication
            .add_section(entry.filename, entry.title, &body, options)
            .map_err(|e| e.to_string())?;
    }

    Ok(publication)
}

fn read_text(root: &Path, relative: &Path) -> Result<String, String> {
    let path = root.join(relative);
    fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))
}
