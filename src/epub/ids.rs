//! Manifest id allocation.
//!
//! Ids are the resource filenames whenever those are valid XML names and not
//! already taken, so a typical manifest reads `id="section1.xhtml"`. Anything
//! else is rewritten into a valid name and suffixed until unique.

use std::collections::HashSet;

use crate::model::Publication;
use crate::validate::{is_name_char, is_name_start_char};

/// Ids written by the packager itself.
pub(crate) const NAV_ID: &str = "nav";
pub(crate) const NCX_ID: &str = "ncx";

/// Manifest ids for every resource of a publication, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ManifestIds {
    pub stylesheets: Vec<String>,
    pub assets: Vec<String>,
    pub sections: Vec<String>,
}

impl ManifestIds {
    /// Assign ids in manifest order: stylesheets, assets, then sections.
    pub fn assign(publication: &Publication) -> Self {
        let mut used: HashSet<String> = [NAV_ID, NCX_ID].into_iter().map(String::from).collect();
        let mut take = |filename: &str| unique_id(filename, &mut used);

        let stylesheets = publication
            .stylesheets()
            .iter()
            .map(|s| take(s.filename()))
            .collect();
        let assets = publication
            .assets()
            .iter()
            .map(|a| take(a.filename()))
            .collect();
        let sections = publication
            .sections()
            .iter()
            .map(|s| take(s.filename()))
            .collect();

        Self {
            stylesheets,
            assets,
            sections,
        }
    }
}

fn unique_id(filename: &str, used: &mut HashSet<String>) -> String {
    let base = to_xml_name(filename);
    let mut id = base.clone();
    let mut n = 2;
    while used.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    used.insert(id.clone());
    id
}

/// Rewrite `s` into an XML NCName: letters, digits, `-`, `.`, `_`, not
/// starting with a digit, `-` or `.`.
fn to_xml_name(s: &str) -> String {
    let mut name: String = s
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    if !name.chars().next().is_some_and(is_name_start_char) {
        name.insert(0, '_');
    }
    name
}
