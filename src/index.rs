//! Markdown index and JSON manifest for an output directory.
//!
//! The index groups capture files under headings chosen by their numeric
//! prefix (`03-add-server-modal-full.png` belongs to section `03`). The
//! manifest records the run report plus every capture's description, so the
//! index can be regenerated later from what is on disk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::itinerary::{IndexSpec, Itinerary};
use crate::output::OutputDir;
use crate::runner::{RunReport, StepOutcome};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Heading for files whose prefix has no section
const OTHER_HEADING: &str = "Other";

/// One line of the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub file: String,
    #[serde(default)]
    pub description: String,
}

impl IndexEntry {
    pub fn new(file: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            description: description.into(),
        }
    }

    /// Text before the first '-', e.g. "04" for "04-settings-modal-full.png"
    pub fn prefix(&self) -> &str {
        self.file.split('-').next().unwrap_or_default()
    }
}

/// Entries for the captures a run actually wrote, in step order
pub fn entries_for_run(itinerary: &Itinerary, report: &RunReport) -> Vec<IndexEntry> {
    report
        .steps
        .iter()
        .filter(|s| matches!(s.outcome, StepOutcome::Captured { .. }))
        .filter_map(|s| itinerary.steps.get(s.index)?.capture.as_ref())
        .map(|c| IndexEntry::new(c.file.clone(), c.description.clone()))
        .collect()
}

/// Render the markdown index
pub fn render(spec: &IndexSpec, entries: &[IndexEntry]) -> String {
    let mut groups: Vec<(&str, Vec<&IndexEntry>)> = Vec::new();
    let mut placed = vec![false; entries.len()];

    for section in &spec.sections {
        let members: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(i, e)| !placed[*i] && e.prefix() == section.prefix)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }
        for &i in &members {
            placed[i] = true;
        }
        let members = members.into_iter().map(|i| &entries[i]);
        match groups.last_mut() {
            Some((heading, list)) if *heading == section.heading => list.extend(members),
            _ => groups.push((section.heading.as_str(), members.collect())),
        }
    }

    let rest: Vec<&IndexEntry> = entries
        .iter()
        .zip(&placed)
        .filter(|(_, p)| !**p)
        .map(|(e, _)| e)
        .collect();
    if !rest.is_empty() {
        groups.push((OTHER_HEADING, rest));
    }

    let mut md = format!("# {}\n", spec.title);
    for (heading, list) in &groups {
        let _ = write!(md, "\n## {}\n", heading);
        for entry in list {
            if entry.description.is_empty() {
                let _ = writeln!(md, "- {}", entry.file);
            } else {
                let _ = writeln!(md, "- {} - {}", entry.file, entry.description);
            }
        }
    }
    let _ = write!(md, "\nTotal screenshots: {}\n", entries.len());
    md
}

/// Write the index into the output directory
pub fn write_index(
    output: &OutputDir,
    spec: &IndexSpec,
    entries: &[IndexEntry],
) -> std::io::Result<PathBuf> {
    output.write(&spec.file, render(spec, entries).as_bytes())
}

#[derive(Serialize)]
struct ManifestOut<'a> {
    itinerary: &'a str,
    description: &'a str,
    captures: Vec<IndexEntry>,
    run: &'a RunReport,
}

#[derive(Deserialize)]
struct ManifestIn {
    #[serde(default)]
    captures: Vec<IndexEntry>,
}

/// Write `manifest.json` describing a finished run
pub fn write_manifest(
    output: &OutputDir,
    itinerary: &Itinerary,
    report: &RunReport,
) -> std::io::Result<PathBuf> {
    let manifest = ManifestOut {
        itinerary: &itinerary.name,
        description: &itinerary.description,
        captures: entries_for_run(itinerary, report),
        run: report,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    output.write(MANIFEST_FILE, json.as_bytes())
}

/// Capture descriptions recorded by an earlier run, keyed by file name
pub fn read_manifest(output: &OutputDir) -> HashMap<String, String> {
    let path = output.capture_path(MANIFEST_FILE);
    let Ok(text) = fs::read_to_string(&path) else {
        return HashMap::new();
    };
    match serde_json::from_str::<ManifestIn>(&text) {
        Ok(manifest) => manifest
            .captures
            .into_iter()
            .map(|e| (e.file, e.description))
            .collect(),
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Rebuild the index from the PNG files present in the output directory.
///
/// Descriptions come from the manifest when there is one, then from
/// `itinerary`; files known to neither are listed bare.
pub fn regenerate(
    output: &OutputDir,
    spec: &IndexSpec,
    itinerary: Option<&Itinerary>,
) -> std::io::Result<PathBuf> {
    let mut descriptions = read_manifest(output);
    if let Some(itinerary) = itinerary {
        for capture in itinerary.steps.iter().filter_map(|s| s.capture.as_ref()) {
            descriptions
                .entry(capture.file.clone())
                .or_insert_with(|| capture.description.clone());
        }
    }

    let entries: Vec<IndexEntry> = output
        .list_captures()?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|name| {
            let file = name.to_string_lossy().to_string();
            let description = descriptions.get(&file).cloned().unwrap_or_default();
            IndexEntry::new(file, description)
        })
        .collect();
    debug!("regenerating index over {} files", entries.len());

    write_index(output, spec, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::IndexSection;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn spec() -> IndexSpec {
        let section = |prefix: &str, heading: &str| IndexSection {
            prefix: prefix.into(),
            heading: heading.into(),
        };
        IndexSpec {
            file: "README.md".into(),
            title: "User Guide Screenshots".into(),
            sections: vec![
                section("00", "Landing Page"),
                section("01", "Main Interface"),
                section("07", "Actions"),
                section("08", "Actions"),
            ],
        }
    }

    #[test]
    fn test_render_groups_by_prefix() {
        let entries = vec![
            IndexEntry::new("00-landing-page.png", "Full landing page"),
            IndexEntry::new("01-main-interface-full.png", "Complete main interface"),
            IndexEntry::new("00-landing-get-started-button.png", "Get Started button focus"),
            IndexEntry::new("07-server-action-buttons.png", "Copy, Edit, Delete buttons"),
            IndexEntry::new("08-save-button.png", "Save configuration button"),
            IndexEntry::new("scratch.png", ""),
        ];

        let expected = "# User Guide Screenshots

## Landing Page
- 00-landing-page.png - Full landing page
- 00-landing-get-started-button.png - Get Started button focus

## Main Interface
- 01-main-interface-full.png - Complete main interface

## Actions
- 07-server-action-buttons.png - Copy, Edit, Delete buttons
- 08-save-button.png - Save configuration button

## Other
- scratch.png

Total screenshots: 6
";
        assert_eq!(render(&spec(), &entries), expected);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let entries = vec![IndexEntry::new("01-main-interface-full.png", "Main")];
        let md = render(&spec(), &entries);
        assert!(!md.contains("Landing Page"));
        assert!(md.ends_with("Total screenshots: 1\n"));
    }

    #[test]
    fn test_regenerate_uses_manifest_descriptions() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        out.write("00-landing-page.png", b"png").unwrap();
        out.write("01-main-interface-full.png", b"png").unwrap();
        out.write(
            MANIFEST_FILE,
            br#"{"captures": [{"file": "00-landing-page.png", "description": "From manifest"}]}"#,
        )
        .unwrap();

        let path = regenerate(&out, &spec(), None).unwrap();
        let md = fs::read_to_string(path).unwrap();
        assert!(md.contains("- 00-landing-page.png - From manifest"));
        assert!(md.contains("- 01-main-interface-full.png\n"));
        assert!(md.contains("Total screenshots: 2"));
    }

    #[test]
    fn test_unreadable_manifest_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        out.write(MANIFEST_FILE, b"not json").unwrap();
        assert!(read_manifest(&out).is_empty());
    }
}
