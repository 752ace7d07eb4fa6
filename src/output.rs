//! Output directory management for capture runs.
//!
//! Provides:
//! - Directory creation on first use
//! - Deterministic artifact paths (re-running overwrites)
//! - Scratch directories for offline mock runs
//! - Listing of captured PNG files

use std::fs;
use std::path::{Path, PathBuf};

/// Base directory for scratch output under the system temp dir
const SCRATCH_DIR_NAME: &str = "shotlist";

/// Where a run writes its bitmaps, index and manifest
#[derive(Debug, Clone)]
pub struct OutputDir {
    dir: PathBuf,
}

impl OutputDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A fresh directory under the system temp dir, named after `name`
    pub fn scratch(name: &str) -> Self {
        let id = format!("{}_{}", sanitize_name(name), generate_timestamp_suffix());
        Self::new(std::env::temp_dir().join(SCRATCH_DIR_NAME).join(id))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Path for an artifact named relative to the output directory
    pub fn capture_path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write (or overwrite) an artifact and return its path
    pub fn write(&self, file: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.capture_path(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// List all PNG files directly in the output directory, sorted by name
    pub fn list_captures(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut captures = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().map(|e| e == "png").unwrap_or(false) {
                    captures.push(path);
                }
            }
        }
        captures.sort();
        Ok(captures)
    }
}

/// Generate a timestamp suffix
fn generate_timestamp_suffix() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a name for use in filenames
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("userguide-complete"), "userguide-complete");
        assert_eq!(sanitize_name("hello world"), "hello_world");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_scratch_dir_is_named() {
        let out = OutputDir::scratch("web docs");
        let name = out.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("web_docs_"));
        assert!(out.path().starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path().join("docs"));
        out.init().unwrap();

        let path = out.write("shot.png", b"first version").unwrap();
        out.write("shot.png", b"v2").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn test_list_captures_sorted_png_only() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path());
        out.write("02-b.png", b"x").unwrap();
        out.write("00-a.png", b"x").unwrap();
        out.write("README.md", b"x").unwrap();

        let names: Vec<String> = out
            .list_captures()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["00-a.png", "02-b.png"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let out = OutputDir::new(tmp.path().join("nope"));
        assert!(out.list_captures().unwrap().is_empty());
    }
}
