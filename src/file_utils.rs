use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// @module: File and directory utilities

// @const: Prefix of per-request scratch directories
const SCRATCH_PREFIX: &str = "animejp-";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Create a fresh scratch directory in the system temp dir.
    ///
    /// The directory and everything written into it is removed when the
    /// returned guard is dropped.
    pub fn scratch_dir() -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .context("Failed to create scratch directory")
    }

    /// Find files with a specific extension directly inside a directory.
    ///
    /// Subdirectories are not searched. Results are sorted by path.
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let wanted = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(wanted) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Replace characters that are not allowed in file names on common platforms
    pub fn sanitize_file_name(name: &str) -> String {
        let cleaned: String = name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        let cleaned = cleaned.trim().trim_matches('.').trim();
        if cleaned.is_empty() {
            "untitled".to_string()
        } else {
            cleaned.to_string()
        }
    }

    // @generates: Output path for an exported bundle
    // @params: output_dir, title, extension
    pub fn generate_output_path<P: AsRef<Path>>(output_dir: P, title: &str, extension: &str) -> PathBuf {
        let mut file_name = Self::sanitize_file_name(title);
        file_name.push('.');
        file_name.push_str(extension.trim_start_matches('.'));
        output_dir.as_ref().join(file_name)
    }
}
