/*!
 * File and path utilities for the translation pipeline.
 */

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Marker inserted into derived output file names
pub const OUTPUT_NAME_MARKER: &str = "_TranslateAI";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    /// Read the input file as a sequence of lines without terminators.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, matching how large
    /// scraped novel files tend to arrive.
    pub fn read_to_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read input file: {:?}", path.as_ref()))?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(content.lines().map(|l| l.to_string()).collect())
    }

    /// Derive the conventional output path for an input file:
    /// `novel.txt` becomes `novel_TranslateAI.txt`, alongside the input.
    pub fn derive_output_path<P: AsRef<Path>>(input_path: P) -> PathBuf {
        let input_path = input_path.as_ref();
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let file_name = match input_path.extension() {
            Some(ext) => format!("{}{}.{}", stem, OUTPUT_NAME_MARKER, ext.to_string_lossy()),
            None => format!("{}{}", stem, OUTPUT_NAME_MARKER),
        };

        match input_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
            _ => PathBuf::from(file_name),
        }
    }

    /// Open the output sink: append mode when resuming a previous run,
    /// truncate/create for a fresh one.
    pub fn open_output_sink<P: AsRef<Path>>(path: P, resume: bool) -> Result<File> {
        let mut options = OpenOptions::new();
        if resume {
            options.create(true).append(true);
        } else {
            options.create(true).write(true).truncate(true);
        }
        options
            .open(&path)
            .with_context(|| format!("Failed to open output file: {:?}", path.as_ref()))
    }

    /// Find `.txt` files under a directory, skipping prior translation outputs
    pub fn find_text_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            let is_txt = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("txt"));
            if !is_txt {
                continue;
            }
            let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
            if stem.ends_with(OUTPUT_NAME_MARKER) {
                continue;
            }
            result.push(path.to_path_buf());
        }

        result.sort();
        Ok(result)
    }
}
