/*!
 * Common test utilities for the yanta test suite
 */

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use yanta::app_config::Config;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates an input file of `total_lines` numbered lines ("line 0".."line N-1")
pub fn create_numbered_input(dir: &Path, filename: &str, total_lines: usize) -> Result<PathBuf> {
    let content: String = (0..total_lines)
        .map(|i| format!("line {}\n", i))
        .collect();
    create_test_file(dir, filename, &content)
}

/// The exact text one chunk of a numbered input sends to the translator
pub fn numbered_chunk_text(start_line: usize, line_count: usize) -> String {
    (start_line..start_line + line_count)
        .map(|i| format!("line {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A config tuned for tests: small chunks, no retry delay, no reformat pass
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.api_key = "test-api-key".to_string();
    config.workers = Some(4);
    config.chunk_size_lines = 10;
    config.retry.retry_delay_ms = 0;
    config.auto_reformat = false;
    config
}
