/*!
 * Post-completion text normalization.
 *
 * Translated output accumulates runs of blank lines at chunk boundaries.
 * This pass collapses three or more consecutive newlines into the standard
 * two-newline paragraph break, trims leading/trailing blank lines, and
 * ensures the file ends with a single newline. It runs only after a run
 * completes, before downstream conversion hooks.
 */

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("excess-newline pattern is valid"));

/// Normalize paragraph breaks in a string
pub fn normalize_text(content: &str) -> String {
    let collapsed = EXCESS_NEWLINES.replace_all(content, "\n\n");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

/// Normalize a finished output file in place
pub fn normalize_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file for reformatting: {:?}", path))?;

    let fixed = normalize_text(&content);
    if fixed != content {
        fs::write(path, fixed)
            .with_context(|| format!("Failed to write reformatted file: {:?}", path))?;
    }

    Ok(())
}
