//! Statement documents as page texts.
//!
//! Text exports (`pdftotext` output) separate pages with form feeds. PDFs are
//! read directly when the `pdf` feature is enabled.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PAGE_BREAK: char = '\u{c}';

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn split_pages(text: &str) -> Vec<String> {
    text.split(PAGE_BREAK).map(str::to_string).collect()
}

/// Extensions `load_pages` can read in this build.
pub fn document_extensions() -> &'static [&'static str] {
    if cfg!(feature = "pdf") {
        &["pdf", "txt"]
    } else {
        &["txt"]
    }
}

/// Read one statement document into its page texts.
pub fn load_pages(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    info!(path = %path.display(), "reading statement");

    if has_extension(path, "pdf") {
        return load_pdf_pages(path);
    }

    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(split_pages(&text))
}

#[cfg(feature = "pdf")]
fn load_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let text = pdf_extract::extract_text(path)
        .with_context(|| format!("extract text from {}", path.display()))?;
    Ok(split_pages(&text))
}

#[cfg(not(feature = "pdf"))]
fn load_pdf_pages(path: &Path) -> Result<Vec<String>> {
    anyhow::bail!(
        "{} is a PDF; rebuild with `--features pdf` or convert it with pdftotext first",
        path.display()
    )
}

/// Files in `folder` whose extension matches `ext` (any case), sorted by path.
/// A missing folder yields no files.
pub fn find_files_with_extension(folder: impl AsRef<Path>, ext: &str) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        debug!(folder = %folder.display(), "folder not found, nothing to scan");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).with_context(|| format!("list {}", folder.display()))? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Statement documents in `folder` this build can read.
pub fn find_documents(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut docs = Vec::new();
    for ext in document_extensions() {
        docs.extend(find_files_with_extension(folder.as_ref(), ext)?);
    }
    docs.sort();
    Ok(docs)
}
