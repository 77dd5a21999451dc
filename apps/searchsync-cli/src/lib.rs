//! File inputs for the `searchsync` binary.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use walkdir::WalkDir;

use searchsync_core::types::{DocumentRecord, PreferenceSnapshot};

/// Read documents from a JSON array file, or from every `*.json` file under a directory
/// (sorted by path, each holding an array or a single object).
pub fn load_documents(input: &Path) -> Result<Vec<DocumentRecord>> {
    if input.is_file() {
        return read_document_file(input);
    }
    if !input.is_dir() {
        bail!("input {} does not exist", input.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut documents = Vec::new();
    for file in &files {
        documents.extend(read_document_file(file)?);
    }
    Ok(documents)
}

fn read_document_file(path: &Path) -> Result<Vec<DocumentRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => bail!("{} must hold a JSON array or object", path.display()),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| DocumentRecord::from_value(item).with_context(|| format!("{} item {}", path.display(), i)))
        .collect()
}

/// Hidden preferences from a JSON file (`models`, `images`, `tags`, `users` id lists);
/// none hidden without one.
pub fn load_preferences(path: Option<&Path>) -> Result<PreferenceSnapshot> {
    let Some(path) = path else {
        return Ok(PreferenceSnapshot::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(snapshot)
}
