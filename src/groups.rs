use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{HarvestError, Result};

/// A parsed capabilities document and the names it is reported under.
#[derive(Debug, Clone)]
pub struct InputDocument {
    /// File name, shown in summaries.
    pub name: String,
    /// File stem, used as the sheet name.
    pub stem: String,
    pub value: Value,
}

impl InputDocument {
    pub fn new(name: impl Into<String>, stem: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            stem: stem.into(),
            value,
        }
    }
}

pub fn load_document(path: &Path) -> Result<InputDocument> {
    let text = fs::read_to_string(path)?;
    let value = serde_json::from_str(&text).map_err(|source| HarvestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(InputDocument::new(name, stem, value))
}

/// Groups the JSON files under `input_dir`.
///
/// Root-level `*.json` files form the group `""`; each direct subdirectory
/// holding `*.json` files forms a group named after it. Deeper directories
/// are ignored. Groups and files are sorted by name. A missing directory
/// yields no groups.
pub fn collect_groups(input_dir: &Path) -> Result<IndexMap<String, Vec<PathBuf>>> {
    let mut groups = IndexMap::new();
    if !input_dir.is_dir() {
        return Ok(groups);
    }

    let root_files = json_files(input_dir)?;
    if !root_files.is_empty() {
        groups.insert(String::new(), root_files);
    }

    let mut subdirs: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    for dir in subdirs {
        let files = json_files(&dir)?;
        if files.is_empty() {
            continue;
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        groups.insert(name, files);
    }

    Ok(groups)
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}
