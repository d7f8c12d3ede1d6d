use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ROOT: &str = "root";
pub const DATA: &str = "data";
pub const FIG: &str = "fig";
pub const RESULT_FILE: &str = "result_file";

/// Whether a resolved entry is a folder that must exist or a file that may not yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    pub kind: EntryKind,
    pub path: PathBuf,
}

/// Resolved mapping of logical names to absolute paths used throughout a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSpec {
    entries: Vec<FolderEntry>,
}

impl FolderSpec {
    pub(crate) fn new(entries: Vec<FolderEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entry(name).map(|entry| entry.path.as_path())
    }

    pub fn entry(&self, name: &str) -> Option<&FolderEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn root(&self) -> Option<&Path> {
        self.get(ROOT)
    }

    pub fn data(&self) -> Option<&Path> {
        self.get(DATA)
    }

    pub fn fig(&self) -> Option<&Path> {
        self.get(FIG)
    }

    pub fn result_file(&self) -> Option<&Path> {
        self.get(RESULT_FILE)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderEntry> {
        self.entries.iter()
    }

    pub fn directories(&self) -> impl Iterator<Item = &FolderEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Relative folders and files to resolve under a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderLayout {
    /// (logical name, directory relative to root)
    pub folders: Vec<(String, PathBuf)>,
    /// (logical name, folder logical name, file name)
    pub files: Vec<(String, String, String)>,
}

impl FolderLayout {
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn folder(mut self, name: &str, relative: impl Into<PathBuf>) -> Self {
        self.folders.push((name.to_string(), relative.into()));
        self
    }

    pub fn file(mut self, name: &str, folder: &str, file_name: &str) -> Self {
        self.files
            .push((name.to_string(), folder.to_string(), file_name.to_string()));
        self
    }

    /// `data/` and `fig/` with the result table stored as `data/<result_file_name>`.
    pub fn analysis(result_file_name: &str) -> Self {
        Self::new()
            .folder(DATA, DATA)
            .folder(FIG, FIG)
            .file(RESULT_FILE, DATA, result_file_name)
    }
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self::analysis("research_outcome.csv")
    }
}
