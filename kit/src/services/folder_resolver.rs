use crate::{
    error::{KitError, Result},
    models::{EntryKind, FolderEntry, FolderLayout, FolderSpec, ROOT},
    utils::Logger,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Computes the folder structure of a run and makes sure its directories exist.
pub struct FolderResolver {
    root: PathBuf,
    layout: FolderLayout,
    logger: Logger,
}

impl FolderResolver {
    pub fn new(root: impl Into<PathBuf>, layout: FolderLayout) -> Self {
        Self {
            root: root.into(),
            layout,
            logger: Logger::new("FOLDERS"),
        }
    }

    /// Resolve every entry to an absolute path and create missing directories.
    ///
    /// Existing directories and files are left untouched, so calling this
    /// repeatedly yields the same spec.
    pub fn resolve(&self) -> Result<FolderSpec> {
        let root = absolute(&self.root)?;
        ensure_dir(&root)?;

        let mut entries = vec![FolderEntry {
            name: ROOT.to_string(),
            kind: EntryKind::Directory,
            path: root.clone(),
        }];

        for (name, relative) in &self.layout.folders {
            let path = root.join(relative);
            if !path.is_dir() {
                self.logger.info(&format!("Creating {} folder {}", name, path.display()));
            }
            ensure_dir(&path)?;
            entries.push(FolderEntry {
                name: name.clone(),
                kind: EntryKind::Directory,
                path,
            });
        }

        for (name, folder, file_name) in &self.layout.files {
            let base = entries
                .iter()
                .find(|entry| &entry.name == folder && entry.kind == EntryKind::Directory)
                .map(|entry| entry.path.clone())
                .ok_or_else(|| {
                    KitError::InvalidLayout(format!(
                        "file {} refers to unknown folder {}",
                        name, folder
                    ))
                })?;
            entries.push(FolderEntry {
                name: name.clone(),
                kind: EntryKind::File,
                path: base.join(file_name),
            });
        }

        self.logger.debug(&format!("Resolved {} entries under {}", entries.len(), root.display()));
        Ok(FolderSpec::new(entries))
    }
}

/// Resolve a path against the current working directory without touching the disk.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Create `path` and its parents unless it already exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| KitError::FolderCreation {
        path: path.to_path_buf(),
        source,
    })
}
