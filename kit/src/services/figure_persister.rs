use crate::{
    charts::{Figure, FigureOptions},
    error::{KitError, Result},
    services::folder_resolver::{absolute, ensure_dir},
    utils::{sanitize_base_name, Logger, FIGURE_EXTENSION},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// What to do when two different titles sanitize to the same file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Replace the earlier figure (last writer wins).
    #[default]
    Overwrite,
    /// Refuse to save and return an error.
    Fail,
    /// Append `_2`, `_3`, ... to the base name.
    Disambiguate,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Fail => "fail",
            CollisionPolicy::Disambiguate => "disambiguate",
        }
    }
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "fail" => Ok(CollisionPolicy::Fail),
            "disambiguate" => Ok(CollisionPolicy::Disambiguate),
            other => Err(format!(
                "unknown collision policy {} (expected overwrite, fail or disambiguate)",
                other
            )),
        }
    }
}

/// Saves figures under sanitized file names in one output folder.
///
/// Remembers which title produced each file name during its lifetime so that
/// name collisions between different titles can be handled per policy.
pub struct FigurePersister {
    folder: PathBuf,
    options: FigureOptions,
    policy: CollisionPolicy,
    used: HashMap<String, String>,
    logger: Logger,
}

impl FigurePersister {
    pub fn new(
        folder: impl Into<PathBuf>,
        options: FigureOptions,
        policy: CollisionPolicy,
    ) -> Self {
        Self {
            folder: folder.into(),
            options,
            policy,
            used: HashMap::new(),
            logger: Logger::new("FIGURES"),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File name the title maps to, after applying the collision policy.
    fn claim_file_name(&mut self, title: &str) -> Result<String> {
        let base = sanitize_base_name(title);
        if base.is_empty() {
            self.logger.warn(&format!(
                "Title {:?} has no usable characters, saving as .{}",
                title, FIGURE_EXTENSION
            ));
        }

        let mut file_name = format!("{}.{}", base, FIGURE_EXTENSION);
        match self.used.get(&file_name) {
            Some(existing) if existing != title => match self.policy {
                CollisionPolicy::Overwrite => {
                    self.logger.warn(&format!(
                        "{} was saved for {:?}, overwriting with {:?}",
                        file_name, existing, title
                    ));
                }
                CollisionPolicy::Fail => {
                    return Err(KitError::FigureNameCollision {
                        file_name,
                        existing_title: existing.clone(),
                        title: title.to_string(),
                    });
                }
                CollisionPolicy::Disambiguate => {
                    let mut suffix = 2;
                    loop {
                        let candidate_base = if base.is_empty() {
                            suffix.to_string()
                        } else {
                            format!("{}_{}", base, suffix)
                        };
                        file_name = format!("{}.{}", candidate_base, FIGURE_EXTENSION);
                        match self.used.get(&file_name) {
                            Some(other) if other != title => suffix += 1,
                            _ => break,
                        }
                    }
                    self.logger.info(&format!(
                        "Name collision for {:?}, using {}",
                        title, file_name
                    ));
                }
            },
            _ => {}
        }

        self.used.insert(file_name.clone(), title.to_string());
        Ok(file_name)
    }

    /// Render the figure into the output folder and return the written path.
    pub fn save(&mut self, figure: &dyn Figure) -> Result<PathBuf> {
        let folder = absolute(&self.folder)?;
        ensure_dir(&folder)?;

        let file_name = self.claim_file_name(figure.title())?;
        let path = folder.join(&file_name);

        figure.render(&path, &self.options)?;
        self.logger.info(&format!("Saved figure {}", path.display()));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Writes its title so tests can tell which figure produced a file.
    struct StubFigure(String);

    impl Figure for StubFigure {
        fn title(&self) -> &str {
            &self.0
        }

        fn render(&self, path: &Path, _options: &FigureOptions) -> Result<()> {
            fs::write(path, &self.0)?;
            Ok(())
        }
    }

    fn persister(folder: &Path, policy: CollisionPolicy) -> FigurePersister {
        FigurePersister::new(folder, FigureOptions::default(), policy)
    }

    #[test]
    fn test_saves_under_sanitized_name_and_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("fig").join("nested");
        let mut persister = persister(&folder, CollisionPolicy::Overwrite);

        let path = persister
            .save(&StubFigure("Pairwise correlations of scientific outcome".to_string()))
            .unwrap();

        assert_eq!(
            path,
            folder.join("Pairwise_correlations_of_scientific_outcome.png")
        );
        assert!(path.exists());
    }

    #[test]
    fn test_punctuation_title_saves_degenerate_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = persister(dir.path(), CollisionPolicy::Overwrite);

        let path = persister.save(&StubFigure("!!!".to_string())).unwrap();
        assert_eq!(path.file_name().unwrap(), ".png");
        assert!(path.exists());
    }

    #[test]
    fn test_overwrite_policy_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = persister(dir.path(), CollisionPolicy::Overwrite);

        let first = persister.save(&StubFigure("GDP vs. pop".to_string())).unwrap();
        let second = persister.save(&StubFigure("GDP vs pop".to_string())).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "GDP vs pop");
    }

    #[test]
    fn test_fail_policy_rejects_collision() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = persister(dir.path(), CollisionPolicy::Fail);

        let first = persister.save(&StubFigure("GDP vs. pop".to_string())).unwrap();
        let result = persister.save(&StubFigure("GDP vs pop".to_string()));

        assert!(matches!(result, Err(KitError::FigureNameCollision { .. })));
        assert_eq!(fs::read_to_string(&first).unwrap(), "GDP vs. pop");
    }

    #[test]
    fn test_same_title_twice_is_not_a_collision() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = persister(dir.path(), CollisionPolicy::Fail);

        let first = persister.save(&StubFigure("same".to_string())).unwrap();
        let second = persister.save(&StubFigure("same".to_string())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_disambiguate_policy_appends_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = persister(dir.path(), CollisionPolicy::Disambiguate);

        let a = persister.save(&StubFigure("a: b".to_string())).unwrap();
        let b = persister.save(&StubFigure("a b".to_string())).unwrap();
        let c = persister.save(&StubFigure("a  b".to_string())).unwrap();
        let b_again = persister.save(&StubFigure("a b".to_string())).unwrap();

        assert_eq!(a.file_name().unwrap(), "a_b.png");
        assert_eq!(b.file_name().unwrap(), "a_b_2.png");
        assert_eq!(c.file_name().unwrap(), "a_b_3.png");
        assert_eq!(b_again, b);
        assert_eq!(fs::read_to_string(&a).unwrap(), "a: b");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Fail".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Fail);
        assert_eq!(
            "disambiguate".parse::<CollisionPolicy>().unwrap(),
            CollisionPolicy::Disambiguate
        );
        assert!("ignore".parse::<CollisionPolicy>().is_err());
        assert_eq!(CollisionPolicy::default().as_str(), "overwrite");
    }
}
