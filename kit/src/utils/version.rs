use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// The working tree has no readable commit (git missing, not a repository, no commits).
///
/// Runs go on without it; callers log it as a warning.
#[derive(Debug, Error)]
#[error("version information unavailable: {reason}")]
pub struct VersionInfoUnavailable {
    pub reason: String,
}

/// Hash of the latest commit in the repository containing `dir`.
pub fn current_commit(dir: &Path) -> Result<String, VersionInfoUnavailable> {
    let output = Command::new("git")
        .args(["log", "--pretty=format:%H", "-n1"])
        .current_dir(dir)
        .output()
        .map_err(|e| VersionInfoUnavailable {
            reason: format!("failed to run git: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VersionInfoUnavailable {
            reason: if stderr.is_empty() {
                format!("git exited with {}", output.status)
            } else {
                stderr
            },
        });
    }

    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if commit.is_empty() {
        return Err(VersionInfoUnavailable {
            reason: "no commits".to_string(),
        });
    }
    Ok(commit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(current_commit(&missing).is_err());
    }

    #[test]
    fn test_commit_hash_in_fresh_repository() {
        let dir = tempfile::tempdir().unwrap();
        let git = |args: &[&str]| {
            Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
        };
        // Environments without git only exercise the error path.
        let Ok(init) = git(&["init", "-q"]) else {
            assert!(current_commit(dir.path()).is_err());
            return;
        };
        assert!(init.status.success());
        assert!(current_commit(dir.path()).is_err());

        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        git(&["add", "a.txt"]).unwrap();
        let commit = git(&[
            "-c",
            "user.name=test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "-m",
            "seed",
        ])
        .unwrap();
        assert!(commit.status.success());

        let hash = current_commit(dir.path()).unwrap();
        assert_eq!(hash.len(), 40);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
