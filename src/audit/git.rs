// src/audit/git.rs

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use git2::Repository;

/// Finds the top-level directory of the repository containing a path.
pub trait GitRootLocator: Send + Sync + Debug {
    fn find_root(&self, path: &Path) -> Result<PathBuf>;
}

/// Locator backed by libgit2.
#[derive(Debug, Clone, Default)]
pub struct Git2RootLocator;

impl GitRootLocator for Git2RootLocator {
    fn find_root(&self, path: &Path) -> Result<PathBuf> {
        // Repository::discover walks up the directory tree to find .git
        let repo = Repository::discover(path)
            .with_context(|| format!("discovering git repository for {:?}", path))?;
        repo.workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("repository at {:?} is bare", repo.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_root_from_nested_directory() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let nested = tmp.path().join("aws").join("prod");
        std::fs::create_dir_all(&nested).unwrap();

        let root = Git2RootLocator.find_root(&nested).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }
}
