//! Path resolution for the cache root and log file.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{CtuError, Result};

/// Make `path` absolute against the current directory and fold `.`/`..`
/// components without touching the filesystem.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    fold_components(&absolute)
}

/// Resolve and create the cache root directory.
///
/// Failure here is the one unrecoverable cache error: without a root the
/// process cannot persist anything, so startup aborts.
pub fn prepare_cache_root(path: &Path) -> Result<PathBuf> {
    let root = absolutize(path);
    fs::create_dir_all(&root).map_err(|source| CtuError::io(&root, source))?;
    if !root.is_dir() {
        return Err(CtuError::InvalidConfig {
            details: format!("cache root {} is not a directory", root.display()),
        });
    }
    Ok(root)
}

/// Resolve the log file path and create its parent directory.
pub fn prepare_log_file(path: &Path) -> Result<PathBuf> {
    let file = absolutize(path);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|source| CtuError::io(parent, source))?;
    }
    Ok(file)
}

fn fold_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_become_absolute() {
        let resolved = absolutize(Path::new("cache"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("cache"));
    }

    #[cfg(unix)]
    #[test]
    fn dot_segments_are_folded() {
        let resolved = absolutize(Path::new("/srv/ctu/./cache/../logs"));
        assert_eq!(resolved, PathBuf::from("/srv/ctu/logs"));
    }

    #[test]
    fn prepare_cache_root_creates_nested_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a").join("b").join("cache");
        let root = prepare_cache_root(&target).expect("prepare");
        assert!(root.is_dir());
    }

    #[test]
    fn prepare_cache_root_rejects_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not-a-dir");
        fs::write(&file, b"x").expect("write");
        let err = prepare_cache_root(&file).expect_err("file is not a dir");
        assert!(matches!(err, CtuError::Io { .. } | CtuError::InvalidConfig { .. }));
    }

    #[test]
    fn prepare_log_file_creates_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("logs").join("debug.log");
        let resolved = prepare_log_file(&file).expect("prepare");
        assert!(resolved.parent().expect("parent").is_dir());
        assert!(!resolved.exists());
    }
}
