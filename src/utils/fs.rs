//! File system helpers shared by the build stages.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Collect all files from a directory recursively, in file-name order.
///
/// Symbolic links are followed, so a linked file is listed under the link's
/// path. A missing directory yields an empty list; any other walk error,
/// including a dangling link, is returned.
pub fn collect_all_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Create `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// Mirror every file under `src` into `dst`, preserving relative paths.
///
/// Returns the number of files copied; a missing `src` copies nothing.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for path in collect_all_files(src)? {
        let rel = path.strip_prefix(src)?;
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&path, &target).with_context(|| {
            format!("Failed to copy {} to {}", path.display(), target.display())
        })?;
        copied += 1;
    }
    Ok(copied)
}

/// Remove every subdirectory of `root`, leaving `root` and its plain files.
///
/// A missing `root` is created instead.
pub fn clear_subdirs(root: &Path) -> Result<()> {
    if !root.exists() {
        return ensure_dir(root);
    }

    let entries =
        fs::read_dir(root).with_context(|| format!("Failed to read {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Invalid entry in {}", root.display()))?;
        if entry.file_type()?.is_dir() {
            let path = entry.path();
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_all_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("sub/c.txt"), "").unwrap();

        let names: Vec<_> = collect_all_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            [
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub/c.txt"),
            ]
        );
    }

    #[test]
    fn test_collect_all_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_all_files(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let real = TempDir::new().unwrap();
        fs::write(real.path().join("real.css"), "body{}").unwrap();
        fs::create_dir(real.path().join("fonts")).unwrap();
        fs::write(real.path().join("fonts/a.woff"), "woff").unwrap();
        symlink(real.path().join("real.css"), src.path().join("site.css")).unwrap();
        symlink(real.path().join("fonts"), src.path().join("fonts")).unwrap();

        let copied = copy_dir(src.path(), dst.path()).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.path().join("site.css")).unwrap(), "body{}");
        assert_eq!(fs::read_to_string(dst.path().join("fonts/a.woff")).unwrap(), "woff");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_fails_on_dangling_symlink() {
        use std::os::unix::fs::symlink;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("ok.css"), "").unwrap();
        symlink(src.path().join("gone.css"), src.path().join("broken.css")).unwrap();

        assert!(copy_dir(src.path(), dst.path()).is_err());
    }

    #[test]
    fn test_copy_dir_preserves_layout() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("css/fonts")).unwrap();
        fs::write(src.path().join("css/fonts/a.woff"), [0u8, 1, 2]).unwrap();
        fs::write(src.path().join("favicon.ico"), "ico").unwrap();

        let copied = copy_dir(src.path(), dst.path()).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read(dst.path().join("css/fonts/a.woff")).unwrap(), [0, 1, 2]);
        assert_eq!(fs::read_to_string(dst.path().join("favicon.ico")).unwrap(), "ico");
    }

    #[test]
    fn test_copy_dir_missing_source() {
        let dst = TempDir::new().unwrap();
        assert_eq!(copy_dir(&dst.path().join("nope"), dst.path()).unwrap(), 0);
    }

    #[test]
    fn test_clear_subdirs_keeps_root_files() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("xml/0x0001")).unwrap();
        fs::create_dir(root.path().join("html")).unwrap();
        fs::write(root.path().join("keep.txt"), "x").unwrap();

        clear_subdirs(root.path()).unwrap();

        assert!(!root.path().join("xml").exists());
        assert!(!root.path().join("html").exists());
        assert!(root.path().join("keep.txt").exists());
    }

    #[test]
    fn test_clear_subdirs_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("output");
        clear_subdirs(&root).unwrap();
        assert!(root.is_dir());
    }
}
