use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Trait for file system operations, kept behind an interface so the
/// replacement engine can be tested against fixture trees.
pub trait FileSystem {
    fn read(&self, path: &Path) -> Result<String>;

    /// Read a file, mapping not-found and non-UTF-8 content to `None`.
    ///
    /// Vendored trees routinely contain placeholder files and binaries
    /// misnamed with a source extension; callers skip those rather than
    /// failing the run.
    fn read_optional(&self, path: &Path) -> Result<Option<String>>;

    fn write(&self, path: &Path, content: &str) -> Result<()>;

    fn ensure_dir(&self, dir: &Path) -> Result<()>;
}

/// Local filesystem implementation
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFs {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::internal_io(
                    format!("File not found: {}", path.display()),
                    Some("read file".to_string()),
                )
            } else {
                Error::internal_io(e.to_string(), Some("read file".to_string()))
            }
        })
    }

    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    || e.kind() == std::io::ErrorKind::InvalidData =>
            {
                Ok(None)
            }
            Err(e) => Err(Error::internal_io(
                e.to_string(),
                Some(format!("read {}", path.display())),
            )),
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        // Atomic write: write to temp file, then rename
        let parent = path.parent().ok_or_else(|| {
            Error::internal_io(
                format!("Invalid path: {}", path.display()),
                Some("write file".to_string()),
            )
        })?;

        let filename = path.file_name().ok_or_else(|| {
            Error::internal_io(
                format!("Invalid path: {}", path.display()),
                Some("write file".to_string()),
            )
        })?;

        let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

        fs::write(&tmp_path, content)
            .map_err(|e| Error::internal_io(e.to_string(), Some("write temp file".to_string())))?;

        fs::rename(&tmp_path, path)
            .map_err(|e| Error::internal_io(e.to_string(), Some("rename temp file".to_string())))?;

        Ok(())
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                Error::internal_io(e.to_string(), Some("create directory".to_string()))
            })?;
        }
        Ok(())
    }
}

/// Convenience function to get local filesystem
pub fn local() -> LocalFs {
    LocalFs::new()
}

/// Extension the engine operates on. Everything else in a package
/// directory is left untouched by the replacers.
pub const SOURCE_EXTENSION: &str = "php";

/// Enumerate source files under `root`, recursively.
///
/// A missing root directory is a legal empty result: packages may declare
/// autoloaders with no matching files on disk. Results are sorted so the
/// processing order is stable within a run.
pub fn walk_php_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_recursive(root, &mut files);
    files.sort();
    files
}

fn walk_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_recursive(&path, files);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == SOURCE_EXTENSION)
        {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_fs_write_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.php");
        let fs = local();

        fs.write(&path, "<?php echo 1;").unwrap();
        let content = fs.read(&path).unwrap();
        assert_eq!(content, "<?php echo 1;");
    }

    #[test]
    fn read_optional_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let fs = local();

        let content = fs.read_optional(&dir.path().join("absent.php")).unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn read_optional_non_utf8_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.php");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let content = local().read_optional(&path).unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn walk_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let files = walk_php_files(&dir.path().join("does-not-exist"));
        assert!(files.is_empty());
    }

    #[test]
    fn walk_filters_by_extension_and_recurses() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("src").join("Util");
        std::fs::create_dir_all(&sub).unwrap();

        std::fs::write(dir.path().join("a.php"), "<?php").unwrap();
        std::fs::write(dir.path().join("readme.md"), "docs").unwrap();
        std::fs::write(sub.join("b.php"), "<?php").unwrap();

        let files = walk_php_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "php"));
    }

    #[test]
    fn walk_order_is_stable() {
        let dir = tempdir().unwrap();
        for name in ["c.php", "a.php", "b.php"] {
            std::fs::write(dir.path().join(name), "<?php").unwrap();
        }

        let first = walk_php_files(dir.path());
        let second = walk_php_files(dir.path());
        assert_eq!(first, second);
    }
}
