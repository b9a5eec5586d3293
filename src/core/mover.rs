//! Package staging — copies vendored package sources into the target
//! directories the replacement engine walks.
//!
//! Namespace packages land under the dependency directory organised by
//! namespace path (a file under the autoload source root keeps its path
//! relative to that root); classmap packages keep their package-relative
//! layout under the classmap directory.

use std::fs;
use std::path::Path;

use crate::autoload::Autoloader;
use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::files::{self, FileSystem};
use crate::manifest::Package;

pub struct Mover<'a> {
    working_dir: &'a Path,
    config: &'a ProjectConfig,
}

impl<'a> Mover<'a> {
    pub fn new(working_dir: &'a Path, config: &'a ProjectConfig) -> Self {
        Self {
            working_dir,
            config,
        }
    }

    /// Copy one package's source files into its scope directories.
    /// Missing source paths are skipped; existing targets are
    /// overwritten. Returns the number of files copied.
    pub fn move_package(&self, package: &Package) -> Result<usize> {
        let vendor_root = package.vendor_path(self.working_dir, self.config);
        let mut copied = 0;

        for autoloader in &package.autoloaders {
            let target_root = autoloader.scope_directory(
                self.working_dir,
                &self.config.dep_directory,
                &self.config.classmap_directory,
                &package.name,
            );

            match autoloader {
                Autoloader::Namespace(ns) => {
                    for path in &ns.paths {
                        let source_root = vendor_root.join(path.trim_end_matches('/'));
                        copied += copy_tree(&source_root, &source_root, &target_root)?;
                    }
                }
                Autoloader::Classmap(cm) => {
                    for path in &cm.paths {
                        let source = vendor_root.join(path.trim_end_matches('/'));
                        copied += copy_tree(&source, &vendor_root, &target_root)?;
                    }
                }
            }
        }

        Ok(copied)
    }

    /// Remove the original package directories from the vendor tree.
    /// Only called after every package has been copied, since discovery
    /// and staging of later packages may still read the vendor tree.
    pub fn delete_vendor_sources(&self, packages: &[Package]) -> Result<()> {
        for package in packages {
            let vendor_root = package.vendor_path(self.working_dir, self.config);
            if vendor_root.exists() {
                fs::remove_dir_all(&vendor_root).map_err(|e| {
                    Error::internal_io(
                        e.to_string(),
                        Some(format!("remove {}", vendor_root.display())),
                    )
                })?;
            }
        }
        Ok(())
    }
}

/// Copy every source file under `source` into `target_root`, keeping
/// paths relative to `relative_root`. `source` may be a single file.
fn copy_tree(source: &Path, relative_root: &Path, target_root: &Path) -> Result<usize> {
    let candidates = if source.is_dir() {
        files::walk_php_files(source)
    } else if source.exists() {
        vec![source.to_path_buf()]
    } else {
        return Ok(0);
    };

    let fs_handle = files::local();
    let mut copied = 0;

    for file in candidates {
        let relative = file.strip_prefix(relative_root).unwrap_or(&file);
        let target = target_root.join(relative);

        if let Some(parent) = target.parent() {
            fs_handle.ensure_dir(parent)?;
        }

        fs::copy(&file, &target).map_err(|e| {
            Error::internal_io(
                e.to_string(),
                Some(format!("copy {} -> {}", file.display(), target.display())),
            )
        })?;
        copied += 1;
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoload::{ClassmapAutoloader, NamespaceAutoloader};
    use tempfile::tempdir;

    fn test_config() -> ProjectConfig {
        ProjectConfig {
            dep_namespace: "Vendor\\".to_string(),
            classmap_prefix: "Vendor_".to_string(),
            dep_directory: "vendorized/".to_string(),
            classmap_directory: "vendorized/classes/".to_string(),
            vendor_directory: "vendor/".to_string(),
            packages: Vec::new(),
            exclude_packages: Vec::new(),
            delete_vendor_directories: true,
        }
    }

    #[test]
    fn moves_namespace_package_relative_to_source_root() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("vendor/acme/lib/src/Util");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("Helper.php"), "<?php\n").unwrap();

        let config = test_config();
        let package = Package {
            name: "acme/lib".to_string(),
            autoloaders: vec![Autoloader::Namespace(NamespaceAutoloader {
                namespace: "Acme\\Lib".to_string(),
                paths: vec!["src/".to_string()],
            })],
            dependencies: Vec::new(),
        };

        let copied = Mover::new(dir.path(), &config).move_package(&package).unwrap();
        assert_eq!(copied, 1);
        assert!(dir
            .path()
            .join("vendorized/Acme/Lib/Util/Helper.php")
            .exists());
    }

    #[test]
    fn moves_classmap_package_keeping_package_layout() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("vendor/acme/widgets/classes");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("Widget.php"), "<?php\nclass Widget {}\n").unwrap();

        let config = test_config();
        let package = Package {
            name: "acme/widgets".to_string(),
            autoloaders: vec![Autoloader::Classmap(ClassmapAutoloader {
                paths: vec!["classes/".to_string()],
                symbols: vec!["Widget".to_string()],
            })],
            dependencies: Vec::new(),
        };

        let copied = Mover::new(dir.path(), &config).move_package(&package).unwrap();
        assert_eq!(copied, 1);
        assert!(dir
            .path()
            .join("vendorized/classes/acme/widgets/classes/Widget.php")
            .exists());
    }

    #[test]
    fn missing_source_path_is_skipped() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vendor/acme/lib")).unwrap();

        let config = test_config();
        let package = Package {
            name: "acme/lib".to_string(),
            autoloaders: vec![Autoloader::Namespace(NamespaceAutoloader {
                namespace: "Acme\\Lib".to_string(),
                paths: vec!["src/".to_string()],
            })],
            dependencies: Vec::new(),
        };

        let copied = Mover::new(dir.path(), &config).move_package(&package).unwrap();
        assert_eq!(copied, 0);
    }

    #[test]
    fn delete_vendor_sources_removes_package_dirs() {
        let dir = tempdir().unwrap();
        let vendor = dir.path().join("vendor/acme/lib");
        std::fs::create_dir_all(&vendor).unwrap();
        std::fs::write(vendor.join("composer.json"), "{}").unwrap();

        let config = test_config();
        let package = Package {
            name: "acme/lib".to_string(),
            autoloaders: Vec::new(),
            dependencies: Vec::new(),
        };

        Mover::new(dir.path(), &config)
            .delete_vendor_sources(&[package])
            .unwrap();
        assert!(!vendor.exists());
    }
}
