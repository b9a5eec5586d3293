//! Replacement orchestration — drives the per-file replacers across every
//! package and propagates renames through the dependency graph.
//!
//! The orchestrator owns the rename ledger: classmap renames accumulate
//! across the whole run, because a later package's propagation step may
//! depend on renames performed while processing an earlier package.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::autoload::Autoloader;
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::files::{self, FileSystem, LocalFs};
use crate::manifest::Package;
use crate::replace::{self, replace_classmap, replace_namespace};

/// Ordered record of every classmap rename performed during a run.
///
/// Insertion order is preserved and pairs are deduplicated by original
/// symbol. Replay applies pairs in this order, so a pair's replacement
/// text is never re-matched as a later pair's original.
#[derive(Debug, Default)]
pub struct RenameLedger {
    entries: Vec<(String, String)>,
}

impl RenameLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, original: String, replacement: String) {
        if !self.entries.iter().any(|(o, _)| *o == original) {
            self.entries.push((original, replacement));
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Counts reported back to the CLI after a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaceSummary {
    pub packages_processed: usize,
    pub files_changed: usize,
    pub propagation_files_changed: usize,
    pub renamed_symbols: usize,
}

/// The symbol replacement and propagation engine.
///
/// Single-threaded: the ledger is shared mutable state and renames are
/// strictly ordered. Every package is processed before any of its
/// dependents are propagated into.
pub struct Replacer {
    working_dir: PathBuf,
    config: ProjectConfig,
    fs: LocalFs,
    ledger: RenameLedger,
}

impl Replacer {
    pub fn new(working_dir: &Path, config: ProjectConfig) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            config,
            fs: files::local(),
            ledger: RenameLedger::new(),
        }
    }

    pub fn ledger(&self) -> &RenameLedger {
        &self.ledger
    }

    /// Seed a rename pair directly, as if it had been performed by a
    /// classmap pass. Lets propagation be driven without a full run.
    pub fn record_rename(&mut self, original: impl Into<String>, replacement: impl Into<String>) {
        self.ledger.record(original.into(), replacement.into());
    }

    /// Process every package, then propagate each package's renames into
    /// its dependents. `packages` must be ordered dependencies-first, as
    /// produced by manifest discovery.
    pub fn replace_project(&mut self, packages: &[Package]) -> Result<ReplaceSummary> {
        let mut summary = ReplaceSummary::default();

        for package in packages {
            summary.files_changed += self.replace_package(package)?;
            summary.packages_processed += 1;
        }

        for dependent in packages {
            for dependency_name in &dependent.dependencies {
                if let Some(dependency) = packages.iter().find(|p| p.name == *dependency_name) {
                    summary.propagation_files_changed +=
                        self.replace_parent_package(dependent, dependency)?;
                }
            }
        }

        summary.renamed_symbols = self.ledger.len();
        Ok(summary)
    }

    /// Apply every autoloader of `package` to the files in its scope
    /// directory. Returns the number of files rewritten.
    pub fn replace_package(&mut self, package: &Package) -> Result<usize> {
        let mut changed = 0;

        for autoloader in &package.autoloaders {
            let scope = self.scope_directory(autoloader, &package.name);
            for file in files::walk_php_files(&scope) {
                if self.replace_in_file(&file, autoloader)? {
                    changed += 1;
                }
            }
        }

        Ok(changed)
    }

    /// Re-apply `dependency`'s renames inside `dependent`'s files, so the
    /// dependent keeps referencing the dependency's new identifiers.
    ///
    /// The dependent's autoloaders determine which directories to
    /// re-scan; the dependency's autoloaders determine the rewrite. A
    /// namespace rename is a prefix insertion and can be re-applied
    /// directly (the idempotence guard keeps already-prefixed paths
    /// untouched); a classmap rename changes identifiers outright and is
    /// replayed from the ledger's exact original/replacement pairs.
    pub fn replace_parent_package(
        &mut self,
        dependent: &Package,
        dependency: &Package,
    ) -> Result<usize> {
        let mut changed = 0;

        for dependent_autoloader in &dependent.autoloaders {
            let scope = self.scope_directory(dependent_autoloader, &dependent.name);

            for dependency_autoloader in &dependency.autoloaders {
                match dependency_autoloader {
                    Autoloader::Namespace(_) => {
                        for file in files::walk_php_files(&scope) {
                            if self.replace_in_file(&file, dependency_autoloader)? {
                                changed += 1;
                            }
                        }
                    }
                    Autoloader::Classmap(_) => {
                        changed += self.replay_ledger(&scope)?;
                    }
                }
            }
        }

        Ok(changed)
    }

    /// Replay the accumulated ledger against every file under
    /// `directory`. No-op while the ledger is empty.
    pub fn replay_ledger(&self, directory: &Path) -> Result<usize> {
        if self.ledger.is_empty() {
            return Ok(0);
        }

        let mut changed = 0;

        for file in files::walk_php_files(directory) {
            let Some(contents) = self.fs.read_optional(&file)? else {
                continue;
            };
            if contents.is_empty() {
                continue;
            }

            let mut updated = contents.clone();
            for (original, replacement) in self.ledger.entries() {
                let (next, _) = replace::replace_symbol(&updated, original, replacement);
                updated = next;
            }

            if updated != contents {
                self.fs.write(&file, &updated)?;
                changed += 1;
            }
        }

        Ok(changed)
    }

    fn scope_directory(&self, autoloader: &Autoloader, package_name: &str) -> PathBuf {
        autoloader.scope_directory(
            &self.working_dir,
            &self.config.dep_directory,
            &self.config.classmap_directory,
            package_name,
        )
    }

    /// Rewrite one file under one autoloader. Unreadable or empty files
    /// are skipped; the file is written back only when the content
    /// actually changed. Returns whether a write happened.
    fn replace_in_file(&mut self, path: &Path, autoloader: &Autoloader) -> Result<bool> {
        let Some(contents) = self.fs.read_optional(path)? else {
            return Ok(false);
        };
        if contents.is_empty() {
            return Ok(false);
        }

        let updated = match autoloader {
            Autoloader::Namespace(ns) => {
                replace_namespace(&contents, &ns.namespace, &self.config.dep_namespace)
            }
            Autoloader::Classmap(cm) => {
                let (updated, renames) =
                    replace_classmap(&contents, &cm.symbols, &self.config.classmap_prefix);
                for (original, replacement) in renames {
                    self.ledger.record(original, replacement);
                }
                updated
            }
        };

        if updated == contents {
            return Ok(false);
        }

        self.fs.write(path, &updated)?;
        Ok(true)
    }
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

    fn namespace_package(name: &str, namespace: &str) -> Package {
        Package {
            name: name.to_string(),
            autoloaders: vec![Autoloader::Namespace(NamespaceAutoloader {
                namespace: namespace.to_string(),
                paths: vec!["src/".to_string()],
            })],
            dependencies: Vec::new(),
        }
    }

    fn classmap_package(name: &str, symbols: &[&str]) -> Package {
        Package {
            name: name.to_string(),
            autoloaders: vec![Autoloader::Classmap(ClassmapAutoloader {
                paths: vec!["classes/".to_string()],
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
            })],
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn missing_scope_directory_is_a_noop() {
        let dir = tempdir().unwrap();
        let mut replacer = Replacer::new(dir.path(), test_config());

        let changed = replacer
            .replace_package(&namespace_package("acme/lib", "Acme\\Lib"))
            .unwrap();

        assert_eq!(changed, 0);
        assert!(replacer.ledger().is_empty());
    }

    #[test]
    fn unchanged_files_are_not_counted_as_writes() {
        let dir = tempdir().unwrap();
        let scope = dir.path().join("vendorized/Acme/Lib");
        std::fs::create_dir_all(&scope).unwrap();
        std::fs::write(scope.join("other.php"), "<?php\necho 'no references';\n").unwrap();

        let mut replacer = Replacer::new(dir.path(), test_config());
        let changed = replacer
            .replace_package(&namespace_package("acme/lib", "Acme\\Lib"))
            .unwrap();

        assert_eq!(changed, 0);
    }

    #[test]
    fn classmap_renames_accumulate_in_the_ledger() {
        let dir = tempdir().unwrap();
        let scope = dir.path().join("vendorized/classes/acme/widgets");
        std::fs::create_dir_all(&scope).unwrap();
        std::fs::write(scope.join("Widget.php"), "<?php\nclass Widget {}\n").unwrap();

        let mut replacer = Replacer::new(dir.path(), test_config());
        let changed = replacer
            .replace_package(&classmap_package("acme/widgets", &["Widget"]))
            .unwrap();

        assert_eq!(changed, 1);
        assert_eq!(
            replacer.ledger().entries(),
            &[("Widget".to_string(), "Vendor_Widget".to_string())]
        );
        let content = std::fs::read_to_string(scope.join("Widget.php")).unwrap();
        assert_eq!(content, "<?php\nclass Vendor_Widget {}\n");
    }

    #[test]
    fn replay_with_empty_ledger_is_a_noop() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.php"), "<?php\nnew Widget();\n").unwrap();

        let replacer = Replacer::new(dir.path(), test_config());
        let changed = replacer.replay_ledger(dir.path()).unwrap();

        assert_eq!(changed, 0);
        let content = std::fs::read_to_string(dir.path().join("a.php")).unwrap();
        assert_eq!(content, "<?php\nnew Widget();\n");
    }

    #[test]
    fn replay_applies_seeded_ledger_with_exclusions() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.php"),
            "<?php\nrequire __DIR__ . '/Widget.php';\nreturn new Widget();\n",
        )
        .unwrap();

        let mut replacer = Replacer::new(dir.path(), test_config());
        replacer.record_rename("Widget", "Vendor_Widget");

        let changed = replacer.replay_ledger(dir.path()).unwrap();
        assert_eq!(changed, 1);

        let content = std::fs::read_to_string(dir.path().join("a.php")).unwrap();
        assert_eq!(
            content,
            "<?php\nrequire __DIR__ . '/Widget.php';\nreturn new Vendor_Widget();\n"
        );
    }

    #[test]
    fn classmap_propagation_rewrites_dependent_files() {
        let dir = tempdir().unwrap();

        // Dependency B: classmap package declaring Widget.
        let b_scope = dir.path().join("vendorized/classes/acme/widgets");
        std::fs::create_dir_all(&b_scope).unwrap();
        std::fs::write(b_scope.join("Widget.php"), "<?php\nclass Widget {}\n").unwrap();

        // Dependent A: namespace package using Widget.
        let a_scope = dir.path().join("vendorized/Acme/App");
        std::fs::create_dir_all(&a_scope).unwrap();
        std::fs::write(
            a_scope.join("Factory.php"),
            "<?php\nnamespace Acme\\App;\n\nfunction make() {\n    return new Widget();\n}\n",
        )
        .unwrap();

        let b = classmap_package("acme/widgets", &["Widget"]);
        let mut a = namespace_package("acme/app", "Acme\\App");
        a.dependencies = vec!["acme/widgets".to_string()];

        let mut replacer = Replacer::new(dir.path(), test_config());
        replacer.replace_package(&b).unwrap();
        replacer.replace_package(&a).unwrap();
        let changed = replacer.replace_parent_package(&a, &b).unwrap();

        assert_eq!(changed, 1);
        let content = std::fs::read_to_string(a_scope.join("Factory.php")).unwrap();
        assert!(content.contains("return new Vendor_Widget();"));
    }

    #[test]
    fn namespace_propagation_covers_shared_namespaces() {
        let dir = tempdir().unwrap();

        // B owns Acme\Lib; A autoloads under the same namespace.
        let shared_scope = dir.path().join("vendorized/Acme/Lib");
        std::fs::create_dir_all(&shared_scope).unwrap();
        std::fs::write(
            shared_scope.join("Core.php"),
            "<?php\nnamespace Acme\\Lib;\n\nclass Core {}\n",
        )
        .unwrap();
        std::fs::write(
            shared_scope.join("Addon.php"),
            "<?php\nnamespace Acme\\Lib;\n\nuse Acme\\Lib\\Core;\n\nclass Addon extends Core {}\n",
        )
        .unwrap();

        let b = namespace_package("acme/lib", "Acme\\Lib");
        let mut a = namespace_package("acme/lib-addon", "Acme\\Lib");
        a.dependencies = vec!["acme/lib".to_string()];

        let mut replacer = Replacer::new(dir.path(), test_config());
        replacer.replace_project(&[b, a]).unwrap();

        for file in ["Core.php", "Addon.php"] {
            let content = std::fs::read_to_string(shared_scope.join(file)).unwrap();
            assert!(
                !content.contains("namespace Acme\\Lib;"),
                "unprefixed namespace left in {}: {}",
                file,
                content
            );
            assert!(content.contains("Vendor\\Acme\\Lib"));
            assert!(!content.contains("Vendor\\Vendor\\"));
        }
    }

    #[test]
    fn second_run_over_rewritten_tree_changes_nothing() {
        let dir = tempdir().unwrap();
        let scope = dir.path().join("vendorized/Acme/Lib");
        std::fs::create_dir_all(&scope).unwrap();
        std::fs::write(
            scope.join("Core.php"),
            "<?php\nnamespace Acme\\Lib;\n\nnew \\Acme\\Lib\\Core();\n",
        )
        .unwrap();

        let package = namespace_package("acme/lib", "Acme\\Lib");

        let mut replacer = Replacer::new(dir.path(), test_config());
        assert_eq!(replacer.replace_package(&package).unwrap(), 1);
        assert_eq!(replacer.replace_package(&package).unwrap(), 0);
    }
}
