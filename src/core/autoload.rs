use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::files::{self, FileSystem};

/// How a package's classes are located. Exactly two strategies exist;
/// everything downstream dispatches on this variant once per autoloader.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Autoloader {
    Namespace(NamespaceAutoloader),
    Classmap(ClassmapAutoloader),
}

/// PSR-4/PSR-0 style: a namespace prefix mapped to source directories.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceAutoloader {
    /// Namespace to search for, stored without a trailing separator.
    pub namespace: String,
    /// Source paths inside the package the namespace maps from.
    pub paths: Vec<String>,
}

/// Explicit classmap: a set of files/directories and the global symbols
/// they declare.
#[derive(Debug, Clone, Serialize)]
pub struct ClassmapAutoloader {
    /// Paths inside the package covered by the classmap.
    pub paths: Vec<String>,
    /// Symbols declared by the package, longest first.
    pub symbols: Vec<String>,
}

impl Autoloader {
    /// Parse a composer `autoload` section into autoloader descriptors.
    ///
    /// `psr-4` and `psr-0` become namespace autoloaders (one per declared
    /// prefix), `classmap` becomes a single classmap autoloader. Other
    /// keys (`files`, `exclude-from-classmap`) carry no symbols to rename
    /// and are ignored.
    pub fn parse_section(section: &Value) -> Vec<Autoloader> {
        let mut autoloaders = Vec::new();

        for key in ["psr-4", "psr-0"] {
            if let Some(Value::Object(map)) = section.get(key) {
                for (namespace, paths) in map {
                    autoloaders.push(Autoloader::Namespace(NamespaceAutoloader {
                        namespace: namespace.trim_end_matches('\\').to_string(),
                        paths: path_list(paths),
                    }));
                }
            }
        }

        if let Some(paths) = section.get("classmap") {
            let paths = path_list(paths);
            if !paths.is_empty() {
                autoloaders.push(Autoloader::Classmap(ClassmapAutoloader {
                    paths,
                    symbols: Vec::new(),
                }));
            }
        }

        autoloaders
    }

    /// Directory the replacement walk for this autoloader is scoped to.
    ///
    /// Namespace packages land under the dependency directory organised
    /// by namespace path; classmap packages land under the classmap
    /// directory organised by package name.
    pub fn scope_directory(
        &self,
        working_dir: &Path,
        dep_directory: &str,
        classmap_directory: &str,
        package_name: &str,
    ) -> PathBuf {
        match self {
            Autoloader::Namespace(ns) => working_dir
                .join(dep_directory)
                .join(ns.namespace.replace('\\', "/")),
            Autoloader::Classmap(_) => working_dir.join(classmap_directory).join(package_name),
        }
    }
}

/// Composer path values are either a single string or an array of strings.
fn path_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Scan a package's classmap paths for declared global symbols.
///
/// One conservative declaration pattern covers `class`, `interface` and
/// `trait`, with optional `abstract`/`final` modifiers. This is lexical:
/// a declaration inside a comment would be picked up too, which at worst
/// renames a symbol nobody references.
pub fn discover_declared_symbols(package_root: &Path, paths: &[String]) -> Result<Vec<String>> {
    let pattern = Regex::new(
        r"\b(?:abstract\s+|final\s+)?(?:class|interface|trait)\s+([a-zA-Z_\x7f-\xff][a-zA-Z0-9_\x7f-\xff]*)",
    )
    .map_err(|e| Error::internal_unexpected(format!("declaration pattern: {}", e)))?;

    let fs = files::local();
    let mut symbols: Vec<String> = Vec::new();

    for path in paths {
        let target = package_root.join(path.trim_end_matches('/'));
        let candidates = if target.is_dir() {
            files::walk_php_files(&target)
        } else {
            vec![target]
        };

        for file in candidates {
            let Some(content) = fs.read_optional(&file)? else {
                continue;
            };
            for capture in pattern.captures_iter(&content) {
                symbols.push(capture[1].to_string());
            }
        }
    }

    // Longest first, ties lexicographic: the deterministic application
    // order the replacer relies on.
    symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    symbols.dedup();

    Ok(symbols)
}
