use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::autoload::{self, Autoloader};
use crate::config::{self, ProjectConfig};
use crate::error::{Error, Result};
use crate::files::{self, FileSystem};

/// One vendored package: identity, autoload strategies, and the names of
/// the packages it depends on. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub name: String,
    pub autoloaders: Vec<Autoloader>,
    pub dependencies: Vec<String>,
}

impl Package {
    /// Installed location of this package inside the vendor tree.
    pub fn vendor_path(&self, working_dir: &Path, config: &ProjectConfig) -> PathBuf {
        working_dir.join(&config.vendor_directory).join(&self.name)
    }
}

/// Discover the configured packages and their transitive dependencies
/// from the vendor tree.
///
/// Each package is read once. An explicitly configured package missing
/// from the vendor tree is an error; a missing transitive dependency is
/// skipped silently (partially-installed trees are legal). The result is
/// ordered dependencies-first, so a package is always processed before
/// anything that depends on it; a dependency cycle among the discovered
/// packages is rejected.
pub fn discover_packages(working_dir: &Path, config: &ProjectConfig) -> Result<Vec<Package>> {
    let fs = files::local();
    let mut packages: Vec<Package> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut queue: VecDeque<String> = config
        .packages
        .iter()
        .filter(|name| !config.is_excluded(name))
        .cloned()
        .collect();

    while let Some(name) = queue.pop_front() {
        if seen.contains(&name) {
            continue;
        }
        seen.push(name.clone());

        let manifest_path = working_dir
            .join(&config.vendor_directory)
            .join(&name)
            .join("composer.json");

        let Some(raw) = fs.read_optional(&manifest_path)? else {
            if config.packages.contains(&name) {
                return Err(Error::package_not_found(&name));
            }
            continue;
        };

        let manifest: Value = serde_json::from_str(&raw)
            .map_err(|e| Error::config_invalid_json(manifest_path.display().to_string(), e))?;

        let package = load_package(working_dir, config, &name, &manifest)?;

        for dependency in &package.dependencies {
            queue.push_back(dependency.clone());
        }

        packages.push(package);
    }

    order_by_dependencies(packages)
}

fn load_package(
    working_dir: &Path,
    config: &ProjectConfig,
    name: &str,
    manifest: &Value,
) -> Result<Package> {
    let mut autoloaders = manifest
        .get("autoload")
        .map(Autoloader::parse_section)
        .unwrap_or_default();

    let package_root = working_dir.join(&config.vendor_directory).join(name);
    for autoloader in &mut autoloaders {
        if let Autoloader::Classmap(classmap) = autoloader {
            classmap.symbols = autoload::discover_declared_symbols(&package_root, &classmap.paths)?;
        }
    }

    let dependencies = match manifest.get("require") {
        Some(Value::Object(require)) => require
            .keys()
            .filter(|dep| !config::is_platform_requirement(dep))
            .filter(|dep| !config.is_excluded(dep))
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    Ok(Package {
        name: name.to_string(),
        autoloaders,
        dependencies,
    })
}

/// Topological order, dependencies first. Dependencies pointing outside
/// the discovered set (not installed, excluded) don't constrain the
/// order; a cycle within the set is a configuration error because
/// propagation requires an acyclic dependency relation.
fn order_by_dependencies(packages: Vec<Package>) -> Result<Vec<Package>> {
    if packages.len() <= 1 {
        return Ok(packages);
    }

    let mut name_index = HashMap::new();
    for (idx, package) in packages.iter().enumerate() {
        name_index.insert(package.name.clone(), idx);
    }

    let mut indegree = vec![0usize; packages.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); packages.len()];

    for (idx, package) in packages.iter().enumerate() {
        for dependency in &package.dependencies {
            if let Some(&dep_idx) = name_index.get(dependency) {
                indegree[idx] += 1;
                dependents[dep_idx].push(idx);
            }
        }
    }

    let mut queue = VecDeque::new();
    for (idx, count) in indegree.iter().enumerate() {
        if *count == 0 {
            queue.push_back(idx);
        }
    }

    let mut ordered = Vec::with_capacity(packages.len());
    while let Some(idx) = queue.pop_front() {
        ordered.push(packages[idx].clone());
        for &child in &dependents[idx] {
            indegree[child] -= 1;
            if indegree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if ordered.len() != packages.len() {
        let pending: Vec<String> = packages
            .iter()
            .enumerate()
            .filter(|(idx, _)| indegree[*idx] > 0)
            .map(|(_, package)| package.name.clone())
            .collect();
        return Err(Error::config_invalid_value(
            "packages",
            Some(pending.join(", ")),
            "Package dependencies contain a cycle",
        ));
    }

    Ok(ordered)
}
