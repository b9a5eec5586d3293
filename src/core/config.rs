use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};
use crate::files::{self, FileSystem};

/// Resolved vendorize configuration for one run.
///
/// Loaded from the host project's `composer.json` under `extra.vendorize`.
/// Directory values are normalised to end with `/`; the dependency
/// namespace is normalised to end with `\` so the replacer can prepend it
/// verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectConfig {
    pub dep_namespace: String,
    pub classmap_prefix: String,
    pub dep_directory: String,
    pub classmap_directory: String,
    pub vendor_directory: String,
    pub packages: Vec<String>,
    pub exclude_packages: Vec<String>,
    pub delete_vendor_directories: bool,
}

/// Raw JSON shape of the `extra.vendorize` section.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    dep_namespace: Option<String>,
    classmap_prefix: Option<String>,
    dep_directory: Option<String>,
    classmap_directory: Option<String>,
    vendor_directory: Option<String>,
    #[serde(default)]
    packages: Vec<String>,
    #[serde(default)]
    exclude_packages: Vec<String>,
    delete_vendor_directories: Option<bool>,
}

const DEFAULT_DEP_DIRECTORY: &str = "vendorized/";
const DEFAULT_CLASSMAP_DIRECTORY: &str = "vendorized/classes/";
const DEFAULT_VENDOR_DIRECTORY: &str = "vendor/";

impl ProjectConfig {
    /// Load and validate configuration from `<working_dir>/composer.json`.
    ///
    /// When the config lists no explicit `packages`, the host project's
    /// `require` section is used, with platform requirements filtered out.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let manifest_path = working_dir.join("composer.json");
        let fs = files::local();

        let raw = fs.read_optional(&manifest_path)?.ok_or_else(|| {
            Error::config_missing_key(
                "composer.json",
                Some(manifest_path.display().to_string()),
            )
            .with_hint("Run vendorize from a directory containing composer.json")
        })?;

        let manifest: Value = serde_json::from_str(&raw)
            .map_err(|e| Error::config_invalid_json(manifest_path.display().to_string(), e))?;

        let section = manifest
            .get("extra")
            .and_then(|extra| extra.get("vendorize"))
            .ok_or_else(|| {
                Error::config_missing_key(
                    "extra.vendorize",
                    Some(manifest_path.display().to_string()),
                )
                .with_hint("Add an 'extra': {'vendorize': {...}} section to composer.json")
            })?;

        let config: RawConfig = serde_json::from_value(section.clone())
            .map_err(|e| Error::config_invalid_json(manifest_path.display().to_string(), e))?;

        let dep_namespace = config.dep_namespace.ok_or_else(|| {
            Error::config_missing_key("extra.vendorize.dep_namespace", None)
        })?;
        let classmap_prefix = config.classmap_prefix.ok_or_else(|| {
            Error::config_missing_key("extra.vendorize.classmap_prefix", None)
        })?;

        if dep_namespace.is_empty() {
            return Err(Error::config_invalid_value(
                "extra.vendorize.dep_namespace",
                Some(dep_namespace),
                "must not be empty",
            ));
        }
        if classmap_prefix.is_empty() {
            return Err(Error::config_invalid_value(
                "extra.vendorize.classmap_prefix",
                Some(classmap_prefix),
                "must not be empty",
            ));
        }

        let packages = if config.packages.is_empty() {
            required_packages(&manifest)
        } else {
            config.packages
        };

        Ok(Self {
            dep_namespace: normalize_namespace(&dep_namespace),
            classmap_prefix,
            dep_directory: normalize_directory(
                config.dep_directory.as_deref().unwrap_or(DEFAULT_DEP_DIRECTORY),
            ),
            classmap_directory: normalize_directory(
                config
                    .classmap_directory
                    .as_deref()
                    .unwrap_or(DEFAULT_CLASSMAP_DIRECTORY),
            ),
            vendor_directory: normalize_directory(
                config
                    .vendor_directory
                    .as_deref()
                    .unwrap_or(DEFAULT_VENDOR_DIRECTORY),
            ),
            packages,
            exclude_packages: config.exclude_packages,
            delete_vendor_directories: config.delete_vendor_directories.unwrap_or(true),
        })
    }

    pub fn is_excluded(&self, package_name: &str) -> bool {
        self.exclude_packages.iter().any(|p| p == package_name)
    }
}

/// Package names from the host `require` section, minus platform
/// requirements (`php`, `ext-*`, `composer-plugin-api`).
fn required_packages(manifest: &Value) -> Vec<String> {
    let Some(Value::Object(require)) = manifest.get("require") else {
        return Vec::new();
    };

    require
        .keys()
        .filter(|name| !is_platform_requirement(name))
        .cloned()
        .collect()
}

pub(crate) fn is_platform_requirement(name: &str) -> bool {
    name == "php" || name == "composer-plugin-api" || name.starts_with("ext-")
}

fn normalize_directory(dir: &str) -> String {
    let trimmed = dir.trim_start_matches("./");
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

fn normalize_namespace(namespace: &str) -> String {
    if namespace.ends_with('\\') {
        namespace.to_string()
    } else {
        format!("{}\\", namespace)
    }
}
