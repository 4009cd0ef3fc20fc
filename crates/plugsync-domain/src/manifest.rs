use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Manifest-level failures. Both abort the run before any reconciliation,
/// unlike per-item defects which only drop the offending entry.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest {} could not be read", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest {} could not be parsed", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// Loads the YAML manifest as an ordered sequence of loosely-typed records.
///
/// # Errors
///
/// Returns [`ManifestError`] when the file cannot be read or is not a
/// well-formed YAML sequence.
pub fn load_manifest(path: &Path) -> Result<Vec<RawManifestItem>, ManifestError> {
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yml::from_str(&contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// One manifest record exactly as decoded, before validation. Every field is
/// optional here; the normalizer decides what survives.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawManifestItem {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub location: Option<String>,
    pub version: Option<Scalar>,
    pub status: Option<Scalar>,
    pub skip: Option<ListField>,
    pub force: Option<ListField>,
    pub init: Option<ListField>,
}

impl RawManifestItem {
    /// The identifier as declared: `name` wins over `slug`, empty strings
    /// count as absent.
    #[must_use]
    pub fn declared_name(&self) -> Option<&str> {
        non_empty(self.name.as_deref()).or_else(|| non_empty(self.slug.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A YAML scalar that operators may write as a bare number or a string
/// (`version: 2.1.0` vs `version: "2.1.0"` vs `status: -1`).
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Int(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Text(value) => value.trim().to_string(),
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(value) => Some(*value),
            Scalar::Float(value) => Some(*value as i64),
            Scalar::Text(value) => value.trim().parse().ok(),
        }
    }
}

/// A field that accepts both the original manifest dialect (one
/// delimiter-separated string) and a YAML sequence.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    One(String),
    Many(Vec<String>),
}

impl ListField {
    /// Splits the single-string form on `separator`; sequences pass through.
    /// Entries are trimmed, empty ones dropped.
    #[must_use]
    pub fn entries(&self, separator: char) -> Vec<String> {
        let raw: Vec<&str> = match self {
            ListField::One(value) => value.split(separator).collect(),
            ListField::Many(values) => values.iter().map(String::as_str).collect(),
        };
        raw.iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect()
    }
}

/// Desired end state for one declared plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DesiredStatus {
    /// Installed but deactivated (`-1` in the manifest).
    Inactive,
    /// Declared without an activation opinion (`0`).
    Neutral,
    /// Installed and activated (`1`).
    Active,
}

impl DesiredStatus {
    #[must_use]
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            -1 => Some(DesiredStatus::Inactive),
            0 => Some(DesiredStatus::Neutral),
            1 => Some(DesiredStatus::Active),
            _ => None,
        }
    }
}

/// A resolved install source for a plugin that does not come from the
/// default plugin registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginSource {
    Local(PathBuf),
    Remote(String),
}

impl PluginSource {
    /// The form wp-cli's `plugin install` accepts in place of a slug.
    #[must_use]
    pub fn as_install_arg(&self) -> String {
        match self {
            PluginSource::Local(path) => path.display().to_string(),
            PluginSource::Remote(url) => url.clone(),
        }
    }

    #[must_use]
    pub fn is_zip(&self) -> bool {
        let name = match self {
            PluginSource::Local(path) => path.to_string_lossy().to_lowercase(),
            PluginSource::Remote(url) => url.to_lowercase(),
        };
        name.ends_with(".zip")
    }

    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            PluginSource::Local(path) => Some(path),
            PluginSource::Remote(_) => None,
        }
    }
}

/// One validated manifest entry. Produced exclusively by
/// [`crate::normalize_items`]; downstream components never see the raw
/// decoded shape. Immutable after normalization.
#[derive(Clone, Debug)]
pub struct ManifestItem {
    /// Slugified identifier, the map key and sweep membership token.
    pub slug: String,
    /// The identifier exactly as declared; every wp-cli command uses this
    /// spelling, which is case- and punctuation-sensitive where the slug
    /// is not.
    pub name: String,
    /// Resolved install source; `None` means install by identifier from the
    /// default registry.
    pub source: Option<PluginSource>,
    pub version: String,
    pub status: DesiredStatus,
    /// Set during normalization when a force pattern matches the target URL;
    /// bypasses the version-equality short-circuit.
    pub force: bool,
    /// Raw command strings to run against wp-cli after reconciling the item.
    pub init: Vec<String>,
}
