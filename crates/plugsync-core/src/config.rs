use std::fs;
use std::path::PathBuf;

/// Fatal configuration problems, detected before any external command is
/// spawned. Together with a manifest parse failure these are the only
/// conditions that abort an entire run.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("manifest file {} could not be resolved", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("install root {} could not be resolved to a directory", .0.display())]
    InstallRootNotFound(PathBuf),
    #[error("target url must not be empty")]
    EmptyTargetUrl,
}

/// Everything one reconciliation run needs to know, validated up front.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Path to the YAML plugin manifest.
    pub manifest: PathBuf,
    /// Target site URL; also the haystack for skip/force patterns.
    pub url: String,
    /// WordPress install root, forwarded to wp-cli as `--path`.
    pub install_root: PathBuf,
    /// Identifiers the uninstall sweep must never touch.
    pub ignore: Vec<String>,
    pub skip_sweep: bool,
    pub skip_archive: bool,
    /// Plan only: read-only wp-cli calls still run, mutations are recorded
    /// but not issued.
    pub dry_run: bool,
    /// wp-cli executable to drive.
    pub wp_bin: String,
    /// Forward `--allow-root` to wp-cli.
    pub allow_root: bool,
}

impl RunConfig {
    /// Validates the fatal trio (manifest path, target URL, install root)
    /// and canonicalizes both paths so later relative-path repairs are
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] naming the first unusable setting.
    pub fn resolve(mut self) -> Result<Self, SetupError> {
        if self.url.trim().is_empty() {
            return Err(SetupError::EmptyTargetUrl);
        }
        self.manifest = fs::canonicalize(&self.manifest)
            .map_err(|_| SetupError::ManifestNotFound(self.manifest.clone()))?;
        if !self.manifest.is_file() {
            return Err(SetupError::ManifestNotFound(self.manifest));
        }
        self.install_root = fs::canonicalize(&self.install_root)
            .map_err(|_| SetupError::InstallRootNotFound(self.install_root.clone()))?;
        if !self.install_root.is_dir() {
            return Err(SetupError::InstallRootNotFound(self.install_root));
        }
        self.ignore = self
            .ignore
            .iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect();
        Ok(self)
    }
}

#[cfg(test)]
pub(crate) fn test_config(manifest: PathBuf, install_root: PathBuf) -> RunConfig {
    RunConfig {
        manifest,
        url: "https://www.example.com".into(),
        install_root,
        ignore: Vec::new(),
        skip_sweep: false,
        skip_archive: false,
        dry_run: false,
        wp_bin: "wp".into(),
        allow_root: false,
    }
}
