use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// Directory under the plugin storage root that holds change-detection
/// copies of zip-sourced packages.
const ARCHIVE_DIR: &str = ".plugsync-archive";
/// Web-server access to the archive must stay denied.
const ACCESS_MARKER: &str = ".htaccess";
const ACCESS_MARKER_BODY: &str = "Order deny,allow\nDeny from all\n";

/// Keeps byte-for-byte copies of zip-sourced plugin packages, keyed by file
/// name, so a later run can notice the upstream artifact changed even though
/// the declared version did not. Every failure in here is logged at debug
/// severity and swallowed; archiving never blocks reconciliation.
pub struct ArchiveManager {
    dir: PathBuf,
    enabled: bool,
}

impl ArchiveManager {
    #[must_use]
    pub fn new(install_root: &Path, enabled: bool) -> Self {
        Self {
            dir: install_root
                .join("wp-content")
                .join("plugins")
                .join(ARCHIVE_DIR),
            enabled,
        }
    }

    /// True when the declared source file's byte size differs from the copy
    /// archived on a previous run. No prior copy, or no readable source,
    /// means no signal.
    #[must_use]
    pub fn size_changed(&self, source: &Path) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(name) = source.file_name() else {
            return false;
        };
        let archived = self.dir.join(name);
        let (Ok(current), Ok(previous)) = (fs::metadata(source), fs::metadata(&archived)) else {
            return false;
        };
        current.len() != previous.len()
    }

    /// Stores the current source file as the comparison baseline for the
    /// next run, overwriting any prior copy.
    pub fn store(&self, source: &Path) {
        if !self.enabled {
            return;
        }
        if let Err(err) = self.try_store(source) {
            debug!(source = %source.display(), error = %err, "plugin archive copy failed");
        }
    }

    fn try_store(&self, source: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating archive directory {}", self.dir.display()))?;
        let marker = self.dir.join(ACCESS_MARKER);
        if !marker.exists() {
            fs::write(&marker, ACCESS_MARKER_BODY)
                .with_context(|| format!("writing access marker {}", marker.display()))?;
        }
        let name = source
            .file_name()
            .ok_or_else(|| anyhow!("archive source {} has no file name", source.display()))?;
        fs::copy(source, self.dir.join(name))
            .with_context(|| format!("copying {} into the archive", source.display()))?;
        Ok(())
    }
}
