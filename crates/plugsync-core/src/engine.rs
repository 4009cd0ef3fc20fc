use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use plugsync_domain::{DesiredStatus, InstalledPlugin, ManifestItem, PluginSource, PluginStatus};

use crate::archive::ArchiveManager;
use crate::config::RunConfig;
use crate::effects::{CliOptions, PluginCli};
use crate::query::StateQuery;
use crate::report::{ActionKind, RunReport};

/// What the engine decided for one manifest item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Not installed: install at the declared version, activating in the
    /// same call when the item wants to end up active. New installs default
    /// to inactive, so no extra deactivate is needed for the inactive case.
    Install { activate: bool },
    /// Reinstall from the declared source at the declared version with
    /// activation requested unconditionally. Forced paths are assumed
    /// urgent.
    ForceInstall,
    /// Plain version-targeted registry update.
    Update,
    Activate,
    Deactivate,
    /// Installed and already matching the declaration.
    Converged,
    /// Not installed, and the manifest holds no activation opinion either.
    Ignore,
}

/// Per-item decision logic, kept pure so every scenario is table-testable.
///
/// `archive_mismatch` is the independent signal from [`ArchiveManager`] that
/// a zip-sourced package changed size since the last run; it bypasses the
/// version-equality short-circuit, which is what lets an explicit source
/// stay authoritative even when the reported version string already matches.
#[must_use]
pub fn plan(
    item: &ManifestItem,
    installed: Option<&InstalledPlugin>,
    archive_mismatch: bool,
) -> Decision {
    let Some(fact) = installed else {
        return match item.status {
            DesiredStatus::Active => Decision::Install { activate: true },
            DesiredStatus::Inactive => Decision::Install { activate: false },
            DesiredStatus::Neutral => Decision::Ignore,
        };
    };
    let Some(installed_version) = fact.version.as_deref() else {
        // A record the tool cannot attach a version to is not trustworthy;
        // reinstall from the declared source.
        return Decision::ForceInstall;
    };
    if installed_version != item.version {
        if item.source.is_some() || item.force {
            return Decision::ForceInstall;
        }
        return Decision::Update;
    }
    if archive_mismatch {
        return Decision::ForceInstall;
    }
    match (item.status, fact.status) {
        (DesiredStatus::Inactive, PluginStatus::Active) => Decision::Deactivate,
        (DesiredStatus::Active, PluginStatus::Inactive) => Decision::Activate,
        _ => Decision::Converged,
    }
}

/// Drives the minimal set of wp-cli commands that converge one site onto its
/// manifest. Items are reconciled strictly in manifest order; a failing item
/// is logged and never blocks the rest.
pub struct Engine<'a> {
    config: &'a RunConfig,
    cli: &'a dyn PluginCli,
    archive: &'a ArchiveManager,
}

impl<'a> Engine<'a> {
    #[must_use]
    pub fn new(config: &'a RunConfig, cli: &'a dyn PluginCli, archive: &'a ArchiveManager) -> Self {
        Self {
            config,
            cli,
            archive,
        }
    }

    pub fn reconcile_all(&self, items: &[ManifestItem], report: &mut RunReport) {
        info!("< sync config against installed plugins");
        for item in items {
            if let Err(err) = self.reconcile(item, report) {
                warn!(plugin = %item.name, error = %err, "reconciliation failed, continuing");
            }
        }
    }

    fn reconcile(&self, item: &ManifestItem, report: &mut RunReport) -> Result<()> {
        info!(plugin = %item.name, version = %item.version, "processing plugin");
        let installed = StateQuery::new(self.cli).get_one(&item.name)?;
        let decision = plan(item, installed.as_ref(), self.archive_mismatch(item));
        self.apply(item, decision, report)?;
        if !self.config.dry_run {
            if let Some(path) = zip_source(item) {
                self.archive.store(path);
            }
        }
        self.run_init_commands(item, report);
        Ok(())
    }

    fn archive_mismatch(&self, item: &ManifestItem) -> bool {
        zip_source(item).is_some_and(|path| self.archive.size_changed(path))
    }

    fn apply(&self, item: &ManifestItem, decision: Decision, report: &mut RunReport) -> Result<()> {
        match decision {
            Decision::Ignore => {
                debug!(plugin = %item.name, "not installed and not wanted, nothing to do");
                Ok(())
            }
            Decision::Converged => {
                debug!(plugin = %item.name, "already converged");
                report.converged += 1;
                Ok(())
            }
            Decision::Install { activate } => {
                info!(plugin = %item.name, version = %item.version, "install plugin");
                let mut args = vec![
                    "plugin".to_string(),
                    "install".to_string(),
                    install_source(item),
                    format!("--version={}", item.version),
                ];
                if activate {
                    args.push("--activate".to_string());
                }
                self.execute(&item.name, ActionKind::Install, args, report)
            }
            Decision::ForceInstall => {
                info!(plugin = %item.name, version = %item.version, "force-install plugin");
                let args = vec![
                    "plugin".to_string(),
                    "install".to_string(),
                    install_source(item),
                    format!("--version={}", item.version),
                    "--force".to_string(),
                    "--activate".to_string(),
                ];
                self.execute(&item.name, ActionKind::ForceInstall, args, report)
            }
            Decision::Update => {
                info!(plugin = %item.name, version = %item.version, "update plugin");
                let args = vec![
                    "plugin".to_string(),
                    "update".to_string(),
                    item.name.clone(),
                    format!("--version={}", item.version),
                ];
                self.execute(&item.name, ActionKind::Update, args, report)
            }
            Decision::Activate => {
                info!(plugin = %item.name, "activate plugin");
                let args = vec![
                    "plugin".to_string(),
                    "activate".to_string(),
                    item.name.clone(),
                ];
                self.execute(&item.name, ActionKind::Activate, args, report)
            }
            Decision::Deactivate => {
                info!(plugin = %item.name, "deactivate plugin");
                let args = vec![
                    "plugin".to_string(),
                    "deactivate".to_string(),
                    item.name.clone(),
                ];
                self.execute(&item.name, ActionKind::Deactivate, args, report)
            }
        }
    }

    /// Records the action, then issues it unless this is a dry run. Exit
    /// codes are logged, never branched on: the next run's queries are what
    /// verify convergence.
    fn execute(
        &self,
        plugin: &str,
        kind: ActionKind,
        args: Vec<String>,
        report: &mut RunReport,
    ) -> Result<()> {
        report.record(plugin, kind, args.join(" "));
        if self.config.dry_run {
            info!(plugin, command = %args.join(" "), "dry-run, command not issued");
            return Ok(());
        }
        let output = self.cli.run(&args, CliOptions::default())?;
        if output.success() {
            debug!(plugin, output = %output.stdout.trim(), "wp-cli command finished");
        } else {
            warn!(
                plugin,
                code = output.code,
                stderr = %output.stderr.trim(),
                "wp-cli command failed"
            );
        }
        Ok(())
    }

    /// Best-effort post-install hooks: each declared init command runs in
    /// order, failures are logged and never stop later commands.
    fn run_init_commands(&self, item: &ManifestItem, report: &mut RunReport) {
        for raw in &item.init {
            let Some(tokens) = init_tokens(raw) else {
                warn!(plugin = %item.name, command = %raw, "unparseable init command skipped");
                continue;
            };
            if tokens.is_empty() {
                continue;
            }
            let command = tokens.join(" ");
            info!(plugin = %item.name, command = %command, "running init command");
            report.record(&item.name, ActionKind::Init, command.clone());
            if self.config.dry_run {
                continue;
            }
            match self.cli.run(&tokens, CliOptions::default()) {
                Ok(output) if !output.success() => {
                    warn!(
                        plugin = %item.name,
                        command = %command,
                        code = output.code,
                        "init command failed"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(plugin = %item.name, command = %command, error = %err, "init command failed");
                }
            }
        }
    }
}

fn install_source(item: &ManifestItem) -> String {
    item.source
        .as_ref()
        .map_or_else(|| item.name.clone(), PluginSource::as_install_arg)
}

fn zip_source(item: &ManifestItem) -> Option<&Path> {
    item.source
        .as_ref()
        .filter(|source| source.is_zip())
        .and_then(PluginSource::local_path)
}

/// Tokenizes an init command and drops any leading interpreter/tool
/// invocation (`wp`, `wp-cli.phar`, `php wp-cli.phar`, absolute variants) so
/// commands can be declared the way operators type them.
fn init_tokens(raw: &str) -> Option<Vec<String>> {
    let mut tokens = shlex::split(raw.trim())?;
    let prefix = tokens.iter().take_while(|t| is_tool_token(t)).count();
    tokens.drain(..prefix);
    Some(tokens)
}

fn is_tool_token(token: &str) -> bool {
    let base = Path::new(token)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(token)
        .to_ascii_lowercase();
    matches!(base.as_str(), "php" | "wp" | "wp-cli.phar")
}
