use anyhow::Result;
use tracing::warn;

use plugsync_domain::{load_manifest, normalize_items, KnownPlugins};

use crate::archive::ArchiveManager;
use crate::config::RunConfig;
use crate::effects::{HttpProbe, PluginCli, UrlProbe, WpCli};
use crate::engine::Engine;
use crate::report::RunReport;
use crate::resolve::FsLocationResolver;
use crate::sweep::sweep_unmanaged;

/// Reconciles the site against its manifest with the real wp-cli and a real
/// network probe, then sweeps unmanaged plugins.
///
/// # Errors
///
/// Returns an error for the fatal cases only: an unreadable or malformed
/// manifest. Everything else is recovered per item and reflected in the
/// report.
pub fn sync_site(config: &RunConfig) -> Result<RunReport> {
    let cli = WpCli::new(config);
    let probe = HttpProbe::new();
    run_with(config, &cli, &probe)
}

/// [`sync_site`] with the effect seams exposed; tests pass fakes here.
///
/// # Errors
///
/// Returns an error when the manifest cannot be loaded.
pub fn run_with(
    config: &RunConfig,
    cli: &dyn PluginCli,
    probe: &dyn UrlProbe,
) -> Result<RunReport> {
    let raw = load_manifest(&config.manifest)?;
    let resolver = FsLocationResolver::new(&config.manifest, probe);
    let items = normalize_items(&raw, &config.url, &resolver);

    let mut report = RunReport::new(config.dry_run);
    report.declared = items.len();
    report.dropped = raw.len() - items.len();

    // An empty (or fully invalid) manifest reconciles nothing and must not
    // reach the sweep: it would uninstall the entire site.
    if items.is_empty() {
        warn!("no manifest items survived validation, nothing to reconcile");
        return Ok(report);
    }

    let archive = ArchiveManager::new(&config.install_root, !config.skip_archive);
    Engine::new(config, cli, &archive).reconcile_all(&items, &mut report);

    if !config.skip_sweep {
        let known = KnownPlugins::from_items(&items);
        if let Err(err) = sweep_unmanaged(config, cli, &known, &mut report) {
            warn!(error = %err, "uninstall sweep failed");
        }
    }
    Ok(report)
}
