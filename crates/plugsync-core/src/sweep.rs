use anyhow::Result;
use tracing::{debug, info, warn};

use plugsync_domain::{slugify, KnownPlugins, PluginStatus};

use crate::config::RunConfig;
use crate::effects::{CliOptions, PluginCli};
use crate::query::StateQuery;
use crate::report::{ActionKind, RunReport};

/// End-of-run pass that removes installed plugins not declared in the
/// manifest and not explicitly ignored. Fetches the full table once and
/// walks it in listing order; active plugins are deactivated and
/// uninstalled in one call.
///
/// # Errors
///
/// Returns an error only when the table listing itself cannot be obtained;
/// individual removal failures are logged and skipped.
pub fn sweep_unmanaged(
    config: &RunConfig,
    cli: &dyn PluginCli,
    known: &KnownPlugins,
    report: &mut RunReport,
) -> Result<()> {
    info!("> sync installed plugins against config");
    let table = StateQuery::new(cli).get_all()?;
    for installed in table {
        if installed.status.is_unmanaged_kind() {
            continue;
        }
        let slug = slugify(&installed.name);
        if is_ignored(&config.ignore, &installed.name, &slug) {
            debug!(plugin = %installed.name, "kept by operator ignore list");
            continue;
        }
        if known.contains(&installed.name, &slug) {
            continue;
        }
        info!(plugin = %installed.name, "uninstall plugin");
        let args: Vec<String> = if installed.status == PluginStatus::Active {
            vec![
                "plugin".to_string(),
                "deactivate".to_string(),
                installed.name.clone(),
                "--uninstall".to_string(),
            ]
        } else {
            vec![
                "plugin".to_string(),
                "uninstall".to_string(),
                installed.name.clone(),
            ]
        };
        report.record(&installed.name, ActionKind::Uninstall, args.join(" "));
        if config.dry_run {
            continue;
        }
        match cli.run(&args, CliOptions::default()) {
            Ok(output) if !output.success() => {
                warn!(
                    plugin = %installed.name,
                    code = output.code,
                    stderr = %output.stderr.trim(),
                    "uninstall failed"
                );
            }
            Ok(_) => {}
            Err(err) => {
                warn!(plugin = %installed.name, error = %err, "uninstall failed");
            }
        }
    }
    Ok(())
}

/// Operator ignore entries match the raw listed name or its slug, exactly
/// and case-insensitively.
fn is_ignored(ignore: &[String], name: &str, slug: &str) -> bool {
    ignore
        .iter()
        .any(|entry| entry.eq_ignore_ascii_case(name) || entry.eq_ignore_ascii_case(slug))
}
