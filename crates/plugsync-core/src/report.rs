use std::fmt;

use serde::Serialize;

/// What one reconciliation decision did, or would do in dry-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Install,
    ForceInstall,
    Update,
    Activate,
    Deactivate,
    Uninstall,
    Init,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Install => "install",
            ActionKind::ForceInstall => "force-install",
            ActionKind::Update => "update",
            ActionKind::Activate => "activate",
            ActionKind::Deactivate => "deactivate",
            ActionKind::Uninstall => "uninstall",
            ActionKind::Init => "init",
        };
        f.write_str(label)
    }
}

/// One external mutation issued (or planned) for a plugin.
#[derive(Clone, Debug, Serialize)]
pub struct PluginAction {
    pub plugin: String,
    pub kind: ActionKind,
    /// The wp-cli command line, minus the site-scoped globals.
    pub detail: String,
}

/// Summary of one full reconciliation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    /// Items that survived normalization.
    pub declared: usize,
    /// Raw manifest records dropped by validation.
    pub dropped: usize,
    /// Items that needed no action at all.
    pub converged: usize,
    pub actions: Vec<PluginAction>,
}

impl RunReport {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn record(&mut self, plugin: &str, kind: ActionKind, detail: impl Into<String>) {
        self.actions.push(PluginAction {
            plugin: plugin.to_string(),
            kind,
            detail: detail.into(),
        });
    }

    #[must_use]
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    /// One human line summarizing the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "planned" } else { "applied" };
        if self.actions.is_empty() {
            return format!(
                "site converged: {} plugin(s) checked, nothing to do",
                self.declared
            );
        }
        let mut parts = Vec::new();
        for kind in [
            ActionKind::Install,
            ActionKind::ForceInstall,
            ActionKind::Update,
            ActionKind::Activate,
            ActionKind::Deactivate,
            ActionKind::Uninstall,
            ActionKind::Init,
        ] {
            let count = self.count(kind);
            if count > 0 {
                parts.push(format!("{count} {kind}"));
            }
        }
        format!("{verb}: {}", parts.join(", "))
    }
}
