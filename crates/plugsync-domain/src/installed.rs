use serde::{Deserialize, Serialize};

/// Activation state wp-cli reports for an installed plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginStatus {
    Active,
    Inactive,
    MustUse,
    Dropin,
}

impl PluginStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(PluginStatus::Active),
            "inactive" => Some(PluginStatus::Inactive),
            "must-use" => Some(PluginStatus::MustUse),
            "dropin" => Some(PluginStatus::Dropin),
            _ => None,
        }
    }

    /// True for rows that are not operator-managed plugins and therefore
    /// never reconciled or swept.
    #[must_use]
    pub fn is_unmanaged_kind(&self) -> bool {
        matches!(self, PluginStatus::MustUse | PluginStatus::Dropin)
    }
}

/// What the live system reports about one installed plugin. Ephemeral:
/// fetched fresh per query, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub name: String,
    pub status: PluginStatus,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub version: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

/// Parses one `plugin list --fields=name,status,version --format=csv` row.
/// Header echoes, rows with the wrong column count, unknown statuses, and
/// names the tool itself would reject all yield `None` and are skipped.
#[must_use]
pub fn parse_list_row(line: &str) -> Option<InstalledPlugin> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() != 3 {
        return None;
    }
    let name = columns[0].trim();
    if name.eq_ignore_ascii_case("name") || !is_plausible_identifier(name) {
        return None;
    }
    let status = PluginStatus::parse(columns[1])?;
    let version = Some(columns[2].trim().to_string()).filter(|v| !v.is_empty());
    Some(InstalledPlugin {
        name: name.to_string(),
        status,
        version,
    })
}

fn is_plausible_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
