use indexmap::IndexSet;
use regex::RegexBuilder;
use tracing::warn;

use crate::manifest::{DesiredStatus, ManifestItem, PluginSource, RawManifestItem, Scalar};
use crate::slug::slugify;

/// Resolves a manifest-supplied source reference (path or URL) into a usable
/// install source, or `None` when it cannot be found or reached.
pub trait LocationResolver {
    fn resolve(&self, reference: &str) -> Option<PluginSource>;
}

/// Validates and normalizes raw manifest records into [`ManifestItem`]s.
///
/// Operates as a filter: entries failing validation are dropped with a
/// warning naming their 0-based index, never aborting the run. Surviving
/// items have their `force` flag derived from the force patterns against
/// `target_url`.
pub fn normalize_items(
    raw: &[RawManifestItem],
    target_url: &str,
    resolver: &dyn LocationResolver,
) -> Vec<ManifestItem> {
    let mut items = Vec::with_capacity(raw.len());
    'records: for (index, record) in raw.iter().enumerate() {
        let Some(name) = record.declared_name() else {
            warn!(index, "manifest item has no name or slug and will be skipped");
            continue;
        };
        let location = record
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let source = match location {
            Some(reference) => match resolver.resolve(reference) {
                Some(source) => Some(source),
                None => {
                    warn!(
                        index,
                        plugin = name,
                        location = reference,
                        "manifest item has an invalid (not found) location and will be skipped"
                    );
                    continue;
                }
            },
            None => None,
        };
        let version = record
            .version
            .as_ref()
            .map(Scalar::as_text)
            .filter(|v| !v.is_empty());
        let Some(version) = version else {
            warn!(index, plugin = name, "manifest item has no version defined and will be skipped");
            continue;
        };
        let status = record.status.as_ref().and_then(Scalar::as_int);
        let Some(status) = status.and_then(DesiredStatus::from_raw) else {
            warn!(index, plugin = name, "manifest item has no usable status defined and will be skipped");
            continue;
        };
        if let Some(skip) = &record.skip {
            for pattern in skip.entries(',') {
                if pattern_matches(&pattern, target_url) {
                    warn!(
                        index,
                        plugin = name,
                        pattern = pattern.as_str(),
                        "manifest item satisfies url skip rule and will be skipped"
                    );
                    continue 'records;
                }
            }
        }
        let force = record
            .force
            .as_ref()
            .map(|rules| {
                rules
                    .entries(',')
                    .iter()
                    .any(|pattern| pattern_matches(pattern, target_url))
            })
            .unwrap_or(false);
        items.push(ManifestItem {
            slug: slugify(name),
            name: name.to_string(),
            source,
            version,
            status,
            force,
            init: record
                .init
                .as_ref()
                .map(|commands| commands.entries('|'))
                .unwrap_or_default(),
        });
    }
    items
}

/// Case-insensitive, unanchored substring search: the pattern matches if it
/// is found anywhere in the target URL. Invalid patterns match nothing.
fn pattern_matches(pattern: &str, url: &str) -> bool {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(url),
        Err(err) => {
            warn!(pattern, error = %err, "ignoring unparseable url pattern");
            false
        }
    }
}

/// Identifier sets the uninstall sweep consults, built only from items that
/// survived normalization. Both the raw declared spelling and the slug are
/// kept deliberately: an installed row is protected when either matches.
#[derive(Debug, Default)]
pub struct KnownPlugins {
    names: IndexSet<String>,
    slugs: IndexSet<String>,
}

impl KnownPlugins {
    #[must_use]
    pub fn from_items(items: &[ManifestItem]) -> Self {
        let mut known = Self::default();
        for item in items {
            known.names.insert(item.name.clone());
            known.slugs.insert(item.slug.clone());
        }
        known
    }

    /// Exact match on the raw identifier, or slug membership; either keeps
    /// the plugin.
    #[must_use]
    pub fn contains(&self, raw_name: &str, slug: &str) -> bool {
        self.names.contains(raw_name) || self.slugs.contains(slug)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
