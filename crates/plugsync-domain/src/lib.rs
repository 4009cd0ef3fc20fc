mod installed;
mod manifest;
mod normalize;
mod slug;

pub use installed::{parse_list_row, InstalledPlugin, PluginStatus};
pub use manifest::{
    load_manifest, DesiredStatus, ListField, ManifestError, ManifestItem, PluginSource,
    RawManifestItem, Scalar,
};
pub use normalize::{normalize_items, KnownPlugins, LocationResolver};
pub use slug::slugify;
