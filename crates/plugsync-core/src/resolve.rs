use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use plugsync_domain::{LocationResolver, PluginSource};

use crate::effects::UrlProbe;

/// Turns manifest-supplied source references into usable install sources,
/// repairing relative paths distorted by a symlinked invocation and
/// anchoring them to the manifest's own directory. Side-effect-free except
/// for the network probe on remote references.
pub struct FsLocationResolver<'a> {
    manifest_path: &'a Path,
    probe: &'a dyn UrlProbe,
    /// Leading `../` segments to strip, derived from the executable's
    /// symlink target nesting.
    link_depth: usize,
}

impl<'a> FsLocationResolver<'a> {
    #[must_use]
    pub fn new(manifest_path: &'a Path, probe: &'a dyn UrlProbe) -> Self {
        Self {
            manifest_path,
            probe,
            link_depth: invocation_link_depth(),
        }
    }

    #[cfg(test)]
    fn with_link_depth(manifest_path: &'a Path, probe: &'a dyn UrlProbe, depth: usize) -> Self {
        Self {
            manifest_path,
            probe,
            link_depth: depth,
        }
    }

    fn resolve_remote(&self, reference: &str) -> Option<PluginSource> {
        let parsed = Url::parse(reference).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            debug!(
                location = reference,
                scheme = parsed.scheme(),
                "unsupported remote location scheme"
            );
            return None;
        }
        self.probe
            .is_reachable(reference)
            .then(|| PluginSource::Remote(reference.to_string()))
    }

    fn resolve_local(&self, reference: &str) -> Option<PluginSource> {
        let repaired = self.strip_link_segments(reference);
        let candidate = self.anchor_to_manifest(&repaired);
        candidate.is_file().then_some(PluginSource::Local(candidate))
    }

    /// Compensates for the extra directory nesting a symlinked executable
    /// introduces: one leading `../` is stripped per nesting level of the
    /// link target.
    fn strip_link_segments(&self, reference: &str) -> String {
        let mut rest = reference;
        let starts_relative_up = rest.starts_with("../") || rest.starts_with("/../");
        if self.link_depth == 0 || !starts_relative_up {
            return reference.to_string();
        }
        for _ in 0..self.link_depth {
            rest = rest.strip_prefix('/').unwrap_or(rest);
            match rest.strip_prefix("../") {
                Some(tail) => rest = tail,
                None => break,
            }
        }
        if rest.starts_with('.') || rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("./{rest}")
        }
    }

    /// A canonical (absolute) manifest path means relative locations are
    /// relative to the manifest's directory, not the process working
    /// directory. Absolute references are taken as-is.
    fn anchor_to_manifest(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.manifest_path.parent() {
            Some(dir) if self.manifest_path.is_absolute() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl LocationResolver for FsLocationResolver<'_> {
    fn resolve(&self, reference: &str) -> Option<PluginSource> {
        if is_remote(reference) {
            self.resolve_remote(reference)
        } else {
            self.resolve_local(reference)
        }
    }
}

fn is_remote(reference: &str) -> bool {
    let lowered = reference.to_ascii_lowercase();
    ["http://", "https://", "ftp://"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

fn invocation_link_depth() -> usize {
    let Some(argv0) = env::args_os().next() else {
        return 0;
    };
    match fs::read_link(PathBuf::from(argv0)) {
        Ok(target) => {
            let target = target.to_string_lossy();
            target.trim_start_matches('/').matches('/').count()
        }
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::request, responders::status_code, Expectation, Server};

    struct NeverReachable;

    impl UrlProbe for NeverReachable {
        fn is_reachable(&self, _url: &str) -> bool {
            false
        }
    }

    struct AlwaysReachable;

    impl UrlProbe for AlwaysReachable {
        fn is_reachable(&self, _url: &str) -> bool {
            true
        }
    }

    #[test]
    fn relative_references_anchor_to_the_manifest_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("plugins.yml");
        std::fs::write(&manifest, "[]").expect("write");
        std::fs::create_dir_all(dir.path().join("packages")).expect("mkdir");
        std::fs::write(dir.path().join("packages/acme.zip"), b"zip").expect("write");

        let probe = NeverReachable;
        let resolver = FsLocationResolver::new(&manifest, &probe);
        let resolved = resolver.resolve("packages/acme.zip").expect("resolved");
        assert_eq!(
            resolved,
            PluginSource::Local(dir.path().join("packages/acme.zip"))
        );
        assert_eq!(resolver.resolve("packages/missing.zip"), None);
    }

    #[test]
    fn absolute_references_are_used_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("plugins.yml");
        std::fs::write(&manifest, "[]").expect("write");
        let package = dir.path().join("acme.zip");
        std::fs::write(&package, b"zip").expect("write");

        let probe = NeverReachable;
        let resolver = FsLocationResolver::new(&manifest, &probe);
        let reference = package.display().to_string();
        assert_eq!(
            resolver.resolve(&reference),
            Some(PluginSource::Local(package))
        );
    }

    #[test]
    fn symlink_depth_strips_leading_parent_segments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("plugins.yml");
        std::fs::write(&manifest, "[]").expect("write");
        std::fs::write(dir.path().join("acme.zip"), b"zip").expect("write");

        let probe = NeverReachable;
        let resolver = FsLocationResolver::with_link_depth(&manifest, &probe, 2);
        // Two ../ segments compensate for two levels of link-target nesting.
        let resolved = resolver.resolve("../../acme.zip").expect("resolved");
        assert_eq!(resolved, PluginSource::Local(dir.path().join("acme.zip")));
    }

    #[test]
    fn symlink_depth_leaves_plain_relative_paths_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("plugins.yml");
        std::fs::write(&manifest, "[]").expect("write");
        std::fs::write(dir.path().join("acme.zip"), b"zip").expect("write");

        let probe = NeverReachable;
        let resolver = FsLocationResolver::with_link_depth(&manifest, &probe, 3);
        assert!(resolver.resolve("acme.zip").is_some());
    }

    #[test]
    fn remote_references_require_a_200_probe() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/plugin.zip"))
                .respond_with(status_code(200)),
        );
        let manifest = PathBuf::from("/etc/plugsync/plugins.yml");
        let probe = crate::effects::HttpProbe::new();
        let resolver = FsLocationResolver::with_link_depth(&manifest, &probe, 0);
        let url = server.url("/plugin.zip").to_string();
        assert_eq!(resolver.resolve(&url), Some(PluginSource::Remote(url)));
    }

    #[test]
    fn unreachable_remote_references_resolve_to_none() {
        let manifest = PathBuf::from("/etc/plugsync/plugins.yml");
        let probe = NeverReachable;
        let resolver = FsLocationResolver::with_link_depth(&manifest, &probe, 0);
        assert_eq!(resolver.resolve("https://example.com/p.zip"), None);
    }

    #[test]
    fn ftp_references_are_recognized_but_unsupported() {
        let manifest = PathBuf::from("/etc/plugsync/plugins.yml");
        let probe = AlwaysReachable;
        let resolver = FsLocationResolver::with_link_depth(&manifest, &probe, 0);
        // Recognized as remote, so never probed as a file; the probe only
        // speaks http(s).
        assert_eq!(resolver.resolve("ftp://example.com/p.zip"), None);
    }
}
