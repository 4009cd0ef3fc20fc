use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::config::RunConfig;
use crate::process::{run_command, RunOutput};

/// Options for one wp-cli invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CliOptions {
    /// Append `--quiet` so wp-cli mutes its own progress chatter.
    pub quiet: bool,
    /// Discard the child's stderr stream entirely.
    pub suppress_stderr: bool,
}

impl CliOptions {
    /// The combination every read-only query uses.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            quiet: true,
            suppress_stderr: true,
        }
    }
}

/// The seam between the reconciliation logic and the external plugin tool.
/// Engine, query, and sweep only ever see this trait, so tests substitute a
/// recording fake.
pub trait PluginCli {
    /// Runs one wp-cli command given its plugin-level arguments; the
    /// implementation appends the site-scoped globals.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool cannot be spawned at all. Tool-level
    /// failures are reported through the captured exit code instead.
    fn run(&self, args: &[String], options: CliOptions) -> Result<RunOutput>;
}

/// Probes remote plugin locations. Success means exactly HTTP 200 on a
/// single HEAD request; anything else permanently excludes the location for
/// this run.
pub trait UrlProbe {
    fn is_reachable(&self, url: &str) -> bool;
}

/// Real wp-cli invoker. Owns the executable path and the site-scoped global
/// arguments appended to every command.
pub struct WpCli {
    bin: String,
    globals: Vec<String>,
    cwd: PathBuf,
}

impl WpCli {
    #[must_use]
    pub fn new(config: &RunConfig) -> Self {
        let mut globals = vec![
            format!("--url={}", config.url),
            format!("--path={}", config.install_root.display()),
        ];
        if config.allow_root {
            globals.push("--allow-root".to_string());
        }
        Self {
            bin: config.wp_bin.clone(),
            globals,
            cwd: config.install_root.clone(),
        }
    }
}

impl PluginCli for WpCli {
    fn run(&self, args: &[String], options: CliOptions) -> Result<RunOutput> {
        let mut full = args.to_vec();
        full.extend(self.globals.iter().cloned());
        if options.quiet {
            full.push("--quiet".to_string());
        }
        debug!(command = %format!("{} {}", self.bin, full.join(" ")), "exec wp-cli");
        run_command(&self.bin, &full, &self.cwd, options.suppress_stderr)
    }
}

/// Blocking HEAD probe used by the location resolver. One attempt, no retry,
/// the client's default timeout.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlProbe for HttpProbe {
    fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(err) => {
                debug!(url, error = %err, "location probe failed");
                false
            }
        }
    }
}
