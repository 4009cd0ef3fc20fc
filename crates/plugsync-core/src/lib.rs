mod archive;
mod config;
mod effects;
mod engine;
mod process;
mod query;
mod report;
mod resolve;
mod run;
mod sweep;

pub use archive::ArchiveManager;
pub use config::{RunConfig, SetupError};
pub use effects::{CliOptions, HttpProbe, PluginCli, UrlProbe, WpCli};
pub use engine::{plan, Decision, Engine};
pub use process::{run_command, RunOutput};
pub use query::StateQuery;
pub use report::{ActionKind, PluginAction, RunReport};
pub use resolve::FsLocationResolver;
pub use run::{run_with, sync_site};
pub use sweep::sweep_unmanaged;
