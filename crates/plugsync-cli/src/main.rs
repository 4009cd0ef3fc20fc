use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::Result;
use plugsync_core::{sync_site, RunConfig, RunReport, SetupError};
use plugsync_domain::ManifestError;
use serde_json::json;

const EXIT_USER_ERROR: i32 = 1;
const EXIT_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reconcile a WordPress site's plugins against a declarative manifest",
    propagate_version = false,
    disable_help_subcommand = true
)]
struct PlugsyncCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    trace: bool,
    #[arg(long, help = "Emit a {status,message,report} JSON envelope", global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Reconcile the site against the manifest, then sweep unmanaged plugins")]
    Sync(SiteArgs),
    #[command(about = "Report what a sync would do without mutating the site")]
    Status(SiteArgs),
}

#[derive(Args, Debug)]
struct SiteArgs {
    #[arg(long, value_name = "FILE", help = "YAML plugin manifest")]
    manifest: PathBuf,
    #[arg(
        long,
        value_name = "URL",
        help = "Target site URL (also the haystack for skip/force rules)"
    )]
    url: String,
    #[arg(long, value_name = "DIR", help = "WordPress install root")]
    path: PathBuf,
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "NAME[,NAME...]",
        help = "Plugins the uninstall sweep must never touch"
    )]
    ignore: Vec<String>,
    #[arg(long, help = "Skip the end-of-run uninstall sweep")]
    skip_sweep: bool,
    #[arg(long, help = "Skip zip archiving and its change detection")]
    skip_archive: bool,
    #[arg(long, help = "Plan only; issue no mutating wp-cli commands")]
    dry_run: bool,
    #[arg(
        long,
        env = "PLUGSYNC_WP_BIN",
        default_value = "wp",
        value_name = "PATH",
        help = "wp-cli executable to drive"
    )]
    wp_bin: String,
    #[arg(long, help = "Forward --allow-root to wp-cli")]
    allow_root: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = PlugsyncCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let (args, dry_run) = match &cli.command {
        Command::Sync(args) => (args, args.dry_run),
        Command::Status(args) => (args, true),
    };
    let config = match build_config(args, dry_run) {
        Ok(config) => config,
        Err(err) => return fail(&cli, EXIT_USER_ERROR, &err.to_string()),
    };
    match sync_site(&config) {
        Ok(report) => {
            emit_report(&cli, &report);
            Ok(())
        }
        Err(err) => {
            let code = if err.is::<ManifestError>() {
                EXIT_USER_ERROR
            } else {
                EXIT_FAILURE
            };
            fail(&cli, code, &format!("{err:#}"))
        }
    }
}

fn build_config(args: &SiteArgs, dry_run: bool) -> Result<RunConfig, SetupError> {
    RunConfig {
        manifest: args.manifest.clone(),
        url: args.url.clone(),
        install_root: args.path.clone(),
        ignore: args.ignore.clone(),
        skip_sweep: args.skip_sweep,
        skip_archive: args.skip_archive,
        dry_run,
        wp_bin: args.wp_bin.clone(),
        allow_root: args.allow_root,
    }
    .resolve()
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("plugsync={level},plugsync_core={level},plugsync_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_report(cli: &PlugsyncCli, report: &RunReport) {
    if cli.json {
        let payload = json!({
            "status": "ok",
            "message": report.summary(),
            "report": report,
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("error: could not render report: {err}"),
        }
        return;
    }
    if cli.quiet {
        return;
    }
    for action in &report.actions {
        println!("{:>13}  {:<24}  {}", action.kind, action.plugin, action.detail);
    }
    println!("{}", report.summary());
}

fn fail(cli: &PlugsyncCli, code: i32, message: &str) -> Result<()> {
    if cli.json {
        let payload = json!({ "status": "error", "message": message });
        match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("error: {err}"),
        }
    }
    eprintln!("error: {message}");
    std::process::exit(code)
}
