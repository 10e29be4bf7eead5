use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;

use crate::engine::DiffEngine;
use crate::listing::Preset;
use crate::settings::Settings;

mod engine;
mod env;
mod error;
mod listing;
mod networking;
mod settings;
mod storage;
mod util;

#[derive(Parser, Debug)]
#[command(
    name = "ablist-watch",
    author,
    version,
    about = "Reports asset-bundle changes between manifest releases and builds local asset listings"
)]
struct Cli {
    /// Print the tool version and exit.
    #[arg(long)]
    version_only: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diff the remote manifest against the cached copy (default).
    Diff(DiffArgs),
    /// Write category listings for a local asset tree.
    List(ListArgs),
}

#[derive(Args, Debug, Default)]
struct DiffArgs {
    /// Cached manifest from the previous run.
    #[arg(long)]
    cache: Option<PathBuf>,
    /// Directory receiving a copy of the previous cache [default: OS temp dir].
    #[arg(long)]
    backup_dir: Option<PathBuf>,
    #[arg(long)]
    version_url: Option<String>,
    #[arg(long)]
    assets_base: Option<String>,
    #[arg(long)]
    channel: Option<String>,
    #[arg(long)]
    provider: Option<String>,
    /// Report changes without overwriting the cache.
    #[arg(long)]
    dry_run: bool,
    /// Log per-category counts after the report.
    #[arg(long)]
    summary: bool,
}

impl DiffArgs {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(cache) = &self.cache {
            settings.cache_path = cache.clone();
        }
        if let Some(dir) = &self.backup_dir {
            settings.backup_dir = dir.clone();
        }
        if let Some(url) = &self.version_url {
            settings.version_url = url.clone();
        }
        if let Some(base) = &self.assets_base {
            settings.assets_base = base.clone();
        }
        if let Some(channel) = &self.channel {
            settings.channel = channel.clone();
        }
        if let Some(provider) = &self.provider {
            settings.provider = provider.clone();
        }
        settings
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_os_t = env::assets_dir())]
    assets_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = Preset::Bundle)]
    preset: Preset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("ablist-watch {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let outcome = match cli.command {
        Some(Command::List(args)) => listing::generate(&args.assets_dir, args.preset).map(|_| ()),
        Some(Command::Diff(args)) => run_diff(&args).await,
        None => run_diff(&DiffArgs::default()).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

/// The one stderr line printed for a failed run.
fn failure_message(err: &error::AblistError) -> String {
    format!("error: {err}")
}

async fn run_diff(args: &DiffArgs) -> error::Result<()> {
    let differ = DiffEngine::new(args.settings());
    let result = differ.run(args.dry_run).await?;
    print!("{}", engine::report::render(&result));
    if result.is_empty() {
        info!("diff: no asset changes since the cached manifest");
    }
    if args.summary {
        info!(
            "diff: {} new, {} updated, {} removed",
            result.appended.len(),
            result.updated.len(),
            result.removed.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_flags_override_defaults() {
        let cli = Cli::parse_from([
            "ablist-watch",
            "diff",
            "--cache",
            "state/ablist.json",
            "--channel",
            "webgl",
            "--dry-run",
        ]);
        let Some(Command::Diff(args)) = cli.command else {
            panic!("expected diff subcommand");
        };
        let settings = args.settings();
        assert_eq!(settings.cache_path, PathBuf::from("state/ablist.json"));
        assert_eq!(settings.channel, "webgl");
        assert_eq!(settings.provider, env::PROVIDER);
        assert!(args.dry_run);
    }

    #[test]
    fn no_subcommand_means_default_diff() {
        let cli = Cli::parse_from(["ablist-watch"]);
        assert!(cli.command.is_none());
        assert_eq!(DiffArgs::default().settings(), Settings::default());
    }

    #[test]
    fn list_accepts_split_preset() {
        let cli = Cli::parse_from(["ablist-watch", "list", "--preset", "split"]);
        let Some(Command::List(args)) = cli.command else {
            panic!("expected list subcommand");
        };
        assert_eq!(args.preset, Preset::Split);
        assert_eq!(args.assets_dir, env::assets_dir());
    }

    #[test]
    fn failure_is_reported_on_one_line() {
        let err = error::AblistError::NotFound(PathBuf::from("assets/ablist.json"));
        assert_eq!(
            failure_message(&err),
            "error: cached manifest not found at assets/ablist.json"
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
