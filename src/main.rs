//! reposeed: bootstrap SSH trust with your code hosts and clone every
//! repository you own into one destination directory.

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use std::path::{Path, PathBuf};

use reposeed::catalog::ProviderTag;
use reposeed::commands::{handle_sync_command, handle_trust_command};
use reposeed::core::{get_clone_concurrency, ProviderConfig, RunConfig};

fn provider_args(cmd: ClapCommand) -> ClapCommand {
    cmd.arg(
        Arg::new("github")
            .long("github")
            .help("Bootstrap GitHub using the GITHUB_TOKEN environment variable")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("gitlab")
            .long("gitlab")
            .help("Bootstrap GitLab using the GITLAB_TOKEN environment variable")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("github-token-file")
            .long("github-token-file")
            .value_name("FILE")
            .help("Bootstrap GitHub reading the token from FILE (first line)"),
    )
    .arg(
        Arg::new("gitlab-token-file")
            .long("gitlab-token-file")
            .value_name("FILE")
            .help("Bootstrap GitLab reading the token from FILE (first line)"),
    )
}

fn cli() -> ClapCommand {
    ClapCommand::new("reposeed")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bootstrap passwordless SSH trust with your code hosts and clone everything you own")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Path to the config file (default: ~/.config/reposeed/config.toml)"),
        )
        .subcommand(provider_args(
            ClapCommand::new("sync")
                .about("Establish trust, then clone every repository you own")
                .arg(
                    Arg::new("dest")
                        .long("dest")
                        .value_name("DIR")
                        .help("Destination directory for clones (default: ~/src)"),
                )
                .arg(
                    Arg::new("jobs")
                        .long("jobs")
                        .short('j')
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .help("Maximum concurrent clones"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .help("Clone one repository at a time")
                        .action(ArgAction::SetTrue),
                ),
        ))
        .subcommand(provider_args(
            ClapCommand::new("trust").about("Establish passwordless SSH trust only"),
        ))
}

fn load_config(path: Option<&String>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(Path::new(path)),
        None => RunConfig::load_default(),
    }
}

/// Folds provider CLI flags into the config: a token-file flag overrides the
/// provider's token source, and a bare --github/--gitlab enables the
/// provider with its default token environment variable.
fn apply_provider_flags(config: &mut RunConfig, matches: &ArgMatches) {
    for (flag, tag) in [
        ("github-token-file", ProviderTag::GitHub),
        ("gitlab-token-file", ProviderTag::GitLab),
    ] {
        if let Some(path) = matches.get_one::<String>(flag) {
            let token_file = PathBuf::from(path);
            match config.providers.iter_mut().find(|p| p.provider == tag) {
                Some(existing) => existing.token_file = Some(token_file),
                None => {
                    let mut provider_config = ProviderConfig::for_provider(tag);
                    provider_config.token_file = Some(token_file);
                    config.providers.push(provider_config);
                }
            }
        }
    }

    for (flag, tag) in [("github", ProviderTag::GitHub), ("gitlab", ProviderTag::GitLab)] {
        if matches.get_flag(flag) && !config.providers.iter().any(|p| p.provider == tag) {
            config.providers.push(ProviderConfig::for_provider(tag));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let any_failed = match matches.subcommand() {
        Some(("sync", sub)) => {
            let mut config = load_config(matches.get_one::<String>("config"))?;
            apply_provider_flags(&mut config, sub);
            if let Some(dest) = sub.get_one::<String>("dest") {
                config.dest_dir = Some(PathBuf::from(dest));
            }
            let jobs = sub.get_one::<usize>("jobs").copied().or(config.jobs);
            let concurrency = get_clone_concurrency(jobs, sub.get_flag("sequential"));
            handle_sync_command(config, concurrency).await?
        }
        Some(("trust", sub)) => {
            let mut config = load_config(matches.get_one::<String>("config"))?;
            apply_provider_flags(&mut config, sub);
            handle_trust_command(config).await?
        }
        _ => unreachable!("subcommand is required"),
    };

    // Partial success is a normal terminal state; the exit code is the
    // only signal that something in the batch failed
    if any_failed {
        std::process::exit(1);
    }
    Ok(())
}
