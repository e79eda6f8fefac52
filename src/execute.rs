use std::path::PathBuf;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use setup_steamcmd::{
    current_phase, default_temp_dir, default_tool_cache_dir, print_logs, run_main, run_post,
    setup, ArchiveUnpacker, CommandRunner, DirToolCache, ExportedLocations, GithubActions,
    HttpDownloader, Phase, Platform, ProvisionConfig, Provisioner, ToolVersion, STEAMCMD,
};
use crate::cli::{SetupCommand, CLI};

/// Concrete collaborators used by every command.
struct Runtime {
    cache: DirToolCache,
    downloader: HttpDownloader,
    extractor: ArchiveUnpacker,
    runner: CommandRunner,
    sink: GithubActions,
    config: ProvisionConfig,
}

impl Runtime {
    fn from_cli(cli: &CLI, debug: bool) -> Result<Self> {
        let tool_cache = match &cli.tool_cache {
            Some(dir) => dir.clone(),
            None => default_tool_cache_dir().context("Could not determine the tool cache directory")?,
        };
        let temp_dir = cli.temp_dir.clone().unwrap_or_else(default_temp_dir);
        let mut config = ProvisionConfig::new(Platform::current(), temp_dir);
        config.data_home = cli.steam_dir.clone();
        config.silent_probe = !(cli.verbose || debug);
        Ok(Runtime {
            cache: DirToolCache::new(tool_cache),
            downloader: HttpDownloader::new(),
            extractor: ArchiveUnpacker,
            runner: CommandRunner,
            sink: GithubActions::from_env(),
            config,
        })
    }

    fn provisioner(&self) -> Provisioner<'_> {
        Provisioner::new(&self.cache, &self.downloader, &self.extractor, &self.runner)
    }
}

pub fn execute(cli: CLI, debug: bool) -> Result<()> {
    let ctx = Runtime::from_cli(&cli, debug)?;
    match cli.command {
        None => execute_lifecycle(&ctx),
        Some(SetupCommand::Setup) => {
            setup(&ctx.sink, &ctx.provisioner(), &ctx.runner, &ctx.config)?;
            Ok(())
        }
        Some(SetupCommand::Post) => {
            run_post(&ctx.sink, ctx.config.platform, &ExportedLocations::from_env());
            Ok(())
        }
        Some(SetupCommand::Logs { directory, clear }) => {
            print_logs(&ctx.sink, &directory, clear);
            Ok(())
        }
        Some(SetupCommand::Which { json }) => execute_which(&ctx, json),
    }
}

fn execute_lifecycle(ctx: &Runtime) -> Result<()> {
    match current_phase(&ctx.sink) {
        Phase::Main => {
            run_main(&ctx.sink, &ctx.provisioner(), &ctx.runner, &ctx.config)?;
        }
        Phase::Post => run_post(&ctx.sink, ctx.config.platform, &ExportedLocations::from_env()),
    }
    Ok(())
}

#[derive(Serialize)]
struct CachedTool {
    name: &'static str,
    version: ToolVersion,
    tool_directory: PathBuf,
}

fn execute_which(ctx: &Runtime, json: bool) -> Result<()> {
    let found = ctx.provisioner().find_latest(STEAMCMD)?;
    let Some((version, tool_directory)) = found else {
        if json {
            println!("null");
        } else {
            println!("{}", format!("{STEAMCMD} is not cached in {}", ctx.cache.root().display()).yellow());
        }
        return Ok(());
    };
    if json {
        let cached = CachedTool {
            name: STEAMCMD,
            version,
            tool_directory,
        };
        println!("{}", serde_json::to_string_pretty(&cached)?);
    } else {
        println!("{} {}", STEAMCMD, version.to_string().green());
        println!("  {}", tool_directory.display());
    }
    Ok(())
}
