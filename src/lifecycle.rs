//! Main and post phases of the setup step.
//!
//! The runner invokes the same binary twice: once when the step runs and once
//! when the job cleans up. The first invocation saves the `isPost` state so the
//! second one knows to print logs instead of provisioning again.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::debug;
use crate::logs::print_logs;
use crate::platform::Platform;
use crate::process::{ExecOptions, ProcessRunner};
use crate::provision::{ProvisionConfig, Provisioner, ResolvedLocations};
use crate::workflow::Workflow;

/// Exported directory containing the steamcmd executables.
pub const STEAM_CMD: &str = "STEAM_CMD";
/// Exported steam data-home directory.
pub const STEAM_DIR: &str = "STEAM_DIR";
/// Exported per-run scratch directory.
pub const STEAM_TEMP: &str = "STEAM_TEMP";

pub const IS_POST_STATE: &str = "isPost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Main,
    Post,
}

pub fn current_phase(sink: &dyn Workflow) -> Phase {
    match sink.state(IS_POST_STATE) {
        Some(_) => Phase::Post,
        None => Phase::Main,
    }
}

/// Marks the post phase as pending, then provisions and exports steamcmd.
///
/// Failures are reported through `sink` and returned.
pub fn run_main(
    sink: &dyn Workflow,
    provisioner: &Provisioner,
    runner: &dyn ProcessRunner,
    config: &ProvisionConfig,
) -> Result<ResolvedLocations> {
    sink.save_state(IS_POST_STATE, "true")
        .context("Failed to save step state")?;
    sink.info("Setup steamcmd...");
    setup(sink, provisioner, runner, config).inspect_err(|err| sink.error(&format!("{err:#}")))
}

/// Provisions steamcmd, publishes its locations and runs it once.
pub fn setup(
    sink: &dyn Workflow,
    provisioner: &Provisioner,
    runner: &dyn ProcessRunner,
    config: &ProvisionConfig,
) -> Result<ResolvedLocations> {
    let locations = provisioner.provision(config)?;
    let tool_directory = &locations.tool_directory;

    debug!("{} -> {}", STEAM_CMD, tool_directory.display());
    sink.add_path(tool_directory)
        .context("Failed to add steamcmd to PATH")?;
    export(sink, STEAM_CMD, tool_directory)?;
    debug!("{} -> {}", STEAM_DIR, locations.steam_root_directory.display());
    export(sink, STEAM_DIR, &locations.steam_root_directory)?;
    debug!("{} -> {}", STEAM_TEMP, locations.scratch_directory.display());
    export(sink, STEAM_TEMP, &locations.scratch_directory)?;

    let tool = tool_directory.join(config.platform.invocable_file_name());
    let options = ExecOptions {
        ignore_return_code: config.platform.ignores_return_code(),
        silent: false,
    };
    runner
        .exec(&tool, &["+help", "+quit"], options)
        .with_context(|| format!("Failed to run {}", tool.display()))?;
    Ok(locations)
}

fn export(sink: &dyn Workflow, name: &str, value: &Path) -> Result<()> {
    sink.export_variable(name, &value.display().to_string())
        .with_context(|| format!("Failed to export {name}"))
}

/// Directories exported by the main phase, as seen by the post phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedLocations {
    pub steam_cmd: Option<PathBuf>,
    pub steam_dir: Option<PathBuf>,
    pub steam_temp: Option<PathBuf>,
}

impl ExportedLocations {
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        ExportedLocations {
            steam_cmd: var(STEAM_CMD),
            steam_dir: var(STEAM_DIR),
            steam_temp: var(STEAM_TEMP),
        }
    }
}

/// Prints steamcmd's logs, clearing the ones in its own directories.
///
/// Scratch logs are kept; logs under the install (Windows) or data-home
/// directory are deleted after printing.
pub fn run_post(sink: &dyn Workflow, platform: Platform, exported: &ExportedLocations) {
    sink.info("steamcmd logs:");
    harvest(sink, STEAM_TEMP, exported.steam_temp.as_deref(), false);
    if platform == Platform::Windows {
        harvest(sink, STEAM_CMD, exported.steam_cmd.as_deref(), true);
    } else {
        harvest(sink, STEAM_DIR, exported.steam_dir.as_deref(), true);
    }
}

fn harvest(sink: &dyn Workflow, name: &str, directory: Option<&Path>, clear: bool) {
    match directory {
        Some(directory) => {
            print_logs(sink, directory, clear);
        }
        None => sink.error(&format!("Failed to read logs: {name} is not set")),
    }
}
