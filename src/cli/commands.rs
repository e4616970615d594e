//! Command dispatch
//!
//! Loads settings, wires the services and hands each subcommand to its service.

use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::DataOptions;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute a parsed command line and return the process exit code.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    match &cli.command {
        Commands::Completion { shell } => {
            print_completions(*shell);
            Ok(exitcode::OK)
        }
        Commands::Config { command } => {
            // `path` and `init` must work before a readable config file exists
            let settings = match command {
                ConfigCommands::Show => Settings::load(cli.config.as_deref())?,
                _ => Settings::default(),
            };
            let container = ServiceContainer::new(settings);
            cmd_config(&container, command, cli.config.as_deref())
        }
        command => {
            let settings = Settings::load(cli.config.as_deref())?;
            let container = ServiceContainer::new(settings);
            execute_with_container(&container, command)
        }
    }
}

/// Dispatch the engine commands against an already wired container.
pub fn execute_with_container(container: &ServiceContainer, command: &Commands) -> CliResult<i32> {
    match command {
        Commands::Run { file, show_log } => cmd_run(container, file, *show_log),
        Commands::Data {
            dataset,
            libref,
            obs,
            keep,
            drop,
            where_clause,
            info_only,
        } => {
            let options = DataOptions {
                dataset: dataset.clone(),
                libref: libref.clone(),
                obs: *obs,
                keep: keep.clone(),
                drop: drop.clone(),
                where_clause: where_clause.clone(),
                info_only: *info_only,
            };
            cmd_data(container, &options)
        }
        Commands::Lib { libref } => cmd_lib(container, libref),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::InvalidArgs(
            "command does not use an engine session".into(),
        )),
    }
}

#[instrument(skip(container))]
fn cmd_run(container: &ServiceContainer, file: &Path, show_log: bool) -> CliResult<i32> {
    debug!("run: {}", file.display());
    let runner = container.program_runner();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let code = container.with_session(|session| {
        runner.run(
            session,
            file,
            show_log,
            &mut stdout.lock(),
            &mut stderr.lock(),
        )
    })?;
    Ok(code)
}

#[instrument(skip(container))]
fn cmd_data(container: &ServiceContainer, options: &DataOptions) -> CliResult<i32> {
    let inspector = container.inspector();
    let stdout = io::stdout();
    let code =
        container.with_session(|session| inspector.describe(session, options, &mut stdout.lock()))?;
    Ok(code)
}

#[instrument(skip(container))]
fn cmd_lib(container: &ServiceContainer, libref: &str) -> CliResult<i32> {
    let inspector = container.inspector();
    let stdout = io::stdout();
    let code = container
        .with_session(|session| inspector.list_library(session, libref, &mut stdout.lock()))?;
    Ok(code)
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    explicit: Option<&Path>,
) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            output::plain(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let path = config_file_path(explicit)?;
            output::config_location(&path, container.fs.exists(&path));
        }
        ConfigCommands::Init { force } => {
            let path = config_file_path(explicit)?;
            if container.fs.exists(&path) && !force {
                output::warning(&format!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                ));
                return Ok(exitcode::FAILURE);
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::created(&path);
        }
    }
    Ok(exitcode::OK)
}

fn config_file_path(explicit: Option<&Path>) -> CliResult<std::path::PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => global_config_path().ok_or_else(|| {
            CliError::from(ApplicationError::Config {
                message: "cannot determine the user config directory".into(),
            })
        }),
    }
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = io::stdout();
    generate(shell, &mut cmd, name, &mut stdout);
    let _ = stdout.flush();
}
