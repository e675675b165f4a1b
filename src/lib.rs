// RCIcon - Rust folder icon manager
// Keeps each folder's desktop.ini pointing at the icon.ico it contains

pub mod ehm;
pub mod file_attributes;
pub mod ini_file;
pub mod icon_converter;
pub mod icon_resource;
pub mod descriptor;
pub mod directory_node;
pub mod tree_synchronizer;
pub mod config;
pub mod command_line;
pub mod usage;
pub mod results_displayer;

use std::io::{self, Write};

use env_logger::Builder;
use log::{debug, LevelFilter};

use command_line::{Action, CommandLine};
use config::Config;
use directory_node::{DirectoryNode, IconState};
use ehm::AppError;
use file_attributes::{AttributeProvider, NativeAttributeProvider};
use icon_converter::ImageIconConverter;
use icon_resource::IconResource;
use results_displayer::{ResultsDisplayer, StateTotals, TextDisplayer};
use tree_synchronizer::{FailurePolicy, SyncFailure, SyncReport, TreeSynchronizer};





////////////////////////////////////////////////////////////////////////////////
//
//  run
//
//  Main entry point for the library.  Called by main.rs; returns Result
//  for clean error handling.
//
////////////////////////////////////////////////////////////////////////////////

pub fn run() -> Result<(), AppError> {
    let mut config = Config::new();
    config.initialize();

    let cmd = match parse_command_line(std::env::args().skip(1), &config) {
        Ok(cmd) => cmd,
        Err(e) => {
            usage::display_usage(&mut io::stderr().lock(), '-')?;
            return Err(e);
        }
    };

    init_logging(cmd.debug);

    let provider = NativeAttributeProvider::default();
    let stdout = io::stdout();
    execute(&cmd, &config, &provider, &mut stdout.lock())
}





////////////////////////////////////////////////////////////////////////////////
//
//  parse_command_line
//
//  RCICON defaults first, then the arguments on top.
//
////////////////////////////////////////////////////////////////////////////////

pub fn parse_command_line<I, S>(args: I, config: &Config) -> Result<CommandLine, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = CommandLine::default();
    cmd.apply_config_defaults(config);
    cmd.parse_into(args)?;
    Ok(cmd)
}





////////////////////////////////////////////////////////////////////////////////
//
//  init_logging
//
//  Warnings and errors by default, RUST_LOG on top, everything from this
//  crate at debug level with --debug.  Safe to call more than once.
//
////////////////////////////////////////////////////////////////////////////////

fn init_logging(debug: bool) {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Warn).parse_default_env();

    if debug {
        builder.filter(Some(env!("CARGO_CRATE_NAME")), LevelFilter::Debug);
    }

    // A logger may already be installed (tests)
    let _ = builder.try_init();
}





////////////////////////////////////////////////////////////////////////////////
//
//  execute
//
//  Carry out a parsed command line, writing results to `out`.
//
////////////////////////////////////////////////////////////////////////////////

pub fn execute(
    cmd:      &CommandLine,
    config:   &Config,
    provider: &dyn AttributeProvider,
    out:      &mut dyn Write,
) -> Result<(), AppError> {
    if cmd.show_help {
        return Ok(usage::display_usage(out, cmd.switch_prefix)?);
    }

    if cmd.show_env_help {
        return Ok(usage::display_env_var_help(out, config, cmd.switch_prefix)?);
    }

    if cmd.show_config {
        return Ok(usage::display_current_configuration(out, config, cmd.switch_prefix)?);
    }

    if cmd.directories.is_empty() {
        return Err(AppError::InvalidArg("No directory given".into()));
    }

    let policy = if cmd.keep_going { FailurePolicy::BestEffort } else { FailurePolicy::FailFast };
    let mut displayer = TextDisplayer::new(out, cmd.quiet);

    debug!("action {:?}, policy {:?}, {} directories", cmd.action(), policy, cmd.directories.len());

    match cmd.action() {
        Action::List => list(cmd, provider, policy, &mut displayer),

        Action::AssignFromImage(image) => {
            let icon = IconResource::create_from_image(&image, &ImageIconConverter::default())?;
            assign(cmd, &icon, provider, policy, &mut displayer)
        }

        Action::AssignIcon(path) => {
            let icon = IconResource::from_path(path)?;
            assign(cmd, &icon, provider, policy, &mut displayer)
        }

        Action::Synchronize => synchronize(cmd, provider, policy, &mut displayer),
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  collect_directories
//
//  Build the working list from the named directories (and their subtrees
//  with /S).  Under BestEffort a missing root is reported and skipped.
//
////////////////////////////////////////////////////////////////////////////////

fn collect_directories<'a>(
    cmd:       &CommandLine,
    provider:  &'a dyn AttributeProvider,
    policy:    FailurePolicy,
    displayer: &mut dyn ResultsDisplayer,
    failures:  &mut Vec<SyncFailure>,
) -> Result<TreeSynchronizer<'a>, AppError> {
    let mut synchronizer = TreeSynchronizer::new(provider);

    for directory in &cmd.directories {
        let added = if cmd.recurse {
            synchronizer.add_root(directory).map(|_| ())
        } else {
            synchronizer.add_directory(directory).map(|_| ())
        };

        if let Err(error) = added {
            if policy == FailurePolicy::FailFast {
                return Err(error);
            }

            displayer.display_error(directory, &error)?;
            failures.push(SyncFailure { path: directory.clone(), error });
        }
    }

    Ok(synchronizer)
}





////////////////////////////////////////////////////////////////////////////////
//
//  finish
//
//  Summary line, then a Partial error if anything failed.
//
////////////////////////////////////////////////////////////////////////////////

fn finish(report: &SyncReport, displayer: &mut dyn ResultsDisplayer) -> Result<(), AppError> {
    displayer.display_sync_summary(report)?;

    if report.is_complete() {
        Ok(())
    } else {
        Err(AppError::Partial { failed: report.failures.len(), total: report.directory_count() })
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  synchronize
//
//  set_icon_if_has on every selected directory.
//
////////////////////////////////////////////////////////////////////////////////

fn synchronize(
    cmd:       &CommandLine,
    provider:  &dyn AttributeProvider,
    policy:    FailurePolicy,
    displayer: &mut dyn ResultsDisplayer,
) -> Result<(), AppError> {
    let mut root_failures = Vec::new();
    let synchronizer = collect_directories(cmd, provider, policy, displayer, &mut root_failures)?;

    let mut write_error: Option<io::Error> = None;

    let mut report = synchronizer.synchronize_with_progress(policy, |path, outcome| {
        // Fail-fast errors are returned to the caller and reported there
        if outcome.is_err() && policy == FailurePolicy::FailFast {
            return;
        }

        if write_error.is_none()
            && let Err(e) = displayer.display_outcome(path, outcome)
        {
            write_error = Some(e);
        }
    })?;

    if let Some(e) = write_error {
        return Err(e.into());
    }

    root_failures.append(&mut report.failures);
    report.failures = root_failures;

    finish(&report, displayer)
}





////////////////////////////////////////////////////////////////////////////////
//
//  assign
//
//  change_icon with the same icon on every selected directory.
//
////////////////////////////////////////////////////////////////////////////////

fn assign(
    cmd:       &CommandLine,
    icon:      &IconResource,
    provider:  &dyn AttributeProvider,
    policy:    FailurePolicy,
    displayer: &mut dyn ResultsDisplayer,
) -> Result<(), AppError> {
    let mut report = SyncReport::default();
    let synchronizer = collect_directories(cmd, provider, policy, displayer, &mut report.failures)?;

    for node in synchronizer.directories() {
        match node.change_icon(icon) {
            Ok(()) => {
                displayer.display_outcome(node.path(), &Ok(true))?;
                report.assigned.push(node.path().to_path_buf());
            }
            Err(error) if policy == FailurePolicy::FailFast => return Err(error),
            Err(error) => {
                displayer.display_error(node.path(), &error)?;
                report.failures.push(SyncFailure { path: node.path().to_path_buf(), error });
            }
        }
    }

    finish(&report, displayer)
}





////////////////////////////////////////////////////////////////////////////////
//
//  list
//
//  Show each selected directory's attributes and icon state.
//
////////////////////////////////////////////////////////////////////////////////

fn list(
    cmd:       &CommandLine,
    provider:  &dyn AttributeProvider,
    policy:    FailurePolicy,
    displayer: &mut dyn ResultsDisplayer,
) -> Result<(), AppError> {
    let mut failures = Vec::new();
    let synchronizer = collect_directories(cmd, provider, policy, displayer, &mut failures)?;
    let mut totals = StateTotals::default();

    for node in synchronizer.directories() {
        match describe(node) {
            Ok((attributes, state)) => {
                displayer.display_state(node.path(), attributes, state)?;
                totals.add(state);
            }
            Err(error) if policy == FailurePolicy::FailFast => return Err(error),
            Err(error) => {
                displayer.display_error(node.path(), &error)?;
                failures.push(SyncFailure { path: node.path().to_path_buf(), error });
            }
        }
    }

    displayer.display_list_summary(&totals)?;

    if failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::Partial { failed: failures.len(), total: totals.total() + failures.len() })
    }
}





fn describe(node: &DirectoryNode<'_>) -> Result<(u32, IconState), AppError> {
    let attributes = node.attributes()?.attributes()?;
    Ok((attributes, node.icon_state()?))
}

