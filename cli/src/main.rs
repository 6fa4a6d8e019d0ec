//! dskcmd - Command-line driver for the dual-pane commander engine.
//!
//! A non-interactive front end for testing and manual use: every decision
//! the engine would normally ask a user for is answered from flags, so
//! batches run unattended.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use engine::{
    create_directory, delete_many, rename_entry, transfer, BatchReport, Config, ConflictChoice,
    DeleteOptions, Entry, EntryStatus, HostBackend, PromptHandler,
};
use engine::backend::Backend;

/// dskcmd - file operations across commander panes
#[derive(Parser, Debug)]
#[command(name = "dskcmd")]
#[command(version = "0.1.0")]
#[command(about = "Copy, delete, rename and create entries through the commander engine")]
struct Args {
    /// Enable per-entry output
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to a settings file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy every entry of a source directory into a target directory
    Copy {
        /// Source directory
        #[arg(long, value_name = "PATH")]
        src: PathBuf,

        /// Target directory
        #[arg(long, value_name = "PATH")]
        dst: PathBuf,

        /// What to do when a file already exists: skip, overwrite, or cancel
        #[arg(long, value_name = "CHOICE", default_value = "skip")]
        on_conflict: String,

        /// What to do when a directory cannot be created: continue or cancel
        #[arg(long, value_name = "CHOICE", default_value = "cancel")]
        on_mkdir_error: String,
    },

    /// Delete named entries of a directory
    Delete {
        /// Directory holding the entries
        #[arg(long, value_name = "PATH")]
        dir: PathBuf,

        /// Entry names to delete
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,

        /// Delete permanently instead of using the trash
        #[arg(long)]
        no_trash: bool,

        /// Pre-confirm recursive deletion of non-empty directories
        #[arg(long)]
        recursive: bool,

        /// Pre-confirm permanent deletion when the trash fails
        #[arg(long)]
        force_permanent: bool,
    },

    /// Rename one entry
    Rename {
        /// Directory holding the entry
        #[arg(long, value_name = "PATH")]
        dir: PathBuf,

        /// Current name
        name: String,

        /// New name
        new_name: String,
    },

    /// Create a directory
    Mkdir {
        /// Directory to create it in
        #[arg(long, value_name = "PATH")]
        dir: PathBuf,

        /// Name of the new directory
        name: String,
    },
}

/// Answers engine prompts from command-line flags.
struct FlagPrompts {
    conflict: ConflictChoice,
    continue_on_mkdir_failure: bool,
    recursive: bool,
    permanent: bool,
}

impl PromptHandler for FlagPrompts {
    fn resolve_conflict(&mut self, name: &str) -> ConflictChoice {
        eprintln!("Conflict: '{}' already exists -> {:?}", name, self.conflict);
        self.conflict
    }

    fn continue_after_mkdir_failure(&mut self, name: &str, error: &str) -> bool {
        eprintln!("Error creating directory '{}': {}", name, error);
        self.continue_on_mkdir_failure
    }

    fn confirm_recursive_delete(&mut self, name: &str) -> bool {
        if !self.recursive {
            eprintln!(
                "'{}' is a non-empty directory; pass --recursive to delete it",
                name
            );
        }
        self.recursive
    }

    fn confirm_permanent_delete(&mut self, name: &str) -> bool {
        if !self.permanent {
            eprintln!(
                "Cannot move '{}' to the trash; pass --force-permanent to delete it permanently",
                name
            );
        }
        self.permanent
    }
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };

    match &args.command {
        Command::Copy {
            src,
            dst,
            on_conflict,
            on_mkdir_error,
        } => run_copy(args, src, dst, on_conflict, on_mkdir_error),
        Command::Delete {
            dir,
            names,
            no_trash,
            recursive,
            force_permanent,
        } => run_delete(
            args,
            &config,
            dir,
            names,
            *no_trash,
            *recursive,
            *force_permanent,
        ),
        Command::Rename { dir, name, new_name } => run_rename(dir, name, new_name),
        Command::Mkdir { dir, name } => run_mkdir(dir, name),
    }
}

fn run_copy(
    args: &Args,
    src: &PathBuf,
    dst: &PathBuf,
    on_conflict: &str,
    on_mkdir_error: &str,
) -> Result<(), String> {
    let conflict = parse_conflict(on_conflict)?;
    let continue_on_mkdir_failure = parse_mkdir_policy(on_mkdir_error)?;

    let mut source = HostBackend::new(src).map_err(|e| e.to_string())?;
    let mut target = HostBackend::new(dst).map_err(|e| e.to_string())?;

    let entries: Vec<Entry> = source
        .dir(false)
        .map_err(|e| format!("Failed to list source: {}", e))?
        .into_iter()
        .filter(|e| !e.is_parent_ref())
        .collect();

    let mut prompts = FlagPrompts {
        conflict,
        continue_on_mkdir_failure,
        recursive: false,
        permanent: false,
    };

    // Host-to-host transfers need no export format.
    let report = transfer(&mut source, &mut target, &entries, "", &mut prompts)
        .map_err(|e| e.to_string())?;
    finish_batch(args, &report)
}

fn run_delete(
    args: &Args,
    config: &Config,
    dir: &PathBuf,
    names: &[String],
    no_trash: bool,
    recursive: bool,
    force_permanent: bool,
) -> Result<(), String> {
    let mut backend = HostBackend::new(dir).map_err(|e| e.to_string())?;
    let entries = select_entries(&mut backend, names)?;

    let mut prompts = FlagPrompts {
        conflict: ConflictChoice::Skip,
        continue_on_mkdir_failure: false,
        recursive,
        permanent: force_permanent,
    };

    let options = DeleteOptions {
        use_trash: !no_trash && config.use_recycle_bin,
    };
    let report =
        delete_many(&mut backend, &entries, options, &mut prompts).map_err(|e| e.to_string())?;
    finish_batch(args, &report)
}

fn run_rename(dir: &PathBuf, name: &str, new_name: &str) -> Result<(), String> {
    let mut backend = HostBackend::new(dir).map_err(|e| e.to_string())?;
    let names = vec![name.to_string()];
    let entries = select_entries(&mut backend, &names)?;

    match rename_entry(&mut backend, &entries, new_name) {
        None => {
            eprintln!("Nothing to rename.");
            Ok(())
        }
        Some(Ok(())) => {
            eprintln!("Renamed '{}' to '{}'", name, new_name);
            Ok(())
        }
        Some(Err(err)) => Err(format!(
            "Error renaming '{}' to '{}': {}",
            name,
            new_name,
            err.decoded()
        )),
    }
}

fn run_mkdir(dir: &PathBuf, name: &str) -> Result<(), String> {
    let mut backend = HostBackend::new(dir).map_err(|e| e.to_string())?;
    match create_directory(&mut backend, name) {
        Ok(entry) => {
            eprintln!("Created directory '{}'", entry.name);
            Ok(())
        }
        Err(err) => Err(format!("Error creating directory: {}", err.decoded())),
    }
}

/// Resolve entry names against a fresh listing of the backend.
fn select_entries(backend: &mut HostBackend, names: &[String]) -> Result<Vec<Entry>, String> {
    let listing = backend
        .dir(false)
        .map_err(|e| format!("Failed to list directory: {}", e))?;
    let mut selected = Vec::new();
    for name in names {
        match listing.iter().find(|e| &e.name == name) {
            Some(entry) => selected.push(entry.clone()),
            None => return Err(format!("No such entry: {}", name)),
        }
    }
    Ok(selected)
}

fn parse_conflict(value: &str) -> Result<ConflictChoice, String> {
    match value.to_lowercase().as_str() {
        "skip" => Ok(ConflictChoice::Skip),
        "overwrite" => Ok(ConflictChoice::Overwrite),
        "cancel" => Ok(ConflictChoice::Cancel),
        _ => Err(format!(
            "Invalid conflict choice '{}'. Must be 'skip', 'overwrite', or 'cancel'",
            value
        )),
    }
}

fn parse_mkdir_policy(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "continue" => Ok(true),
        "cancel" => Ok(false),
        _ => Err(format!(
            "Invalid mkdir-error choice '{}'. Must be 'continue' or 'cancel'",
            value
        )),
    }
}

/// Print the batch result and turn failures into a non-zero exit.
fn finish_batch(args: &Args, report: &BatchReport) -> Result<(), String> {
    if args.verbose {
        for outcome in &report.outcomes {
            let kind = if outcome.is_dir { "dir " } else { "file" };
            match &outcome.message {
                Some(message) => {
                    eprintln!("{} {:<8} {}: {}", kind, outcome.status, outcome.name, message)
                }
                None => eprintln!("{} {:<8} {}", kind, outcome.status, outcome.name),
            }
        }
    }

    eprintln!(
        "Summary: {} done, {} skipped, {} failed{}",
        report.done_count(),
        report.skipped_count(),
        report.failed_count(),
        if report.aborted { " (batch aborted)" } else { "" }
    );

    let has_failures = report
        .outcomes
        .iter()
        .any(|o| o.status == EntryStatus::Failed);
    if has_failures {
        Err("One or more entries failed".to_string())
    } else {
        Ok(())
    }
}
