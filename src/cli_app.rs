//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use tvdeck::artwork::ArtworkWorker;
use tvdeck::cli::session;
use tvdeck::core::config::Config;
use tvdeck::core::errors::TvdError;
use tvdeck::engine::{Collaborators, Engine};
use tvdeck::logger::{ActivityEvent, JsonlConfig, JsonlWriter, LogEntry};
use tvdeck::platform::{SharedModalGate, SystemLauncher};
use tvdeck::store::{Item, ItemStore, LoadOutcome};

/// tvdeck: couch-friendly launcher with a circular carousel.
#[derive(Debug, Parser)]
#[command(
    name = "tvdeck",
    author,
    version,
    about = "Couch-friendly application launcher",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override library file path.
    #[arg(long, global = true, value_name = "PATH")]
    library: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Open the interactive carousel.
    Run(RunArgs),
    /// List library items in carousel order.
    List,
    /// Append an item to the library.
    Add(AddArgs),
    /// Change an existing item.
    Edit(EditArgs),
    /// Remove an item by position.
    Remove(RemoveArgs),
    /// Move an item to a new position.
    Move(MoveArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct RunArgs {
    /// Ask the terminal for key-release events (enables long-press reorder).
    #[arg(long)]
    release_events: bool,
    /// Skip background artwork lookup.
    #[arg(long)]
    no_artwork: bool,
}

#[derive(Debug, Clone, Args)]
struct AddArgs {
    /// Display name.
    name: String,
    /// Executable or shortcut to launch.
    path: String,
    /// Optional icon path.
    #[arg(long, value_name = "PATH")]
    icon: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct EditArgs {
    /// Zero-based position.
    index: usize,
    /// New display name.
    #[arg(long)]
    name: Option<String>,
    /// New launch target.
    #[arg(long)]
    path: Option<String>,
    /// New icon path.
    #[arg(long, value_name = "PATH")]
    icon: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct RemoveArgs {
    /// Zero-based position.
    index: usize,
}

#[derive(Debug, Clone, Args)]
struct MoveArgs {
    /// Current zero-based position.
    from: usize,
    /// Target zero-based position.
    to: usize,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration and print its hash.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<TvdError> for CliError {
    fn from(error: TvdError) -> Self {
        match error {
            TvdError::InvalidConfig { .. }
            | TvdError::MissingConfig { .. }
            | TvdError::ConfigParse { .. }
            | TvdError::EmptyStore
            | TvdError::IndexOutOfRange { .. }
            | TvdError::InvalidItem { .. }
            | TvdError::ReorderBusy => Self::User(error.to_string()),
            TvdError::Serialization { .. } => Self::Internal(error.to_string()),
            _ => Self::Runtime(error.to_string()),
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(cli: &Cli) {
    use tracing_subscriber::prelude::*;

    let fallback = if cli.verbose { "tvdeck=debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(!cli.no_color),
        )
        .try_init();
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_session(cli, args),
        Command::List => run_list(cli),
        Command::Add(args) => run_add(cli, args),
        Command::Edit(args) => run_edit(cli, args),
        Command::Remove(args) => run_remove(cli, args),
        Command::Move(args) => run_move(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── shared loading ────────────────────

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(library) = &cli.library {
        config.paths.library_file.clone_from(library);
    }
    Ok(config)
}

/// Load the library for a command that will write it back. Unreadable
/// files are refused so they are never overwritten.
fn load_store_for_update(path: &Path) -> Result<ItemStore, CliError> {
    match ItemStore::load(path) {
        LoadOutcome::Loaded { store, dropped } => {
            if dropped > 0 {
                tracing::warn!(dropped, "invalid entries will be dropped on save");
            }
            Ok(store)
        }
        LoadOutcome::Missing => Ok(ItemStore::new()),
        LoadOutcome::Corrupt { details } => Err(CliError::User(format!(
            "library {} is not valid JSON ({details}); fix or remove it first",
            path.display()
        ))),
        LoadOutcome::IoError { details } => Err(CliError::Runtime(format!(
            "cannot read library {}: {details}",
            path.display()
        ))),
    }
}

fn activity_log(config: &Config) -> JsonlWriter {
    JsonlWriter::open(JsonlConfig::for_paths(&config.paths))
}

fn save(store: &ItemStore, config: &Config, entry: LogEntry) -> Result<(), CliError> {
    store.persist(&config.paths.library_file)?;
    let mut log = activity_log(config);
    log.write_entry(&entry);
    log.flush();
    Ok(())
}

// ──────────────────── run ────────────────────

fn run_session(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if args.release_events {
        if session::release_events_supported() {
            config.input.keyboard_release_events = true;
        } else {
            tracing::warn!("terminal cannot report key releases; long press disabled");
            config.input.keyboard_release_events = false;
        }
    }

    tracing::info!(hash = %config.stable_hash()?, "configuration loaded");

    let outcome = ItemStore::load(&config.paths.library_file);
    match &outcome {
        LoadOutcome::Corrupt { details } | LoadOutcome::IoError { details } => {
            tracing::warn!(%details, "library unreadable; starting empty");
        }
        LoadOutcome::Missing => tracing::info!("no library yet; starting empty"),
        LoadOutcome::Loaded { .. } => {}
    }
    let store = outcome.into_store();

    let gate = SharedModalGate::new();
    let library_path = config.paths.library_file.clone();
    let assets_dir = config.paths.assets_dir.clone();
    let log = activity_log(&config);
    let collaborators = Collaborators {
        launcher: Box::new(SystemLauncher::new()),
        modal: Box::new(gate.clone()),
        ..Collaborators::default()
    };
    let mut engine = Engine::new(config, store, collaborators)
        .with_library_path(library_path)
        .with_activity_log(log);
    if !args.no_artwork {
        match ArtworkWorker::spawn(assets_dir) {
            Ok(worker) => engine = engine.with_artwork(worker),
            Err(e) => tracing::warn!(error = %e, "artwork lookup disabled"),
        }
    }

    let result = session::run(&mut engine, &gate);
    engine.shutdown();
    result.map_err(|e| CliError::Runtime(format!("terminal session failed: {e}")))
}

// ──────────────────── library commands ────────────────────

fn run_list(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let path = &config.paths.library_file;
    let outcome = ItemStore::load(path);
    if let LoadOutcome::Corrupt { details } | LoadOutcome::IoError { details } = &outcome {
        return Err(CliError::Runtime(format!(
            "cannot read library {}: {details}",
            path.display()
        )));
    }
    let store = outcome.into_store();

    match output_mode(cli) {
        OutputMode::Human => {
            if store.is_empty() {
                println!("Library is empty ({}).", path.display());
            }
            for (index, item) in store.iter().enumerate() {
                println!(
                    "{:>3}  {}  {}",
                    index,
                    item.name.bold(),
                    item.path.as_str().dimmed()
                );
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "list",
                "library": path.to_string_lossy(),
                "items": store.items(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_add(cli: &Cli, args: &AddArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut store = load_store_for_update(&config.paths.library_file)?;
    let mut item = Item::new(args.name.trim(), args.path.trim())?;
    if let Some(icon) = &args.icon {
        item = item.with_icon(icon.as_str());
    }
    let index = store.push(item)?;
    save(
        &store,
        &config,
        LogEntry::info(ActivityEvent::ItemAdded)
            .item(args.name.trim())
            .index(index),
    )?;
    report(cli, "add", &format!("Added {} at {index}.", args.name.trim()), json!({ "index": index }))
}

fn run_edit(cli: &Cli, args: &EditArgs) -> Result<(), CliError> {
    if args.name.is_none() && args.path.is_none() && args.icon.is_none() {
        return Err(CliError::User(
            "specify at least one of --name, --path or --icon".to_string(),
        ));
    }
    let config = load_config(cli)?;
    let mut store = load_store_for_update(&config.paths.library_file)?;
    let current = store
        .get(args.index)
        .cloned()
        .ok_or(TvdError::IndexOutOfRange {
            index: args.index,
            len: store.len(),
        })?;
    let updated = Item {
        name: args.name.as_deref().map_or(current.name, |n| n.trim().to_string()),
        path: args.path.as_deref().map_or(current.path, |p| p.trim().to_string()),
        icon: args.icon.clone().or(current.icon),
    };
    let name = updated.name.clone();
    store.replace(args.index, updated)?;
    save(
        &store,
        &config,
        LogEntry::info(ActivityEvent::ItemEdited)
            .item(name.as_str())
            .index(args.index),
    )?;
    report(cli, "edit", &format!("Updated {name}."), json!({ "index": args.index }))
}

fn run_remove(cli: &Cli, args: &RemoveArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut store = load_store_for_update(&config.paths.library_file)?;
    let removed = store.remove(args.index)?;
    save(
        &store,
        &config,
        LogEntry::info(ActivityEvent::ItemRemoved)
            .item(removed.name.as_str())
            .index(args.index),
    )?;
    report(
        cli,
        "remove",
        &format!("Removed {}.", removed.name),
        json!({ "index": args.index, "name": removed.name }),
    )
}

fn run_move(cli: &Cli, args: &MoveArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut store = load_store_for_update(&config.paths.library_file)?;
    store.move_item(args.from, args.to)?;
    let name = store
        .get(args.to)
        .map(|item| item.name.clone())
        .unwrap_or_default();
    save(
        &store,
        &config,
        LogEntry::info(ActivityEvent::ReorderCommit)
            .item(name.as_str())
            .moved(args.from, args.to),
    )?;
    report(
        cli,
        "move",
        &format!("Moved {name} from {} to {}.", args.from, args.to),
        json!({ "from": args.from, "to": args.to }),
    )
}

fn report(cli: &Cli, command: &str, human: &str, extra: Value) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            println!("{}", human.green());
            Ok(())
        }
        OutputMode::Json => {
            let mut payload = json!({ "command": command, "ok": true });
            if let (Some(target), Value::Object(fields)) = (payload.as_object_mut(), extra) {
                target.extend(fields);
            }
            write_json_line(&payload)
        }
    }
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;
            let hash = config.stable_hash()?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("# hash: {hash}");
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "hash": hash,
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match load_config(cli) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("TVD_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
