//! clk - Clicker CLI
//!
//! Record pointer positions on a hotkey and replay them as phased clicks.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clicker::prelude::*;
use parking_lot::RwLock;

mod repl;

#[derive(Parser)]
#[command(name = "clk")]
#[command(about = "Clicker - record pointer positions on a hotkey, replay them as clicks")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/clicker/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding sequence files (default: current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive recording session
    Session {
        /// Key that captures the pointer position
        #[arg(long, default_value = "f12")]
        trigger: Key,
        /// Mouse button that cancels PRE/MAIN during a run
        #[arg(long, default_value = "right")]
        cancel: Button,
        /// Log clicks instead of injecting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Play a sequence file once
    Play {
        file: String,
        /// Repeat MAIN until right-click
        #[arg(long = "loop")]
        looped: bool,
        #[arg(long, default_value = "2")]
        countdown: u64,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show or update settings
    Settings {
        #[arg(long)]
        delay: Option<u64>,
        #[arg(long = "loop")]
        loop_enabled: Option<bool>,
        #[arg(long)]
        loop_count: Option<i64>,
    },
    /// List saved sequence files
    List,
    /// Show a sequence file
    Show { file: String },
    /// Delete a sequence file
    Delete { file: String },
}

#[derive(Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

impl<T: Serialize> Output<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }
    fn err(e: &Error) -> Output<()> {
        Output {
            success: false,
            data: None,
            error: Some(ErrorBody { code: e.code(), message: e.to_string() }),
        }
    }
}

fn print_json<T: Serialize>(output: &T) {
    match serde_json::to_string_pretty(output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: could not encode output: {}", e),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings_path = cli
        .config
        .clone()
        .or_else(Settings::default_path)
        .unwrap_or_else(|| PathBuf::from("clicker-settings.json"));

    let result = storage(cli.dir.as_deref()).and_then(|storage| match cli.command {
        Commands::Session { trigger, cancel, dry_run } => {
            session(&storage, &settings_path, SessionConfig { trigger, cancel_button: cancel }, dry_run)
        }
        Commands::Play { file, looped, countdown, dry_run } => {
            play(&storage, &settings_path, &file, looped, countdown, dry_run)
        }
        Commands::Settings { delay, loop_enabled, loop_count } => {
            settings(&settings_path, delay, loop_enabled, loop_count)
        }
        Commands::List => list(&storage),
        Commands::Show { file } => show(&storage, &file),
        Commands::Delete { file } => delete(&storage, &file),
    });

    if let Err(e) = result {
        if let Some(err) = e.downcast_ref::<Error>() {
            print_json(&Output::<()>::err(err));
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn storage(dir: Option<&Path>) -> Result<SequenceStorage> {
    let storage = match dir {
        Some(dir) => SequenceStorage::with_dir(dir)?,
        None => SequenceStorage::new()?,
    };
    Ok(storage)
}

// ── Input backends ──────────────────────────────────────────────────────────

fn backend(dry_run: bool) -> Result<(Arc<dyn PointerDriver>, InputHub)> {
    let hub = InputHub::new();
    hook(&hub);
    if dry_run {
        return Ok((Arc::new(RecordingDriver::with_pointer(0, 0)), hub));
    }
    Ok((native_driver()?, hub))
}

#[cfg(feature = "native")]
fn hook(hub: &InputHub) {
    if let Err(e) = spawn_global_hook(hub.clone()) {
        tracing::warn!(error = %e, "global input hook unavailable");
    }
}

#[cfg(not(feature = "native"))]
fn hook(_hub: &InputHub) {
    tracing::warn!("built without native input, trigger and cancel keys are inactive");
}

#[cfg(feature = "native")]
fn native_driver() -> Result<Arc<dyn PointerDriver>> {
    let driver = EnigoDriver::new().context("could not open the input backend")?;
    Ok(Arc::new(driver))
}

#[cfg(not(feature = "native"))]
fn native_driver() -> Result<Arc<dyn PointerDriver>> {
    bail!("built without native input, use --dry-run")
}

// ── Commands ────────────────────────────────────────────────────────────────

fn session(
    storage: &SequenceStorage,
    settings_path: &Path,
    config: SessionConfig,
    dry_run: bool,
) -> Result<()> {
    let settings = Settings::load(settings_path);
    let (driver, hub) = backend(dry_run)?;
    let observer = Arc::new(|phase: Phase, index: usize, step: &Step| {
        println!("+ {}[{}] ({}, {}) {}ms", phase, index, step.x, step.y, step.delay_ms);
    });
    let session = Session::new(config, settings, driver, hub, observer)?;

    if let Some(last) = session.settings().last_file().map(Path::to_path_buf) {
        match session.load_file(&last) {
            Ok(seq) => println!("Loaded {} ({} steps)", last.display(), seq.total_steps()),
            Err(e) => tracing::warn!(path = %last.display(), error = %e, "could not reopen last file"),
        }
    }

    let handle = session.settings_handle();
    let path = settings_path.to_path_buf();
    ctrlc::set_handler(move || {
        if let Err(e) = handle.read().save(&path) {
            eprintln!("Error: could not save settings: {}", e);
        }
        std::process::exit(130);
    })?;

    println!(
        "Session ready. {:?} records into the armed phase ({}), {:?}-click cancels a run.",
        config.trigger,
        session.armed_phase(),
        config.cancel_button
    );
    println!("Type 'help' for commands.");

    let mut out = io::stdout();
    prompt(&mut out)?;
    for line in io::stdin().lock().lines() {
        match repl::parse(&line?) {
            Ok(None) => {}
            Ok(Some(repl::Command::Quit)) => break,
            Ok(Some(cmd)) => {
                if let Err(e) = execute(&session, storage, settings_path, cmd) {
                    println!("error: {:#}", e);
                }
            }
            Err(e) => println!("error: {:#}", e),
        }
        prompt(&mut out)?;
    }

    let settings = session.shutdown();
    settings.save(settings_path)?;
    Ok(())
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

fn execute(
    session: &Session,
    storage: &SequenceStorage,
    settings_path: &Path,
    cmd: repl::Command,
) -> Result<()> {
    use repl::Command;

    let store = session.store();
    match cmd {
        Command::Arm(phase) => {
            session.set_armed_phase(phase);
            println!("armed: {}", phase);
        }
        Command::List => print_steps(session),
        Command::Start => {
            let started = session.start()?;
            println!(
                "running {} steps{}",
                started.steps,
                if started.looped { ", looping MAIN" } else { "" }
            );
        }
        Command::Cancel => session.request_cancel(),
        Command::Wait => match session.wait() {
            Some(report) => print_json(&Output::ok(report_json(&report))),
            None => println!("no run to wait for"),
        },
        Command::Status => {
            let settings = session.settings();
            println!("state: {:?}", session.playback_state());
            println!("armed: {}", session.armed_phase());
            println!("captured: {}", session.captured());
            println!(
                "delay: {}ms, loop: {}, count: {}",
                settings.default_delay_ms,
                if settings.loop_enabled { "on" } else { "off" },
                settings.loop_count
            );
        }
        Command::Delay(ms) => {
            session.update_settings(|s| s.default_delay_ms = ms);
            println!("delay: {}ms", ms);
        }
        Command::Loop(on) => {
            session.update_settings(|s| s.loop_enabled = on);
            println!("loop: {}", if on { "on" } else { "off" });
        }
        Command::Count(n) => {
            session.update_settings(|s| s.loop_count = n);
        }
        Command::Edit { phase, index, step } => store.edit(phase, index, step)?,
        Command::Remove { phase, index } => {
            let step = store.remove(phase, index)?;
            println!("removed {}[{}] ({}, {})", phase, index, step.x, step.y);
        }
        Command::Up { phase, index } => {
            if !store.move_up(phase, index)? {
                println!("already first");
            }
        }
        Command::Down { phase, index } => {
            if !store.move_down(phase, index)? {
                println!("already last");
            }
        }
        Command::Goto { phase, index } => session.goto(phase, index)?,
        Command::Clear => session.clear(),
        Command::Save(name) => {
            let last = session.settings().last_file().map(Path::to_path_buf);
            let path = match (name, last) {
                (Some(name), _) => {
                    let path = with_json_ext(storage.resolve(name));
                    session.save_file(&path)?;
                    path
                }
                (None, Some(last)) => {
                    session.save_file(&last)?;
                    last
                }
                (None, None) => {
                    let path = storage.save_timestamped(&store.snapshot())?;
                    session.update_settings(|s| s.last_file = path.clone());
                    path
                }
            };
            session.settings().save(settings_path)?;
            println!("Saved: {}", path.display());
        }
        Command::Load(name) => {
            let path = storage.resolve(name);
            let seq = session.load_file(&path)?;
            println!("Loaded {} ({} steps)", path.display(), seq.total_steps());
        }
        Command::Files => list(storage)?,
        Command::Help => println!("{}", repl::HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn print_steps(session: &Session) {
    let armed = session.armed_phase();
    for phase in Phase::ALL {
        let steps = session.store().steps(phase);
        let marker = if phase == armed { " *" } else { "" };
        println!("{} ({}){}", phase, steps.len(), marker);
        for (i, step) in steps.iter().enumerate() {
            println!("  {:>3}  ({}, {})  {}ms", i, step.x, step.y, step.delay_ms);
        }
    }
}

fn with_json_ext(mut path: PathBuf) -> PathBuf {
    if path.extension().is_none() {
        path.set_extension("json");
    }
    path
}

fn play(
    storage: &SequenceStorage,
    settings_path: &Path,
    file: &str,
    looped: bool,
    countdown: u64,
    dry_run: bool,
) -> Result<()> {
    let sequences = storage.load(file)?;
    let mut settings = Settings::load(settings_path);
    settings.loop_enabled |= looped;
    let (driver, hub) = backend(dry_run)?;

    let controller = RunController::new(
        SequenceStore::with_sequences(sequences.clone()),
        Arc::new(RwLock::new(settings.clone())),
        driver,
        hub,
    );
    let state = controller.run_state();
    ctrlc::set_handler(move || {
        state.request_cancel();
    })?;

    println!(
        "Playing {} ({} pre, {} main, {} post{})",
        file,
        sequences.phase(Phase::Pre).len(),
        sequences.phase(Phase::Main).len(),
        sequences.phase(Phase::Post).len(),
        if settings.loop_enabled { ", looping" } else { "" }
    );
    if countdown > 0 {
        println!("Starting in {} seconds... right-click to stop", countdown);
        std::thread::sleep(Duration::from_secs(countdown));
    }

    controller.start()?;
    let report = controller.wait().context("playback thread panicked")?;
    print_json(&Output::ok(report_json(&report)));
    Ok(())
}

fn settings(
    path: &Path,
    delay: Option<u64>,
    loop_enabled: Option<bool>,
    loop_count: Option<i64>,
) -> Result<()> {
    let mut settings = Settings::load(path);
    let changed = delay.is_some() || loop_enabled.is_some() || loop_count.is_some();
    if let Some(ms) = delay {
        if ms == 0 {
            bail!("delay must be greater than 0");
        }
        settings.default_delay_ms = ms;
    }
    if let Some(on) = loop_enabled {
        settings.loop_enabled = on;
    }
    if let Some(n) = loop_count {
        settings.loop_count = n;
    }
    if changed {
        settings.save(path)?;
    }
    print_json(&Output::ok(&settings));
    Ok(())
}

fn list(storage: &SequenceStorage) -> Result<()> {
    let files = storage.list()?;
    if files.is_empty() {
        println!("No sequences saved in {}.", storage.path().display());
    } else {
        for f in files {
            println!("{}", f);
        }
    }
    Ok(())
}

fn show(storage: &SequenceStorage, file: &str) -> Result<()> {
    let sequences = storage.load(file)?;
    print_json(&Output::ok(serde_json::json!({
        "file": file,
        "pre": sequences.phase(Phase::Pre),
        "clicks": sequences.phase(Phase::Main),
        "post": sequences.phase(Phase::Post),
    })));
    Ok(())
}

fn delete(storage: &SequenceStorage, file: &str) -> Result<()> {
    storage.delete(file)?;
    println!("Deleted: {}", file);
    Ok(())
}

fn report_json(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "pre_clicks": report.pre_clicks,
        "main_clicks": report.main_clicks,
        "post_clicks": report.post_clicks,
        "main_iterations": report.main_iterations,
        "failed_steps": report.failed_steps,
        "cancelled": report.cancelled,
    })
}
