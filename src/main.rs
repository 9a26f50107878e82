use anyhow::{Context, Result};
use clap::Parser;
use picframe::logging::init_tracing;
use picframe::persistence::{JsonFileStore, Persistence};
use picframe::task_scheduler::TaskScheduler;
use picframe::{FrameApp, Locator, Settings, ViewCommand, Viewport};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Headless driver for the photo frame core.
#[derive(Parser, Debug)]
#[command(author, version, about = "Show, scan and restore photo frame state")]
struct Args {
    /// Verbose logging for this crate (overrides RUST_LOG)
    #[arg(long)]
    debug: bool,

    /// Scan the configured library roots
    #[arg(long)]
    scan: bool,

    /// Viewport size in pixels
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1920x1080")]
    size: (f32, f32),

    /// Images to open and directories to scan
    targets: Vec<String>,
}

fn parse_size(value: &str) -> std::result::Result<(f32, f32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = w.parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height = h.parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok((width, height))
}

fn open_persistence() -> Persistence {
    match JsonFileStore::open_default() {
        Ok(store) => {
            log::info!("state file: {}", store.path().display());
            Persistence::new(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!(error = %e, "state will not survive this run");
            Persistence::in_memory()
        }
    }
}

fn report(commands: Vec<ViewCommand>) {
    for command in commands {
        match command {
            ViewCommand::ApplyBrightness(_) | ViewCommand::Loading(_) => {
                tracing::debug!(?command, "view")
            }
            _ => tracing::info!(?command, "view"),
        }
    }
}

/// Polls until background work settles or the deadline passes.
fn drain(app: &mut FrameApp, deadline: Instant) {
    let frame_interval = app.settings().brightness.frame_interval();
    loop {
        let now = Instant::now();
        report(app.poll(now));
        if let Some(command) = app.tick(now) {
            report(vec![command]);
        }
        if (!app.is_loading() && !app.is_scanning()) || now >= deadline {
            break;
        }
        std::thread::sleep(frame_interval);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let settings = Settings::load();
    let load_timeout = settings.images.load_timeout();
    let viewport = Viewport::new(args.size.0, args.size.1).context("invalid viewport")?;
    let persistence = open_persistence();
    let scheduler = TaskScheduler::with_defaults().context("failed to start worker threads")?;
    let mut app = FrameApp::new(settings, viewport, persistence, scheduler);

    report(app.restore_session());

    let mut dirs = Vec::new();
    for target in args.targets {
        let path = PathBuf::from(&target);
        if path.is_dir() {
            dirs.push(path);
        } else {
            report(app.open(Locator::new(target)));
        }
    }
    drain(&mut app, Instant::now() + load_timeout);

    if args.scan || !dirs.is_empty() {
        let request = if dirs.is_empty() {
            app.start_scan()
        } else {
            app.start_scan_in(dirs)
        };
        report(vec![ViewCommand::Notify(request.notice())]);
        drain(&mut app, Instant::now() + Duration::from_secs(300));

        if app.current_locator().is_none() {
            report(app.navigate(picframe::NavDirection::Next));
            drain(&mut app, Instant::now() + load_timeout);
        }
    }

    match app.current_locator() {
        Some(locator) => println!("{}", locator),
        None => println!("(no image)"),
    }

    app.persist_view_state();
    app.persistence().flush().context("failed to write state")?;
    Ok(())
}
