//! Command-line host for the stitch counter core.
//!
//! # Responsibility
//! - Resolve configuration, open the storage slot and run one command.
//! - Keep output line-oriented so scripts can read it.

mod args;

use args::{Cli, Command};
use clap::Parser;
use log::info;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use stitchcount_core::store::selectors;
use stitchcount_core::timer::format_elapsed;
use stitchcount_core::{
    init_logging, AppConfig, CounterService, LogNotifier, SqliteSlotRepository, StorageBus,
    StoreResult, SyncedStore, SystemClock, TickDriver, TimerEngine,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("stitchcount: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = AppConfig::resolve(cli.config_input()).map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let command = cli.command();
    info!("event=cli_command module=cli command={}", command.name());
    if command == Command::Version {
        println!("stitchcount {}", stitchcount_core::core_version());
        return Ok(());
    }

    let repo = SqliteSlotRepository::open(&config.db_path).map_err(|err| err.to_string())?;
    let bus = StorageBus::new();
    let mut context = SyncedStore::open(repo, Arc::new(SystemClock), &bus);
    let engine = TimerEngine::shared(Arc::new(SystemClock), Arc::new(LogNotifier));
    let counters = CounterService::new(engine.interaction_hook());

    match command {
        Command::Summary | Command::Version => {}
        Command::List => {
            let doc = context.document();
            for project_id in selectors::projects_by_recent(doc) {
                if let Some(project) = doc.projects.get(project_id) {
                    println!("{project_id}\t{}\t{}", project.color, project.name);
                }
            }
            return Ok(());
        }
        Command::New => {
            let project_id = context
                .store_mut()
                .create_project()
                .map_err(|err| err.to_string())?;
            println!("created {project_id}");
        }
        Command::Select { project, section } => {
            let store = context.store_mut();
            let found = store
                .select_project(&project)
                .map_err(|err| err.to_string())?;
            if !found {
                return Err(format!("no project `{project}`"));
            }
            if let Some(section) = section {
                let found = store
                    .select_section(&project, &section)
                    .map_err(|err| err.to_string())?;
                if !found {
                    return Err(format!("no section `{section}` in `{project}`"));
                }
            }
        }
        Command::AddSection => {
            let project_id = selectors::selected_project_id(context.document())
                .ok_or("no project selected")?
                .to_string();
            context
                .store_mut()
                .add_section_to_project(&project_id)
                .map_err(|err| err.to_string())?;
        }
        Command::Inc { kind } => {
            counter_applied(counters.increment(context.store_mut(), kind.into()))?;
        }
        Command::Dec { kind } => {
            counter_applied(counters.decrement(context.store_mut(), kind.into()))?;
        }
        Command::Reset { kind } => {
            counter_applied(counters.reset(context.store_mut(), kind.into()))?;
        }
        Command::Time { seconds } => {
            run_timer(context, &engine, config.tick_interval, seconds)?;
            return Ok(());
        }
    }

    print_summary(context.document());
    Ok(())
}

/// Runs the selected section's timer in the foreground for `seconds`.
fn run_timer(
    context: SyncedStore<SqliteSlotRepository>,
    engine: &Arc<TimerEngine>,
    tick_interval: Duration,
    seconds: u64,
) -> Result<(), String> {
    let context = Arc::new(Mutex::new(context));
    {
        let mut guard = context.lock().unwrap_or_else(PoisonError::into_inner);
        let started = engine
            .start_selected(guard.store_mut())
            .map_err(|err| err.to_string())?;
        if !started {
            return Err("no section selected".to_string());
        }
    }

    let ticker = {
        let context = Arc::clone(&context);
        let engine = Arc::clone(engine);
        TickDriver::spawn(tick_interval, move || {
            let mut guard = context.lock().unwrap_or_else(PoisonError::into_inner);
            guard.pump();
            if let Err(err) = engine.tick(guard.store_mut()) {
                eprintln!("stitchcount: timer flush failed: {err}");
            }
        })
        .map_err(|err| err.to_string())?
    };

    std::thread::sleep(Duration::from_secs(seconds));
    ticker.stop();

    let mut guard = context.lock().unwrap_or_else(PoisonError::into_inner);
    let elapsed = engine
        .stop(guard.store_mut())
        .map_err(|err| err.to_string())?;
    if let Some(elapsed) = elapsed {
        println!("timer stopped at {}", format_elapsed(elapsed));
    }
    print_summary(guard.document());
    Ok(())
}

fn counter_applied(result: StoreResult<bool>) -> Result<(), String> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err("no section selected".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

fn print_summary(doc: &stitchcount_core::StoreDocument) {
    let Some(project) = selectors::selected_project(doc) else {
        println!("no project selected ({} projects)", doc.projects.len());
        return;
    };
    println!("project: {} ({})", project.name, project.color);

    match selectors::selected_section(doc) {
        Some(section) => println!(
            "section: {} stitches={} rows={} repeats={} time={}",
            section.name,
            section.data.stitches,
            section.data.rows,
            section.data.repeats,
            format_elapsed(section.data.time)
        ),
        None => println!("section: none"),
    }

    let totals = selectors::selected_project_totals(doc);
    println!(
        "totals: sections={} stitches={} rows={} repeats={} time={}",
        totals.section_count,
        totals.stitches,
        totals.rows,
        totals.repeats,
        format_elapsed(totals.time)
    );
}
