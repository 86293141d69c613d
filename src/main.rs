// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{Event, KeyEventKind};
use tracing::{info, warn};

use rapbattle::battle::{run_simulation, AutoPlayer, BattleController, BattleEvent, TokioClock};
use rapbattle::config::BattleConfig;
use rapbattle::lyrics::LyricCatalog;
use rapbattle::ui::{App, KeyAction, UiState};

/// Starter picks for simulations
const SIMULATION_POOL: [&str; 4] = ["A2", "B1", "C3", "D1"];

fn print_usage() {
    println!("RAPBATTLE - Beat-synchronized rap battle");
    println!();
    println!("Usage: rapbattle [MODE] [OPTIONS]");
    println!();
    println!("Modes:");
    println!("  --play                  Play a battle in the terminal (default)");
    println!("  --simulate [SEED]       Run a headless battle with an automatic player");
    println!("  --list-lyrics           List the lyric catalog");
    println!("  --help                  Show this help message");
    println!();
    println!("Options:");
    println!("  --config <PATH>         Battle configuration (.yaml or .toml)");
    println!("  --lyrics <PATH>         Custom lyric catalog (.yaml)");
    println!("  --log <PATH>            Write logs to a file (terminal mode)");
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Play,
    Simulate(Option<u64>),
    ListLyrics,
    Help,
}

#[derive(Debug)]
struct Options {
    mode: Mode,
    config: Option<PathBuf>,
    lyrics: Option<PathBuf>,
    log: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        mode: Mode::Play,
        config: None,
        lyrics: None,
        log: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--play" => options.mode = Mode::Play,
            "--list-lyrics" => options.mode = Mode::ListLyrics,
            "--help" | "-h" => options.mode = Mode::Help,
            "--simulate" => {
                let seed = match args.get(i + 1) {
                    Some(value) if !value.starts_with("--") => {
                        i += 1;
                        Some(value.parse().map_err(|_| anyhow!("Invalid seed: {}", value))?)
                    }
                    _ => None,
                };
                options.mode = Mode::Simulate(seed);
            }
            flag @ ("--config" | "--lyrics" | "--log") => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("{} requires a path", flag))?;
                i += 1;
                let path = Some(PathBuf::from(value));
                match flag {
                    "--config" => options.config = path,
                    "--lyrics" => options.lyrics = path,
                    _ => options.log = path,
                }
            }
            other => return Err(anyhow!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(options)
}

fn load_config(options: &Options) -> Result<BattleConfig> {
    let config = match &options.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    config.validate().context("Invalid battle configuration")?;
    Ok(config)
}

fn load_catalog(options: &Options) -> Result<LyricCatalog> {
    match &options.lyrics {
        Some(path) => LyricCatalog::load(path),
        None => LyricCatalog::builtin(),
    }
}

fn list_lyrics(catalog: &LyricCatalog) {
    println!("{:<4} {:<10} {:>5}  {:<22} TEXT", "ID", "TYPE", "RHYME", "COUNTERS");
    for entry in catalog.entries() {
        let counters: Vec<&str> = entry.counters_to.iter().map(|kind| kind.name()).collect();
        println!(
            "{:<4} {:<10} {:>5}  {:<22} {}",
            entry.id,
            entry.kind,
            entry.rhyme_score,
            counters.join(","),
            entry.one_line()
        );
    }
}

fn simulate(config: BattleConfig, catalog: &LyricCatalog, seed: Option<u64>) -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let mut config = config;
    if seed.is_some() {
        config.rng_seed = seed;
    }
    let pool = rapbattle::PlayerLyricPool::from_ids(catalog, &SIMULATION_POOL)?;
    let clock = TokioClock::new();
    let mut controller = BattleController::with_time(config, catalog, pool, clock)?;
    let mut player = AutoPlayer::from_seed(seed);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let outcome = runtime.block_on(run_simulation(
        &mut controller,
        clock,
        &mut player,
        |event| match event {
            BattleEvent::OpponentActed { turn, lyric, score, .. } => {
                println!("Turn {} | OPP  {:<3} +{:<3} {}", turn, lyric.id, score, lyric.one_line())
            }
            BattleEvent::PlayerTurnResolved(report) => println!(
                "Turn {} | YOU  {:<3} +{:<3} {} (choice {}, rhyme {})",
                report.turn,
                report.lyric_id.as_deref().unwrap_or("-"),
                report.total_score,
                report.timing.accuracy,
                report.choice_score,
                report.rhyme_score
            ),
            _ => {}
        },
    ));

    match outcome {
        Some(outcome) => {
            println!();
            println!("{}", outcome.verdict.banner());
            println!("You {} - {} Opponent", outcome.player_score, outcome.opponent_score);
            Ok(())
        }
        None => Err(anyhow!("Battle stopped before it finished")),
    }
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create log file: {:?}", path))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn play(config: BattleConfig, catalog: &LyricCatalog) -> Result<()> {
    let mut app = App::new(UiState::new(catalog.entries().to_vec(), &config))?;
    let mut battle: Option<(BattleController, Receiver<BattleEvent>)> = None;

    while app.is_running() {
        if let Some((controller, events)) = battle.as_mut() {
            controller.update();
            for event in events.try_iter() {
                app.state_mut().apply_event(&event);
            }
            app.state_mut().scoreboard.update_from_state(controller.state());
        }

        app.draw()?;

        let wait = battle
            .as_ref()
            .and_then(|(controller, _)| controller.time_until_next_event());
        let Some(Event::Key(key)) = app.poll_event(wait)? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key.code, key.modifiers) {
            KeyAction::StartBattle => {
                let pool = match app.state().selection.to_pool(catalog) {
                    Ok(pool) => pool,
                    Err(err) => {
                        app.state_mut().set_status(err.to_string());
                        continue;
                    }
                };
                let entries = pool.entries().to_vec();
                info!(lyrics = ?app.state().selection.ids(), "Starting battle");
                let mut controller = BattleController::new(config.clone(), catalog, pool)?;
                let events = controller.subscribe();
                controller.start();
                app.state_mut().begin_battle(entries, &config);
                battle = Some((controller, events));
            }
            KeyAction::Perform(index) => {
                if let Some((controller, _)) = battle.as_mut() {
                    let lyric_id = controller
                        .state()
                        .player_pool()
                        .entries()
                        .get(index)
                        .map(|lyric| lyric.id.clone());
                    if let Some(lyric_id) = lyric_id {
                        if let Err(rejection) = controller.submit_now(&lyric_id) {
                            app.state_mut().set_status(rejection.to_string());
                        }
                    }
                }
            }
            KeyAction::Abandon | KeyAction::NewBattle => {
                if let Some((mut controller, _)) = battle.take() {
                    controller.abandon();
                }
                app.state_mut().back_to_select();
            }
            KeyAction::Quit => {
                if let Some((controller, _)) = battle.as_mut() {
                    controller.abandon();
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {}", err);
            print_usage();
            std::process::exit(1);
        }
    };

    match options.mode {
        Mode::Help => {
            print_usage();
            Ok(())
        }
        Mode::ListLyrics => {
            let catalog = load_catalog(&options)?;
            list_lyrics(&catalog);
            Ok(())
        }
        Mode::Simulate(seed) => {
            let config = load_config(&options)?;
            let catalog = load_catalog(&options)?;
            simulate(config, &catalog, seed)
        }
        Mode::Play => {
            if let Some(path) = &options.log {
                init_file_logging(path)?;
            }
            let config = load_config(&options)?;
            let catalog = load_catalog(&options)?;
            if let Err(err) = play(config, &catalog) {
                warn!("Terminal session failed: {:#}", err);
                return Err(err);
            }
            Ok(())
        }
    }
}
