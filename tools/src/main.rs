//! life-runner: headless driver for the life simulation.
//!
//! Usage:
//!   life-runner --seed 12345 --years 80 --db life.db
//!   life-runner --seed 12345 --data-dir ./content --config sim.json
//!   life-runner --seed 12345 --ipc-mode

use anyhow::Result;
use lifesim_core::{
    command::PlayerCommand,
    config::SimConfig,
    content::ContentPack,
    engine::{CharacterSpec, LifeEngine},
    rng::{RandomSource, SubsystemRng},
    stats::{Skill, Stat},
    store::SimStore,
    subsystem::ActionResult,
    turn::TurnReport,
    types::Age,
};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Slot index for the runner's own choice-picking stream, outside the
/// engine's slots.
const AUTOPILOT_STREAM: u64 = 0xA070;

#[derive(serde::Serialize)]
struct UiChoice<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(serde::Serialize)]
struct UiEvent<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    choices: Vec<UiChoice<'a>>,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    name: &'a str,
    age: Age,
    life_stage: &'static str,
    stats: BTreeMap<&'static str, i64>,
    skills: BTreeMap<&'static str, i64>,
    job: Option<&'a str>,
    in_prison: bool,
    crime_rank: String,
    achievements: &'a [String],
    pending: Option<UiEvent<'a>>,
    narrative: &'a [String],
    game_over: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let years = parse_arg(&args, "--years", 120u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir");
    let config = match flag_value(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if !ipc_mode {
        println!("life-runner");
        println!("  seed:      {seed}");
        println!("  years:     {years}");
        println!("  db:        {db}");
        println!("  data_dir:  {}", data_dir.unwrap_or("(builtin)"));
        println!();
    }

    let content = match data_dir {
        Some(dir) => ContentPack::load(Path::new(dir), config.strict_content)?,
        None => ContentPack::builtin(config.strict_content)?,
    };
    let store = SimStore::open(db)?;
    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    let spec = CharacterSpec {
        name: flag_value(&args, "--name").map(str::to_string),
        gender: None,
        birth_year: parse_arg(&args, "--birth-year", 2000i32),
    };
    let mut engine = LifeEngine::new(run_id, seed, store, content, config, spec)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        run_batch(&mut engine, seed, years)?;
        print_summary(&engine);
    }
    engine.close()?;
    Ok(())
}

/// Age until death or the year limit, answering every event at random.
fn run_batch(engine: &mut LifeEngine, seed: u64, years: u32) -> Result<()> {
    let mut autopilot = SubsystemRng::new(seed, AUTOPILOT_STREAM);
    for _ in 0..years {
        let report = engine.age_up()?;
        print_turn(&report);
        if report.game_over() {
            break;
        }
        let choice_id = engine.pending_event().and_then(|event| {
            if event.choices.is_empty() {
                return None;
            }
            let pick = autopilot.pick_index(event.choices.len());
            Some(event.choices[pick].id.clone())
        });
        if let Some(choice_id) = choice_id {
            let resolved = engine.choose(&choice_id)?;
            if let Ok(outcome) = resolved.outcome {
                for line in outcome.log.narrative {
                    println!("         {line}");
                }
            }
        }
    }
    Ok(())
}

fn run_ipc_loop(engine: &mut LifeEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: PlayerCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let narrative = match cmd {
            PlayerCommand::Quit => break,
            PlayerCommand::GetState => Vec::new(),
            PlayerCommand::AgeUp => engine.age_up()?.narrative,
            PlayerCommand::Choose { choice_id } => match engine.choose(&choice_id) {
                Ok(report) => match report.outcome {
                    Ok(outcome) => outcome.log.narrative,
                    Err(e) => vec![e.to_string()],
                },
                Err(e) => vec![e.to_string()],
            },
            PlayerCommand::Act { action } => match engine.perform(action) {
                Ok(ActionResult::Applied(log)) => log.narrative,
                Ok(ActionResult::Rejected { reason }) => vec![reason],
                Err(e) => vec![e.to_string()],
            },
        };
        let state = build_ui_state(engine, &narrative);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state<'a>(engine: &'a LifeEngine, narrative: &'a [String]) -> UiState<'a> {
    let c = engine.character();
    let pending = engine.pending_event().map(|event| UiEvent {
        id: &event.id,
        title: &event.title,
        description: &event.description,
        choices: event.choices.iter().map(|ch| UiChoice { id: &ch.id, text: &ch.text }).collect(),
    });
    UiState {
        name: &c.name,
        age: c.age(),
        life_stage: c.life_stage().label(),
        stats: Stat::ALL.iter().map(|&s| (s.name(), c.stat(s))).collect(),
        skills: Skill::ALL.iter().map(|&s| (s.name(), c.skill(s))).collect(),
        job: c.career.employment().map(|job| job.title.as_str()),
        in_prison: c.is_in_prison(),
        crime_rank: c.crime.rank.to_string(),
        achievements: &c.achievements,
        pending,
        narrative,
        game_over: c.game_over.as_ref().map(|g| g.cause.to_string()),
    }
}

fn print_turn(report: &TurnReport) {
    for line in &report.narrative {
        println!("  age {:>3}  {line}", report.age);
    }
}

fn print_summary(engine: &LifeEngine) {
    let c = engine.character();
    println!();
    println!("=== LIFE SUMMARY ===");
    println!("  name:           {}", c.name);
    println!("  final age:      {}", c.age());
    for stat in Stat::ALL {
        println!("  {:<15} {}", format!("{}:", stat.name()), c.stat(stat));
    }
    println!("  job:            {}", c.career.employment().map(|j| j.title.as_str()).unwrap_or("none"));
    println!("  crime rank:     {}", c.crime.rank);
    println!("  prison terms:   {}", c.prison.times_incarcerated);
    println!("  achievements:   {}", c.achievements.join(", "));
    match &c.game_over {
        Some(end) => println!("  died at {} from {}", end.age, end.cause),
        None => println!("  still alive"),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
