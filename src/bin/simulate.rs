use chrono::{SecondsFormat, Utc};
use clap::Parser;
use maze_chase_core::collision::overlaps_wall;
use maze_chase_core::config::GameConfig;
use maze_chase_core::constants::tick_interval_ms;
use maze_chase_core::engine::{next_step_to_food, GameEngine};
use maze_chase_core::error::ConfigError;
use maze_chase_core::movement::Moveable;
use maze_chase_core::types::{Direction, GamePhase, RuntimeEvent, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Ticks between scripted turns when the autopilot is off.
const DRIFT_TURN_TICKS: u64 = 40;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Upper bound on ticks per scenario.
    #[arg(long, default_value_t = 20_000)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    lives: Option<u32>,
    /// Run one scenario with the food-seeking autopilot.
    #[arg(long)]
    autopilot: bool,
    /// Run one scenario with the scripted player.
    #[arg(long)]
    single: bool,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    autopilot: bool,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    autopilot: bool,
    outcome: GamePhase,
    ticks: u64,
    score: u32,
    #[serde(rename = "maxScore")]
    max_score: u32,
    #[serde(rename = "livesRemaining")]
    lives_remaining: u32,
    #[serde(rename = "foodEaten")]
    food_eaten: u32,
    captures: u32,
    alerts: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "generatedAt")]
    generated_at: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let base_config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid configuration");
            std::process::exit(2);
        }
    };
    let scenarios = resolve_scenarios(&cli, base_config.seed);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            autopilot = scenario.autopilot,
            "scenario started"
        );
        let config = GameConfig {
            seed: scenario.seed,
            ..base_config.clone()
        };
        let scenario_run = match run_scenario(&scenario, config, cli.ticks) {
            Ok(run) => run,
            Err(error) => {
                error!(scenario = %scenario.name, %error, "scenario could not start");
                std::process::exit(2);
            }
        };
        for anomaly in &scenario_run.anomaly_records {
            warn!(
                match_id = %match_id,
                scenario = %scenario.name,
                tick = anomaly.tick,
                message = %anomaly.message,
                "anomaly detected"
            );
        }
        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            outcome = ?scenario_run.result.outcome,
            ticks = scenario_run.result.ticks,
            score = scenario_run.result.score,
            "scenario finished"
        );
        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => error!(%error, "scenario result could not be serialized"),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            error!(
                match_id = %match_id,
                path = %path.to_string_lossy(),
                %error,
                "summary write failed"
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    info!(
        match_id = %match_id,
        scenarios = summary.scenario_count,
        anomalies = summary.anomaly_count,
        average_ticks = summary.average_ticks,
        summary_out = ?summary_out_written,
        "run finished"
    );
    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> Result<GameConfig, ConfigError> {
    let mut config = GameConfig::load(cli.config.as_deref())?;
    if let Some(lives) = cli.lives {
        config.initial_lives = lives;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_scenarios(cli: &Cli, config_seed: u32) -> Vec<Scenario> {
    let seed = cli.seed.map(normalize_seed).unwrap_or(config_seed);
    if cli.single || cli.autopilot {
        return vec![Scenario {
            name: if cli.autopilot {
                "custom-autopilot".to_string()
            } else {
                "custom-drift".to_string()
            },
            seed,
            autopilot: cli.autopilot,
        }];
    }

    vec![
        Scenario {
            name: "autopilot-check".to_string(),
            seed,
            autopilot: true,
        },
        Scenario {
            name: "drift-check".to_string(),
            seed: seed.wrapping_add(1),
            autopilot: false,
        },
    ]
}

/// Plays one headless game on a simulated clock, one frame per tick
/// interval, until it ends or `max_ticks` ticks have been applied.
fn run_scenario(
    scenario: &Scenario,
    config: GameConfig,
    max_ticks: u64,
) -> Result<ScenarioRunResult, ConfigError> {
    let frame_ms = tick_interval_ms(config.tick_rate).floor() as u64 + 1;
    let mut engine = GameEngine::new(config, 0)?;
    let mut now_ms = 0u64;

    let mut food_eaten = 0;
    let mut captures = 0;
    let mut alerts = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    while !engine.phase().is_terminal() && engine.tick_count() < max_ticks {
        let dir = if scenario.autopilot {
            next_step_to_food(engine.map(), engine.player().grid_cell())
        } else {
            Some(Direction::ALL[((engine.tick_count() / DRIFT_TURN_TICKS) % 4) as usize])
        };
        if let Some(dir) = dir {
            engine.set_next_direction(dir);
        }

        now_ms += frame_ms;
        if !engine.on_frame(now_ms) {
            continue;
        }
        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(&engine, &snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        for event in &snapshot.events {
            match event {
                RuntimeEvent::FoodEaten { .. } => food_eaten += 1,
                RuntimeEvent::PlayerCaptured { .. } => captures += 1,
                RuntimeEvent::PursuerAlerted { .. } => alerts += 1,
                _ => {}
            }
        }
    }

    if food_eaten != engine.score() {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            engine.tick_count(),
            format!(
                "score {} does not match {} food events",
                engine.score(),
                food_eaten
            ),
        );
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            autopilot: scenario.autopilot,
            outcome: engine.phase(),
            ticks: engine.tick_count(),
            score: engine.score(),
            max_score: engine.max_score(),
            lives_remaining: engine.lives_remaining(),
            food_eaten,
            captures,
            alerts,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(engine: &GameEngine, snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score > snapshot.max_score {
        anomalies.push(format!(
            "score above maximum: {}/{}",
            snapshot.score, snapshot.max_score
        ));
    }
    if snapshot.lives_remaining > engine.config().initial_lives {
        anomalies.push(format!("lives increased: {}", snapshot.lives_remaining));
    }
    let remaining = engine.map().remaining_food() as u32;
    if remaining + snapshot.score != snapshot.max_score {
        anomalies.push(format!(
            "food accounting broken: {remaining} left, {} eaten",
            snapshot.score
        ));
    }
    if engine.player().overlaps_wall(engine.map()) {
        anomalies.push("player inside a wall".to_string());
    }
    for pursuer in engine.pursuers() {
        let body = &pursuer.body;
        if overlaps_wall(
            engine.map(),
            body.position.x,
            body.position.y,
            body.width,
            body.height,
        ) {
            anomalies.push(format!("pursuer {} inside a wall", pursuer.id));
        }
    }
    anomalies
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_ticks,
        outcome_counts,
        scenarios,
    }
}

fn outcome_key(phase: GamePhase) -> String {
    match phase {
        GamePhase::Running => "unfinished",
        GamePhase::Lost => "lost",
        GamePhase::Won => "won",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(outcome: GamePhase, ticks: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            autopilot: true,
            outcome,
            ticks,
            score: 10,
            max_score: 212,
            lives_remaining: 0,
            food_eaten: 10,
            captures: 3,
            alerts: 5,
            anomalies: Vec::new(),
        }
    }

    fn scenario(autopilot: bool) -> Scenario {
        Scenario {
            name: "test".to_string(),
            seed: 7,
            autopilot,
        }
    }

    #[test]
    fn same_seed_produces_same_result() {
        let a = run_scenario(&scenario(true), GameConfig::default(), 2_000).expect("runs");
        let b = run_scenario(&scenario(true), GameConfig::default(), 2_000).expect("runs");
        assert_eq!(a.result.ticks, b.result.ticks);
        assert_eq!(a.result.score, b.result.score);
        assert_eq!(a.result.captures, b.result.captures);
        assert_eq!(a.result.outcome, b.result.outcome);
    }

    #[test]
    fn autopilot_collects_food_without_anomalies() {
        let run = run_scenario(&scenario(true), GameConfig::default(), 300).expect("runs");
        assert!(run.result.score > 0);
        assert_eq!(run.result.food_eaten, run.result.score);
        assert_eq!(run.result.anomalies, Vec::<String>::new());
    }

    #[test]
    fn tick_budget_caps_the_scenario() {
        let run = run_scenario(&scenario(false), GameConfig::default(), 50).expect("runs");
        assert!(run.result.ticks <= 50);
        if run.result.outcome == GamePhase::Running {
            assert_eq!(run.result.ticks, 50);
        }
    }

    #[test]
    fn cli_seed_overrides_config_seed() {
        let cli = Cli::parse_from(["simulate", "--seed", "99", "--autopilot"]);
        let scenarios = resolve_scenarios(&cli, 5);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].seed, 99);
        assert!(scenarios[0].autopilot);

        let cli = Cli::parse_from(["simulate"]);
        let scenarios = resolve_scenarios(&cli, 5);
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[1].seed, 6);
    }

    #[test]
    fn build_run_summary_uses_average_ticks() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(GamePhase::Lost, 600),
                make_scenario_result(GamePhase::Won, 900),
            ],
            BTreeMap::from([("lost".to_string(), 1usize), ("won".to_string(), 1usize)]),
            1,
            1_500,
        );
        assert_eq!(summary.average_ticks, 750);
        assert_eq!(summary.scenario_count, 2);
        assert!(summary.generated_at.ends_with('Z'));
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(GamePhase::Lost, 60)],
            BTreeMap::from([("lost".to_string(), 1usize)]),
            0,
            60,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }
}
