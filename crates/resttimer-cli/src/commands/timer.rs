use std::time::Duration;

use clap::{Args, Subcommand};
use resttimer_core::storage::Database;
use resttimer_core::{Config, Event, LifecycleHooks, Preset, RestState, RestTimer};
use tokio::time::MissedTickBehavior;

const ENGINE_KEY: &str = "rest_timer";

#[derive(Args)]
pub struct RestArgs {
    /// Rest duration in seconds
    #[arg(long)]
    target: Option<u32>,
    /// Take the duration from a preset instead
    #[arg(long, conflicts_with = "target")]
    preset: Option<String>,
    /// Exercise the rest follows
    #[arg(long)]
    exercise: Option<String>,
    /// Set number (1-based)
    #[arg(long)]
    set: Option<u32>,
    /// Total number of sets
    #[arg(long)]
    sets: Option<u32>,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a rest; omitted options keep the current session's values
    Start(RestArgs),
    /// Pause the running rest
    Pause,
    /// Resume a paused rest
    Resume,
    /// Reset to idle state
    Reset,
    /// Move on to the next set after a completed rest
    Next,
    /// Select a preset by name (resets the rest)
    Preset {
        name: String,
    },
    /// Change the target by DELTA seconds (resets the rest)
    Adjust {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
        /// Lowest allowed target; defaults to adjust.floor_secs
        #[arg(long)]
        min: Option<u32>,
    },
    /// Print current timer state as JSON
    Status,
    /// Count down in the foreground, printing events as JSON lines
    Run(RestArgs),
}

pub(crate) fn load_engine(db: &Database, config: &Config) -> RestTimer {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        match serde_json::from_str::<RestTimer>(&json) {
            Ok(mut engine) => {
                engine.apply_settings(config.timer_settings());
                return engine;
            }
            Err(e) => tracing::warn!(error = %e, "discarding unreadable timer state"),
        }
    }
    RestTimer::new(config.timer_settings())
}

pub(crate) fn save_engine(
    db: &Database,
    engine: &RestTimer,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

/// Append completed rests to the rest log.
fn record(db: &Database, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        if let Event::RestCompleted { entry, .. } = event {
            tracing::debug!(id = %entry.id, at = %event.at(), "logging completed rest");
            db.record_rest(entry)?;
        }
    }
    Ok(())
}

/// Print events as JSON lines and log completed rests.
fn emit(db: &Database, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    record(db, events)?;
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

/// Reconcile time since the last invocation without printing, then persist.
pub(crate) fn catch_up(
    db: &Database,
    engine: &mut RestTimer,
) -> Result<(), Box<dyn std::error::Error>> {
    let resumed = engine.on_resume();
    record(db, &resumed)?;
    engine.on_suspend();
    save_engine(db, engine)
}

fn start(
    engine: &mut RestTimer,
    config: &Config,
    args: RestArgs,
) -> Result<Option<Event>, Box<dyn std::error::Error>> {
    let session = engine.session();
    let target = match (&args.preset, args.target) {
        (Some(name), _) => {
            let presets = config.presets();
            Preset::find(&presets, name)
                .ok_or_else(|| format!("unknown preset: {name}"))?
                .target_secs
        }
        (None, Some(target)) => target,
        (None, None) => session.target_secs(),
    };
    let exercise = args.exercise.unwrap_or_else(|| {
        if session.exercise_label().is_empty() {
            config.default_exercise.clone()
        } else {
            session.exercise_label().to_string()
        }
    });
    let set = args.set.unwrap_or(session.set_index());
    let sets = args.sets.unwrap_or(session.total_sets()).max(set);
    Ok(engine.start(target, exercise, set, sets))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut engine = load_engine(&db, &config);

    // Time since the previous invocation counts as a background gap.
    let resumed = engine.on_resume();
    emit(&db, &resumed)?;

    let events: Vec<Event> = match action {
        TimerAction::Start(args) => start(&mut engine, &config, args)?.into_iter().collect(),
        TimerAction::Pause => engine.pause().into_iter().collect(),
        TimerAction::Resume => engine.resume().into_iter().collect(),
        TimerAction::Reset => engine.reset().into_iter().collect(),
        TimerAction::Next => engine.next_set().into_iter().collect(),
        TimerAction::Preset { name } => {
            let presets = config.presets();
            let preset = Preset::find(&presets, &name).ok_or_else(|| format!("unknown preset: {name}"))?;
            engine.select_preset(preset).into_iter().collect()
        }
        TimerAction::Adjust { delta, min } => engine
            .adjust_target(delta, min.unwrap_or(config.adjust.floor_secs))
            .into_iter()
            .collect(),
        TimerAction::Status => vec![engine.snapshot()],
        TimerAction::Run(args) => {
            let result = live(&mut engine, &config, &db, args);
            engine.on_suspend();
            save_engine(&db, &engine)?;
            return result;
        }
    };

    if events.is_empty() {
        tracing::info!(state = ?engine.state(), "nothing to do in current state");
        emit(&db, &[engine.snapshot()])?;
    } else {
        emit(&db, &events)?;
    }

    engine.on_suspend();
    save_engine(&db, &engine)?;
    Ok(())
}

/// Drive the rest at 1 Hz until it completes or Ctrl-C pauses it.
fn live(
    engine: &mut RestTimer,
    config: &Config,
    db: &Database,
    args: RestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    match engine.state() {
        RestState::Paused => emit(db, &engine.resume().into_iter().collect::<Vec<_>>())?,
        RestState::Running => {}
        RestState::Completed if engine.session().is_last_set() => {
            emit(db, &[engine.snapshot()])?;
            return Ok(());
        }
        RestState::Completed => {
            let advanced: Vec<Event> = engine.next_set().into_iter().collect();
            emit(db, &advanced)?;
            let started: Vec<Event> = start(engine, config, args)?.into_iter().collect();
            emit(db, &started)?;
        }
        RestState::Idle => {
            let started: Vec<Event> = start(engine, config, args)?.into_iter().collect();
            emit(db, &started)?;
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut last = chrono::Utc::now();

        while engine.state() == RestState::Running {
            tokio::select! {
                _ = interval.tick() => {
                    let now = chrono::Utc::now();
                    // A stalled process (e.g. system sleep) skips ticks; count the gap instead.
                    let events = if now - last >= chrono::Duration::seconds(2) {
                        engine.reconcile_background_gap(last, now)
                    } else {
                        engine.tick()
                    };
                    last = now;
                    emit(db, &events)?;
                }
                _ = &mut ctrl_c => {
                    let paused: Vec<Event> = engine.pause().into_iter().collect();
                    emit(db, &paused)?;
                    break;
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
