use clap::Subcommand;
use resttimer_core::storage::Database;
use resttimer_core::Config;

use super::timer::{catch_up, load_engine, save_engine};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Recent rests kept by the timer (newest first)
    List {
        /// Read the full rest log instead of the timer's bounded history
        #[arg(long)]
        all: bool,
        /// Maximum number of entries with --all
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Forget the timer's recent rests (the rest log is kept)
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        HistoryAction::List { all: true, limit } => {
            let mut engine = load_engine(&db, &config);
            catch_up(&db, &mut engine)?;
            let entries = db.recent_rests(limit)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        HistoryAction::List { all: false, .. } => {
            let mut engine = load_engine(&db, &config);
            catch_up(&db, &mut engine)?;
            let entries: Vec<_> = engine.history().iter().collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        HistoryAction::Clear => {
            let mut engine = load_engine(&db, &config);
            engine.clear_history();
            save_engine(&db, &engine)?;
            println!("history cleared");
        }
    }
    Ok(())
}
