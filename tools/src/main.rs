//! score-runner: batch risk scoring over a transaction export.
//!
//! Usage:
//!   score-runner --input transactions.csv --out-dir ./data
//!   score-runner --synthetic 20000 --users 2000 --seed 42 --db scores.db
//!   score-runner --input tx.csv --config scoring.json --summary-json

use anyhow::Result;
use riskscore_core::{
    config::ScoringConfig,
    engine::ScoringEngine,
    sink::CsvDirSink,
    source,
    store::ScoreStore,
    summary::RunSummary,
    synth::{self, SynthSpec},
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = string_arg(&args, "--input");
    let out_dir = string_arg(&args, "--out-dir").unwrap_or("./data");
    let db = string_arg(&args, "--db");
    let config_path = string_arg(&args, "--config");
    let synthetic = synthetic_rows(&args)?;
    let users = parse_arg(&args, "--users", 1000usize);
    let seed = parse_arg(&args, "--seed", 42u64);
    let summary_json = args.iter().any(|a| a == "--summary-json");

    let config = match config_path {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };

    let (transactions, run_id) = match (input, synthetic) {
        (Some(path), _) => (source::read_csv(path)?, format!("run-{}", file_stem(path))),
        (None, Some(rows)) => {
            let spec = SynthSpec { seed, users, rows };
            (synth::generate(spec)?, format!("run-synth-{seed}"))
        }
        (None, None) => {
            anyhow::bail!("either --input <csv> or --synthetic <rows> is required");
        }
    };

    log::info!("Scoring {} transactions as {run_id}", transactions.len());
    let run_seed = if input.is_none() { seed } else { 0 };
    let mut engine = ScoringEngine::build(run_id.clone(), config)?.with_seed(run_seed);
    if let Some(db) = db {
        let store = ScoreStore::open(db)?;
        store.migrate()?;
        engine = engine.with_store(store);
    }

    let outcome = engine.run(transactions)?;
    let mut sink = CsvDirSink::new(out_dir)?;
    outcome.write_to(&mut sink)?;

    let summary = RunSummary::from_outcome(&outcome)?;
    if summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `--synthetic <rows>`; a value that is not a row count is an error.
fn synthetic_rows(args: &[String]) -> Result<Option<usize>> {
    string_arg(args, "--synthetic")
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid --synthetic value '{v}': {e}"))
        })
        .transpose()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn file_stem(path: &str) -> &str {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn synthetic_row_count_parses() {
        assert_eq!(synthetic_rows(&args(&["runner", "--synthetic", "500"])).unwrap(), Some(500));
        assert_eq!(synthetic_rows(&args(&["runner"])).unwrap(), None);
    }

    #[test]
    fn bad_synthetic_value_is_reported() {
        let err = synthetic_rows(&args(&["runner", "--synthetic", "lots"])).unwrap_err();
        assert!(err.to_string().contains("invalid --synthetic value 'lots'"), "{err}");
    }
}
