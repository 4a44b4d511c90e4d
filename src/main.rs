//! picolog CLI: load a clause file and prove `main`.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::info;

use picolog::Engine;

fn print_usage() {
    eprintln!("picolog - prove `main` in a clause file");
    eprintln!();
    eprintln!("Usage: picolog <file>");
    eprintln!();
    eprintln!("Exits 0 if main succeeds, 1 if it fails, 2 on errors.");
    eprintln!("Set RUST_LOG=debug or RUST_LOG=trace to follow resolution.");
}

fn run(path: &Path) -> Result<bool> {
    let source = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut engine = Engine::new();
    let clauses = engine
        .load(&source)
        .with_context(|| format!("cannot load {}", path.display()))?;
    info!("loaded {clauses} clause(s) from {}", path.display());

    let proved = engine.execute_main();
    let stats = engine.stats();
    info!(
        "main {}: {} call(s), {} clause trial(s), {} backtrack(s), {} binding(s)",
        if proved { "succeeded" } else { "failed" },
        stats.calls,
        stats.clause_trials,
        stats.backtracks,
        stats.bindings,
    );
    Ok(proved)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let [path] = args.as_slice() else {
        print_usage();
        return ExitCode::from(2);
    };

    match run(Path::new(path)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
