//! `droidprof aggregate-subject` and `droidprof aggregate`.

use std::path::Path;

use droidprof_core::{AndroidProfiler, aggregate_subject};

/// Reduce one subject directory of run files into its Aggregated.csv.
pub fn run_subject(logs_dir: &str) {
    match aggregate_subject(Path::new(logs_dir)) {
        Ok(path) => println!("Subject aggregate written to {}", path.display()),
        Err(e) => {
            eprintln!("Error aggregating {logs_dir}: {e}");
            std::process::exit(1);
        }
    }
}

/// Flatten a whole results tree into one final table.
pub fn run_tree(data_dir: &str, output: &str) {
    match AndroidProfiler::aggregate_end(Path::new(data_dir), Path::new(output)) {
        Ok(()) => println!("Final table written to {output}"),
        Err(e) => {
            eprintln!("Error aggregating {data_dir}: {e}");
            std::process::exit(1);
        }
    }
}
