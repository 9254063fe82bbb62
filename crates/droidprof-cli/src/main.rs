//! CLI for droidprof — sample Android device metrics and aggregate
//! experiment runs.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "droidprof")]
#[command(about = "Sample Android device metrics over adb and aggregate experiment runs")]
#[command(version = droidprof_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a device at a fixed interval until Ctrl+C or a duration limit
    Sample {
        /// adb serial of the device to sample
        #[arg(long)]
        serial: String,

        /// App/package under test (needed for per-app memory and GPU memory)
        #[arg(long)]
        app: Option<String>,

        /// Sampling interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Comma-separated data points: cpu, mem, GPU_mem, cpu_clockspeed
        #[arg(long, default_value = "cpu,mem")]
        data_points: String,

        /// Directory the run file is written into
        #[arg(long, default_value = ".")]
        output: String,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Reduce all run files in a directory into its Aggregated.csv
    AggregateSubject {
        /// Directory holding one subject's run files
        #[arg(long)]
        logs_dir: String,
    },

    /// Flatten a whole results tree into one final table
    Aggregate {
        /// Experiment results root (device/subject/[browser]/android layout)
        #[arg(long)]
        data_dir: String,

        /// Path of the flat output table
        #[arg(long)]
        output: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sample {
            serial,
            app,
            interval_ms,
            data_points,
            output,
            duration,
        } => commands::sample::run(&serial, app.as_deref(), interval_ms, &data_points, &output, duration),
        Commands::AggregateSubject { logs_dir } => commands::aggregate::run_subject(&logs_dir),
        Commands::Aggregate { data_dir, output } => commands::aggregate::run_tree(&data_dir, &output),
    }
}
