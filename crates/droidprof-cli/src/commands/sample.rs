//! `droidprof sample` — record one run of device metrics.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use droidprof_core::{AdbDevice, AndroidProfiler, SamplerConfig};

/// Run the sample command.
pub fn run(
    serial: &str,
    app: Option<&str>,
    interval_ms: u64,
    data_points: &str,
    output: &str,
    duration: Option<u64>,
) {
    let requested: Vec<String> = data_points
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let config = SamplerConfig::new(interval_ms, &requested);
    if config.data_points.is_empty() {
        eprintln!("Error: no valid data points in '{data_points}'");
        std::process::exit(1);
    }

    let output_dir = Path::new(output);
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        eprintln!("Error creating output directory {output}: {e}");
        std::process::exit(1);
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let points: Vec<String> = config.data_points.iter().map(ToString::to_string).collect();
    println!("Sampling device {serial}");
    println!("  Data points: {}", points.join(", "));
    println!("  Interval:    {interval_ms}ms");
    if let Some(d) = duration {
        println!("  Duration:    {d}s");
    } else {
        println!("  Duration:    until Ctrl+C");
    }
    println!("  Output:      {output}");
    println!();

    let device = Arc::new(AdbDevice::new(serial));
    let mut profiler = AndroidProfiler::new(config, output_dir);
    profiler.start_profiling(device, app.map(str::to_string));

    let start = Instant::now();
    let max_duration = duration.map(Duration::from_secs);
    while running.load(Ordering::SeqCst) {
        if let Some(max) = max_duration
            && start.elapsed() >= max
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    profiler.stop_profiling();

    match profiler.collect_results(serial) {
        Ok(path) => println!("Run saved to {}", path.display()),
        Err(e) => {
            eprintln!("Error collecting run: {e}");
            std::process::exit(1);
        }
    }
}
