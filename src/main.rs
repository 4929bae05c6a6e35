//! Flipbook CLI - Play a frame manifest on a headless display.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use flipbook::{
    catalog::write_manifest,
    input::SimulatedCounter,
    playback::{PlaybackController, SystemClock},
    present::{AutoCodec, FramebufferDisplay},
    schema::PlayerConfig,
};

fn print_usage(program: &str) {
    eprintln!("Usage: {} <config.json> <manifest.txt> [cycles] [snapshot.rgb565]", program);
    eprintln!("       {} manifest <frame-dir> [output]", program);
    eprintln!("       {} --example", program);
    eprintln!();
    eprintln!("Play a looping frame sequence from a manifest.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json      Path to playback configuration file");
    eprintln!("  manifest.txt     Frame list, one '<file> [bytes]' per line");
    eprintln!("  cycles           Frames to play (default: play forever)");
    eprintln!("  snapshot.rgb565  Write the final panel contents here");
    eprintln!();
    eprintln!("While playing, type '+' or '-' and Enter to change speed.");
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 2 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() >= 3 && args[1] == "manifest" {
        let dir = PathBuf::from(&args[2]);
        let output = args
            .get(3)
            .map(PathBuf::from)
            .unwrap_or_else(|| dir.join("manifest.txt"));
        match write_manifest(&dir, &output) {
            Ok(count) => println!("Wrote {} frames to {}", count, output.display()),
            Err(e) => {
                eprintln!("Error writing manifest: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if args.len() < 3 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let manifest_path = PathBuf::from(&args[2]);
    let cycles: Option<u64> = args.get(3).and_then(|s| s.parse().ok());
    let snapshot_path = args.get(4).map(PathBuf::from);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: PlayerConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    println!("Flipbook");
    println!("========");
    println!("Canvas: {}x{}", config.logical_width, config.logical_height);
    println!(
        "Interval: {} ms ({}..{} ms, step {} ms)",
        config.initial_interval_ms,
        config.min_interval_ms,
        config.max_interval_ms,
        config.interval_step_ms
    );
    println!("Manifest: {}", manifest_path.display());
    println!();

    let counter = SimulatedCounter::new();
    spawn_keyboard_encoder(counter.clone(), config.counts_per_detent);

    let codec = AutoCodec::from_config(&config);
    let display = FramebufferDisplay::new(config.logical_width, config.logical_height);
    let mut controller = PlaybackController::new(
        config,
        &manifest_path,
        codec,
        display,
        counter,
        SystemClock::new(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let summary = controller.load().unwrap_or_else(|e| {
        eprintln!("Error loading frames: {}", e);
        std::process::exit(1);
    });
    println!(
        "Loaded {} frames ({} bytes) in {:.2}s",
        summary.frames,
        summary.bytes,
        start.elapsed().as_secs_f32()
    );
    if summary.skipped_lines > 0 || summary.failed_frames > 0 {
        println!(
            "  {} manifest lines skipped, {} frames unreadable",
            summary.skipped_lines, summary.failed_frames
        );
    }

    let Some(cycles) = cycles else {
        if let Err(e) = controller.run() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    };

    println!("Playing {} frames...", cycles);
    let start = Instant::now();
    let stats = controller.play(cycles).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!();
    println!("Playback:");
    println!("  Presented: {}", stats.presented);
    println!("  Skipped: {}", stats.skipped);
    println!("  Overruns: {}", stats.overruns);
    println!("  Loops: {}", stats.loops);
    println!(
        "  Final interval: {} ms",
        controller.session().target_interval_ms()
    );
    println!(
        "Time: {:.2}s ({:.1} frames/s)",
        elapsed.as_secs_f32(),
        stats.cycles as f32 / elapsed.as_secs_f32().max(f32::EPSILON)
    );

    if let Some(path) = snapshot_path {
        match controller.display().save_raw(&path) {
            Ok(()) => println!("Saved panel snapshot to {}", path.display()),
            Err(e) => eprintln!("Error saving snapshot: {}", e),
        }
    }
}

/// Turn '+' and '-' on stdin into encoder detents.
fn spawn_keyboard_encoder(counter: SimulatedCounter, counts_per_detent: i16) {
    thread::spawn(move || {
        for byte in io::stdin().lock().bytes() {
            match byte {
                Ok(b'+') => counter.pulse(counts_per_detent),
                Ok(b'-') => counter.pulse(-counts_per_detent),
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

fn print_example_config() {
    let config = PlayerConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
