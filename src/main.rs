//! foodsnap command-line interface.
//!
//! The real pipeline is driven by a host application; this binary exercises
//! it end to end against the synthetic camera backend with a scripted
//! classifier, which is enough to watch the debounce-and-capture behavior
//! without hardware or a model.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use foodsnap::classify::{Classification, ScriptedClassifier};
use foodsnap::config::Config;
use foodsnap::detect::FOOD_KEYWORDS;
use foodsnap::session::{CameraSession, CaptureEvent, SyntheticBackend};

/// Parse and validate a confidence threshold (0.0-1.0)
fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            value
        ));
    }
    Ok(value)
}

/// Parse and validate a consecutive-hit count (at least 1)
fn parse_hits(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("Required hits must be at least 1".to_string());
    }
    Ok(value)
}

#[derive(Parser)]
#[command(
    name = "foodsnap",
    about = "Live food-capture pipeline (synthetic demo driver)",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture pipeline against the synthetic camera
    Simulate {
        /// TOML script of per-frame classifier results
        #[arg(long)]
        script: Option<PathBuf>,

        /// Config file path (default: ~/.config/foodsnap/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable auto-capture and fire one manual capture instead
        #[arg(long)]
        no_auto: bool,

        /// Where to write the captured photo bytes
        #[arg(long, default_value = "foodsnap-capture.bin")]
        output: PathBuf,

        /// Give up after this many seconds without a capture
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Override the detection confidence threshold
        #[arg(long, value_parser = parse_confidence)]
        min_confidence: Option<f32>,

        /// Override the consecutive-hit count required to arm
        #[arg(long, value_parser = parse_hits)]
        required_hits: Option<u32>,
    },
    /// Print the keyword list the detector matches against
    Keywords,
}

/// Per-frame classifier script, one `[[frames]]` entry per frame.
#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default)]
    frames: Vec<ScriptFrame>,
}

#[derive(Debug, Deserialize)]
struct ScriptFrame {
    label: String,
    confidence: f32,
}

fn load_script(path: &Path) -> Result<Vec<Vec<Classification>>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let script: ScriptFile = toml::from_str(&content)?;
    Ok(script
        .frames
        .into_iter()
        .map(|f| vec![Classification::new(f.label, f.confidence)])
        .collect())
}

/// Fallback script: a little noise, then a stable plate of food.
fn default_script() -> Vec<Vec<Classification>> {
    let mut frames = vec![
        vec![Classification::new("table", 0.8)],
        vec![Classification::new("cutlery", 0.6)],
        vec![Classification::new("plate", 0.4)],
    ];
    for _ in 0..4 {
        frames.push(vec![
            Classification::new("plate of pasta", 0.91),
            Classification::new("table", 0.55),
        ]);
    }
    frames
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    script: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_auto: bool,
    output: PathBuf,
    timeout_secs: u64,
    min_confidence: Option<f32>,
    required_hits: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path.as_deref())?;

    let mut detector_settings = config.detector_settings();
    if let Some(value) = min_confidence {
        detector_settings.min_confidence = value;
    }
    if let Some(value) = required_hits {
        detector_settings.required_hits = value;
    }

    let mut session_settings = config.session_settings()?;
    if no_auto {
        session_settings.auto_capture = false;
    }

    let frames = match &script {
        Some(path) => load_script(path)?,
        None => default_script(),
    };
    log::info!("simulating {} scripted frames", frames.len());

    let mut session = CameraSession::new(
        Box::new(SyntheticBackend::default()),
        Box::new(ScriptedClassifier::new(frames)),
        session_settings,
        detector_settings,
    );

    session.configure()?;
    let events = session
        .take_events()
        .ok_or("capture event channel already taken")?;
    let monitor = session.monitor();
    session.start()?;

    setup_ctrlc_handler()?;

    if no_auto {
        // Let the stream spin up, then trigger the manual path once.
        std::thread::sleep(Duration::from_millis(200));
        session.capture_photo()?;
    }

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    let outcome = loop {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(CaptureEvent::Photo(photo)) => break Some(photo),
            Ok(CaptureEvent::Failed(err)) => {
                session.stop();
                return Err(err.into());
            }
            Err(RecvTimeoutError::Timeout) => {
                log::debug!(
                    "waiting: food={} confidence={:.2}",
                    monitor.is_food_detected(),
                    monitor.detection_confidence()
                );
                if INTERRUPTED.load(Ordering::SeqCst) || Instant::now() >= deadline {
                    break None;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break None,
        }
    };

    session.stop();

    match outcome {
        Some(photo) => {
            std::fs::write(&output, &photo.bytes)?;
            println!(
                "Captured {} bytes -> {}",
                photo.bytes.len(),
                output.display()
            );
            Ok(())
        }
        None => Err("no photo captured before timeout".into()),
    }
}

fn run_keywords() {
    for keyword in FOOD_KEYWORDS {
        println!("{}", keyword);
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            script,
            config,
            no_auto,
            output,
            timeout_secs,
            min_confidence,
            required_hits,
        } => run_simulate(
            script,
            config,
            no_auto,
            output,
            timeout_secs,
            min_confidence,
            required_hits,
        ),
        Commands::Keywords => {
            run_keywords();
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
