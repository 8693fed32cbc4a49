//! celestial_viewer — interactive entry point.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use celestial_field::{SceneConfig, EXAMPLE_CONFIG};
use celestial_viewer::app::{run, AppConfig, TrackerKind};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a scene configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Particle quality, 0–100 (overrides the config file)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Fist/open detection sensitivity, 0–100
    #[arg(short, long)]
    sensitivity: Option<u8>,

    /// Gesture smoothing factor in (0, 1]; 0.1 is the tuned speed, higher reacts faster
    #[arg(long)]
    smoothing: Option<f32>,

    /// Seed for every random draw in the scene
    #[arg(long)]
    seed: Option<u64>,

    /// Use the keyboard simulator even when built with LeapMotion support
    #[arg(long)]
    simulate: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Print a commented example configuration and exit
    #[arg(long)]
    example_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.example_config {
        print!("{}", EXAMPLE_CONFIG);
        return Ok(());
    }

    let mut scene = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            match SceneConfig::from_file(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config file: {}. Using defaults.", e);
                    SceneConfig::default()
                }
            }
        }
        None => SceneConfig::default(),
    };

    if let Some(q) = args.quality {
        scene.settings.particle_quality = q;
    }
    if let Some(s) = args.sensitivity {
        scene.settings.detection_sensitivity = s;
    }
    if let Some(s) = args.smoothing {
        scene.settings.gesture_smoothing = s;
    }
    if let Some(seed) = args.seed {
        scene.seed = seed;
    }
    scene.validate().context("invalid scene configuration")?;

    if args.print_config {
        print!("{}", scene.to_yaml()?);
        return Ok(());
    }

    let mut cfg = AppConfig { scene, ..AppConfig::default() };
    if args.simulate {
        cfg.tracker = TrackerKind::Simulated;
    }

    info!("Celestial viewer");
    #[cfg(feature = "leap")]
    info!("Mode: {:?}", cfg.tracker);
    #[cfg(not(feature = "leap"))]
    info!("Mode: keyboard simulation  (use --features leap for hardware)");

    run(cfg)?;
    Ok(())
}
