//! Sound manager demo
//!
//! Loads a JSON sound configuration, plays the named slots and drives the
//! manager at 60 Hz until the run time is over.
//!
//! ```text
//! sound-manager-demo <config.json> <clip-dir> [seconds] [sound...]
//! ```
//!
//! Set `SOUND_MANAGER_LOG_DIR` to also write a daily rotating log file.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use sound_manager::audio_system::{AudioBackend, AudioManager, RodioBackend, VoiceSettings};
use sound_manager::config::AudioConfig;

const TICK: Duration = Duration::from_micros(16_667);
const LOG_FILE_PREFIX: &str = "sound-manager.log";

/// Console logging, plus a file layer when a log directory is configured.
///
/// The returned guard must outlive the program so buffered lines are flushed.
fn initialize_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    match std::env::var_os("SOUND_MANAGER_LOG_DIR").map(PathBuf::from) {
        Some(log_dir) => {
            let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .init();
            tracing::info!("Log directory: {}", log_dir.display());
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(console_layer).init();
            None
        }
    }
}

struct Args {
    config: PathBuf,
    clip_dir: PathBuf,
    seconds: f32,
    sounds: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let (Some(config), Some(clip_dir)) = (args.next(), args.next()) else {
        bail!("usage: sound-manager-demo <config.json> <clip-dir> [seconds] [sound...]");
    };

    let seconds = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid run time: {}", s))?,
        None => 5.0,
    };

    Ok(Args {
        config: PathBuf::from(config),
        clip_dir: PathBuf::from(clip_dir),
        seconds,
        sounds: args.collect(),
    })
}

fn main() -> Result<()> {
    let _log_guard = initialize_tracing();
    let args = parse_args()?;

    let config = AudioConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let mut backend = RodioBackend::new(&args.clip_dir).context("opening audio output")?;
    let mut manager = AudioManager::new(&config, &mut backend).context("building sound slots")?;

    let sounds = if args.sounds.is_empty() {
        manager.slot_names().map(str::to_string).collect()
    } else {
        args.sounds
    };

    for name in &sounds {
        match manager.play(name) {
            Ok(Some(variant)) => tracing::info!("Playing {} (variant {})", name, variant),
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not play {}: {}", name, e),
        }
    }

    // Looping slots are also exercised through the music channel
    if let Some(definition) = config.sounds.iter().find(|s| s.looping) {
        let clip = backend.load_clip(&definition.clips[0])?;
        let settings = VoiceSettings {
            looping: true,
            ..VoiceSettings::default()
        };
        let voice = manager.register_voice(backend.create_voice(&clip, &settings)?);
        manager.play_looping_music(voice, definition.volume, 1.0, true)?;
        tracing::info!("Looping {} as music", clip.id());
    }

    let started = Instant::now();
    let mut last = started;
    while started.elapsed().as_secs_f32() < args.seconds {
        thread::sleep(TICK);
        let now = Instant::now();
        manager.update(now.duration_since(last).as_secs_f32());
        last = now;
    }

    tracing::info!("Fading out");
    manager.stop_all_slots();
    manager.stop_all();
    let fade_end = Instant::now() + Duration::from_secs(2);
    while Instant::now() < fade_end {
        thread::sleep(TICK);
        let now = Instant::now();
        manager.update(now.duration_since(last).as_secs_f32());
        last = now;
    }

    tracing::info!("{:?}", manager);
    Ok(())
}
