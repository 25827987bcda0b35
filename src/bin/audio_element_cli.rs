use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use audio_element::config::AppConfig;
use audio_element::diagnostics;
use audio_element::managers::SoundManager;
use audio_element::playback::{
    list_output_devices, CpalElement, ElementProps, MediaSource, PcmClip, PlaybackController,
    TokioLocalSpawner,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "audio_element_cli",
    about = "Play sounds through the audio element controller"
)]
struct Cli {
    /// Config file (defaults to assets/audio_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List output devices usable as sink ids
    Devices,
    /// Play a WAV file, optionally on a specific output device
    Play {
        #[arg(long)]
        file: PathBuf,
        /// Output device name; falls back to playback.default_sink_id
        #[arg(long)]
        device: Option<String>,
        #[arg(long = "loop")]
        loop_playback: bool,
        /// Stop after this many seconds (defaults to the clip length)
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// Check that every configured sound decodes
    Sounds,
}

fn main() -> ExitCode {
    audio_element::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Devices => run_devices(),
        Commands::Play {
            file,
            device,
            loop_playback,
            seconds,
        } => run_play(&config, file, device, loop_playback, seconds),
        Commands::Sounds => run_sounds(&config),
    }
}

fn run_devices() -> Result<ExitCode> {
    let devices = list_output_devices().context("enumerating output devices")?;
    if devices.is_empty() {
        println!("No output devices found");
    }
    for name in devices {
        println!("{name}");
    }
    Ok(ExitCode::from(0))
}

fn run_play(
    config: &AppConfig,
    file: PathBuf,
    device: Option<String>,
    loop_playback: bool,
    seconds: Option<f64>,
) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building playback runtime")?;
    let local = Rc::new(tokio::task::LocalSet::new());
    let spawner = TokioLocalSpawner::new(Rc::clone(&local));

    let props = ElementProps::new(file).looping(loop_playback);
    let sink_id = device.or_else(|| config.playback.default_sink_id.clone());
    local.block_on(&runtime, play_clip(props, spawner, sink_id, seconds))?;
    // Let pending sink completions report before the snapshot.
    match Rc::try_unwrap(local) {
        Ok(local) => runtime.block_on(local),
        Err(_) => tracing::warn!("[cli] local set still shared; skipping drain"),
    }

    let snapshot = diagnostics::hub().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(if snapshot.total_entries == 0 {
        ExitCode::from(0)
    } else {
        ExitCode::from(2)
    })
}

async fn play_clip(
    props: ElementProps,
    spawner: TokioLocalSpawner,
    sink_id: Option<String>,
    seconds: Option<f64>,
) -> Result<()> {
    let mut controller = PlaybackController::new(props.clone(), Rc::new(spawner))
        .with_element_change(|current| {
            tracing::info!(backed = current.is_some(), "[cli] element changed");
        });

    let element = CpalElement::open(&props)
        .with_context(|| format!("opening {}", props.src.describe()))?;
    let duration = element.duration();
    controller.attach(Box::new(element));

    if let Some(sink_id) = sink_id {
        controller.set_sink_id(&sink_id);
        tokio::task::yield_now().await;
    }

    controller.play();
    let play_for = seconds.unwrap_or(duration).max(0.0);
    tokio::time::sleep(Duration::from_secs_f64(play_for)).await;

    tracing::info!(
        position = ?controller.current_time(),
        "[cli] stopping playback"
    );
    controller.stop();
    controller.detach();
    Ok(())
}

fn run_sounds(config: &AppConfig) -> Result<ExitCode> {
    let pool = futures::executor::LocalPool::new();
    let sounds = SoundManager::from_config(config, Rc::new(pool.spawner()));
    if sounds.sound_ids().is_empty() {
        println!("No sounds configured");
        return Ok(ExitCode::from(0));
    }

    let mut failures = 0;
    for id in sounds.sound_ids() {
        let Some(props) = sounds.props(id) else {
            continue;
        };
        match PcmClip::load(&props.src) {
            Ok(clip) => println!(
                "{id}: {:.2}s, {} ch @ {} Hz{}",
                clip.duration_secs(),
                clip.channels,
                clip.sample_rate,
                if props.loop_playback { " (loop)" } else { "" }
            ),
            Err(err) if matches!(props.src, MediaSource::Url(_)) => {
                println!("{id}: remote source, skipped ({})", err)
            }
            Err(err) => {
                failures += 1;
                println!("{id}: FAILED {}", err);
            }
        }
    }

    Ok(ExitCode::from(if failures == 0 { 0 } else { 2 }))
}
