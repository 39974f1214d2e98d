use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use notify::{Notifier, NotifySend};
use synth::{PiperSynth, Synthesizer};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxd::playback::Player;
use voxd::{config, VoiceServer};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Piper executable
    #[arg(long, env = "VOXD_PIPER_BIN", default_value = "piper")]
    piper: PathBuf,

    /// Voice model (.onnx); its sibling .json config supplies the sample rate
    #[arg(long, env = "VOXD_VOICE")]
    voice: PathBuf,

    /// Speech speed multiplier, above 0.0
    #[arg(long, env = "VOXD_SPEED", default_value_t = 1.0)]
    speed: f32,

    /// Portrait image shown on notifications
    #[arg(long, env = "VOXD_PORTRAIT")]
    portrait: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.speed > 0.0, "speed must be above 0.0, got {}", cli.speed);

    let runtime_dir = config::runtime_dir();
    anyhow::ensure!(
        runtime_dir.is_dir(),
        "runtime directory {} is missing",
        runtime_dir.display()
    );

    let synth = PiperSynth::load(&cli.piper, &cli.voice)?;
    let out = Player::spawn(synth.sample_rate())?;
    let board = fx::Board::voice_character();
    let portrait = cli.portrait.unwrap_or_else(config::portrait_path);
    let notifier = Notifier::spawn(NotifySend::new(Some(portrait)));

    let server = VoiceServer::new(synth, board, out, notifier, cli.speed, config::fifo_path());
    let handle = server.shutdown_handle();

    // signal context only wakes these streams; the actual teardown runs on
    // an ordinary task through the shutdown handle
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        info!("termination signal received");
        handle.shutdown();
    });

    server.run().await
}
