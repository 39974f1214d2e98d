use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fx::Effect;
use notify::Notifier;
use synth::Synthesizer;
use tokio::net::unix::pipe;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::listener::LineAssembler;
use crate::pipeline::{self, AudioCommand, TextCommand};
use crate::playback::AudioOut;

/// Bytes pulled per FIFO read.
const READ_SIZE: usize = 1024;

/// Raises the pipeline's termination sentinels and wakes the run loop.
///
/// Cloneable and callable from any task, concurrently with normal traffic.
/// Only the first call has any effect, so each queue receives exactly one
/// sentinel no matter how often shutdown is requested.
#[derive(Clone)]
pub struct ShutdownHandle {
    texts: mpsc::UnboundedSender<TextCommand>,
    audio: mpsc::UnboundedSender<AudioCommand>,
    wake: Arc<watch::Sender<bool>>,
    fired: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        // audio sentinel first: a synthesis stage caught mid-utterance can
        // then forward its own termination without playback having to drain
        // anything extra on its behalf
        let _ = self.audio.send(AudioCommand::Stop);
        let _ = self.texts.send(TextCommand::Stop);
        let _ = self.wake.send(true);
    }
}

/// Wires the FIFO listener, the two blocking pipeline workers and the
/// notifier together, and tears them down in order on shutdown.
pub struct VoiceServer<S, E, A> {
    synth: S,
    board: E,
    out: A,
    notifier: Notifier,
    speed: f32,
    fifo: PathBuf,
    handle: ShutdownHandle,
    texts_rx: mpsc::UnboundedReceiver<TextCommand>,
    audio_rx: mpsc::UnboundedReceiver<AudioCommand>,
    wake_rx: watch::Receiver<bool>,
}

impl<S, E, A> VoiceServer<S, E, A>
where
    S: Synthesizer + 'static,
    E: Effect + 'static,
    A: AudioOut + 'static,
{
    pub fn new(synth: S, board: E, out: A, notifier: Notifier, speed: f32, fifo: PathBuf) -> Self {
        let (texts_tx, texts_rx) = mpsc::unbounded_channel();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (wake_tx, wake_rx) = watch::channel(false);
        let handle = ShutdownHandle {
            texts: texts_tx,
            audio: audio_tx,
            wake: Arc::new(wake_tx),
            fired: Arc::new(AtomicBool::new(false)),
        };
        Self {
            synth,
            board,
            out,
            notifier,
            speed,
            fifo,
            handle,
            texts_rx,
            audio_rx,
            wake_rx,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// Run until shutdown. Joins every worker before returning; after this,
    /// no further audio or notification side effects occur.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            synth,
            board,
            out,
            notifier,
            speed,
            fifo,
            handle,
            texts_rx,
            audio_rx,
            mut wake_rx,
        } = self;

        ensure_fifo(&fifo)?;
        let reader = pipe::OpenOptions::new().open_receiver(&fifo)?;
        // writer-side handle on our own FIFO: without it the FIFO would hit
        // "all writers closed" whenever the last client disconnects and the
        // read side would report readiness forever
        let keep_alive = pipe::OpenOptions::new().open_sender(&fifo)?;

        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<&'static str>();

        let synth_worker = {
            let exit = exit_tx.clone();
            let audio = handle.audio.clone();
            let notify = notifier.handle();
            tokio::task::spawn_blocking(move || {
                pipeline::synthesis_stage(synth, board, speed, texts_rx, audio, notify);
                let _ = exit.send("synthesis");
            })
        };
        let play_worker = {
            let exit = exit_tx.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = pipeline::playback_stage(out, audio_rx) {
                    error!(?e, "playback stage failed");
                }
                let _ = exit.send("playback");
            })
        };
        drop(exit_tx);

        info!(fifo = %fifo.display(), "listening for utterances");
        let mut assembler = LineAssembler::new();
        let mut buf = [0u8; READ_SIZE];
        let texts = handle.texts.clone();
        loop {
            tokio::select! {
                // shutdown readiness wins over pending conduit data
                biased;
                changed = wake_rx.changed() => {
                    if changed.is_err() || *wake_rx.borrow() {
                        break;
                    }
                }
                Some(stage) = exit_rx.recv() => {
                    // a worker stopping before shutdown was requested takes
                    // the rest of the pipeline down with it
                    if !handle.fired.load(Ordering::SeqCst) {
                        warn!(stage, "stage exited unexpectedly, shutting down");
                        handle.shutdown();
                    }
                }
                ready = reader.readable() => {
                    if let Err(e) = ready {
                        error!(?e, "fifo poll failed");
                        handle.shutdown();
                        continue;
                    }
                    match reader.try_read(&mut buf) {
                        Ok(0) => {}
                        Ok(n) if handle.fired.load(Ordering::SeqCst) => {
                            // shutdown already raised: the sentinel stays the
                            // last item the text queue ever carries
                            debug!(bytes = n, "discarding input read during shutdown");
                        }
                        Ok(n) => {
                            for line in assembler.feed(&buf[..n]) {
                                debug!(%line, "utterance received");
                                let _ = texts.send(TextCommand::Speak(line));
                            }
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
                        Err(e) => {
                            error!(?e, "fifo read failed");
                            handle.shutdown();
                        }
                    }
                }
            }
        }

        // a partial line still in the assembler is dropped here on purpose
        drop(reader);
        drop(keep_alive);
        synth_worker.await?;
        play_worker.await?;
        notifier.shutdown().await;
        info!("pipeline stopped");
        Ok(())
    }
}

fn ensure_fifo(path: &Path) -> anyhow::Result<()> {
    use nix::sys::stat::Mode;
    match nix::unistd::mkfifo(path, Mode::from_bits_truncate(0o644)) {
        Ok(()) | Err(nix::errno::Errno::EEXIST) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context(format!("mkfifo {}", path.display()))),
    }
}
