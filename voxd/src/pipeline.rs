use std::io;

use fx::Effect;
use notify::NotifyHandle;
use synth::Synthesizer;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::playback::AudioOut;

/// Seconds of effect-chain decay captured after the last real chunk.
pub const TAIL_SECONDS: f64 = 1.5;

/// Post-effects clipping range, wider than unit amplitude to tolerate
/// effect-induced overshoot before quantization.
pub const CLIP_LIMIT: f32 = 2.0;

/// Work items for the synthesis-and-effects stage. `Stop` is enqueued at
/// most once and is the last item the queue ever carries.
pub enum TextCommand {
    Speak(String),
    Stop,
}

/// Work items for the playback stage.
pub enum AudioCommand {
    Play(Vec<u8>),
    Stop,
}

/// s16 PCM to normalized floats.
pub fn pcm_to_float(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Floats back to little-endian s16 bytes, clipped to `±limit` first;
/// quantization itself saturates.
pub fn float_to_pcm(samples: &[f32], limit: f32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let clipped = s.clamp(-limit, limit);
        bytes.extend_from_slice(&((clipped * 32767.0) as i16).to_le_bytes());
    }
    bytes
}

/// Linear gain ramp from full scale down to silence across the whole buffer.
pub fn fade_out(samples: &mut [f32]) {
    let n = samples.len();
    if n < 2 {
        return;
    }
    let step = 1.0 / (n - 1) as f32;
    for (i, s) in samples.iter_mut().enumerate() {
        *s *= 1.0 - step * i as f32;
    }
}

/// Synthesis-and-effects worker. Runs on a blocking thread; fully serializes
/// utterances, so buffers of one never interleave with the next.
pub fn synthesis_stage<S, E>(
    mut synth: S,
    mut board: E,
    speed: f32,
    mut texts: mpsc::UnboundedReceiver<TextCommand>,
    audio: mpsc::UnboundedSender<AudioCommand>,
    notify: NotifyHandle,
) where
    S: Synthesizer,
    E: Effect,
{
    while let Some(command) = texts.blocking_recv() {
        let text = match command {
            TextCommand::Stop => {
                let _ = audio.send(AudioCommand::Stop);
                break;
            }
            TextCommand::Speak(text) => text,
        };

        let chunks = match synth.synthesize(&text, speed) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(?e, %text, "synthesis failed, dropping utterance");
                continue;
            }
        };

        let mut last_rate = None;
        let mut failed = false;
        for chunk in chunks {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(?e, %text, "synthesis failed mid-utterance, abandoning it");
                    failed = true;
                    break;
                }
            };
            let duration = chunk.duration_secs();
            let mut samples = pcm_to_float(&chunk.samples);
            board.process(&mut samples, chunk.sample_rate);
            let pcm = float_to_pcm(&samples, CLIP_LIMIT);
            notify.notify(&text, duration);
            let _ = audio.send(AudioCommand::Play(pcm));
            last_rate = Some(chunk.sample_rate);
        }

        if failed {
            continue;
        }
        if let Some(rate) = last_rate {
            let _ = audio.send(AudioCommand::Play(render_tail(&mut board, rate)));
            debug!(%text, "utterance synthesized");
        }
    }
}

/// Push silence through the board to capture any reverb or delay decay, then
/// ramp it down to nothing so the utterance ends clean.
fn render_tail<E: Effect>(board: &mut E, sample_rate: u32) -> Vec<u8> {
    let mut tail = vec![0.0f32; (sample_rate as f64 * TAIL_SECONDS) as usize];
    board.process(&mut tail, sample_rate);
    for s in tail.iter_mut() {
        *s = s.clamp(-1.0, 1.0);
    }
    fade_out(&mut tail);
    float_to_pcm(&tail, 1.0)
}

/// Playback worker. Owns the output device for its whole lifetime; a write
/// error ends the stage and bubbles up to the supervisor.
pub fn playback_stage<A: AudioOut>(
    mut out: A,
    mut audio: mpsc::UnboundedReceiver<AudioCommand>,
) -> io::Result<()> {
    while let Some(command) = audio.blocking_recv() {
        match command {
            AudioCommand::Stop => break,
            AudioCommand::Play(pcm) => out.write(&pcm)?,
        }
    }
    Ok(())
}
