use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AudioChunk, ChunkIter, Result, SynthError, Synthesizer};

/// Bytes pulled from the engine's stdout per read; two bytes per sample.
const READ_SIZE: usize = 4096;

#[derive(Deserialize)]
struct VoiceConfig {
    audio: VoiceAudio,
}

#[derive(Deserialize)]
struct VoiceAudio {
    sample_rate: u32,
}

/// Drives a local `piper` executable in raw-PCM streaming mode, one child
/// process per utterance.
#[derive(Debug)]
pub struct PiperSynth {
    binary: PathBuf,
    voice: PathBuf,
    sample_rate: u32,
}

impl PiperSynth {
    /// Load the adapter for `voice` (a piper `.onnx` model). The sibling
    /// `<voice>.json` config supplies the session sample rate.
    pub fn load(binary: impl Into<PathBuf>, voice: impl Into<PathBuf>) -> Result<Self> {
        let voice = voice.into();
        let config_path = voice_config_path(&voice);
        let sample_rate = read_sample_rate(&config_path)?;
        debug!(voice = %voice.display(), sample_rate, "loaded piper voice");
        Ok(Self {
            binary: binary.into(),
            voice,
            sample_rate,
        })
    }
}

impl Synthesizer for PiperSynth {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(&mut self, text: &str, speed: f32) -> Result<ChunkIter> {
        if speed <= 0.0 {
            return Err(SynthError::InvalidSpeed(speed));
        }
        let mut child = Command::new(&self.binary)
            .arg("--model")
            .arg(&self.voice)
            .arg("--output_raw")
            .arg("--length_scale")
            .arg(format!("{:.3}", 1.0 / speed))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
            stdin.write_all(b"\n")?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::new(ErrorKind::BrokenPipe, "engine stdout missing"))?;
        let stderr = child.stderr.take();
        Ok(Box::new(PcmChunks {
            child,
            stdout,
            stderr,
            sample_rate: self.sample_rate,
            carry: None,
            done: false,
        }))
    }
}

fn voice_config_path(voice: &Path) -> PathBuf {
    let mut name = voice.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

fn read_sample_rate(config_path: &Path) -> Result<u32> {
    let raw = fs::read_to_string(config_path).map_err(|e| SynthError::VoiceConfig {
        path: config_path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: VoiceConfig =
        serde_json::from_str(&raw).map_err(|e| SynthError::VoiceConfig {
            path: config_path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(config.audio.sample_rate)
}

/// Streams s16le PCM off the engine's stdout in fixed-size reads.
struct PcmChunks {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    sample_rate: u32,
    carry: Option<u8>,
    done: bool,
}

impl PcmChunks {
    fn finish(&mut self) -> Option<Result<AudioChunk>> {
        let mut err = String::new();
        if let Some(mut stderr) = self.stderr.take() {
            let _ = stderr.read_to_string(&mut err);
        }
        match self.child.wait() {
            Ok(status) if status.success() => None,
            Ok(status) => Some(Err(SynthError::Engine {
                status,
                stderr: err.trim().to_string(),
            })),
            Err(e) => Some(Err(e.into())),
        }
    }
}

impl Iterator for PcmChunks {
    type Item = Result<AudioChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut raw = [0u8; READ_SIZE];
        loop {
            let offset = match self.carry.take() {
                Some(byte) => {
                    raw[0] = byte;
                    1
                }
                None => 0,
            };
            match self.stdout.read(&mut raw[offset..]) {
                Ok(0) => {
                    if offset != 0 {
                        warn!("engine emitted a trailing odd byte, dropping it");
                    }
                    self.done = true;
                    return self.finish();
                }
                Ok(n) => {
                    let total = offset + n;
                    if total % 2 == 1 {
                        self.carry = Some(raw[total - 1]);
                    }
                    let even = total - total % 2;
                    if even == 0 {
                        continue;
                    }
                    let samples = raw[..even]
                        .chunks_exact(2)
                        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                        .collect();
                    return Some(Ok(AudioChunk {
                        sample_rate: self.sample_rate,
                        samples,
                    }));
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl Drop for PcmChunks {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
