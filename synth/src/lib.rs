//! Speech synthesis engine seam and the piper adapter.

use thiserror::Error;

mod piper;

pub use piper::PiperSynth;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("speed must be above 0.0, got {0}")]
    InvalidSpeed(f32),
    #[error("voice config {path}: {message}")]
    VoiceConfig { path: String, message: String },
    #[error("synthesis engine exited with {status}: {stderr}")]
    Engine {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, SynthError>;

/// One unit of synthesized audio: mono signed 16-bit samples at a fixed rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioChunk {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl AudioChunk {
    /// Play time of this chunk in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Lazily produced, ordered sequence of chunks for one utterance.
pub type ChunkIter = Box<dyn Iterator<Item = Result<AudioChunk>> + Send>;

/// Speech synthesis engine interface.
pub trait Synthesizer: Send {
    /// Sample rate of every chunk this engine will ever produce. Fixed for
    /// the engine's lifetime and known before the first synthesis call.
    fn sample_rate(&self) -> u32;

    /// Convert `text` into audio chunks. `speed` is a multiplier above 0.0;
    /// invalid input fails fast rather than hanging.
    fn synthesize(&mut self, text: &str, speed: f32) -> Result<ChunkIter>;
}
