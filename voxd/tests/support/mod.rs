use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use synth::{AudioChunk, ChunkIter, SynthError, Synthesizer};
use voxd::playback::AudioOut;

/// One chunk per whitespace-separated word, `CHUNK_SAMPLES` samples each;
/// the text "bad text" fails at the synthesize call.
pub struct FakeSynth {
    pub rate: u32,
}

pub const CHUNK_SAMPLES: usize = 441;

impl Synthesizer for FakeSynth {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn synthesize(&mut self, text: &str, _speed: f32) -> synth::Result<ChunkIter> {
        if text == "bad text" {
            return Err(SynthError::Io(io::Error::new(
                io::ErrorKind::Other,
                "engine rejected input",
            )));
        }
        let rate = self.rate;
        let chunks: Vec<synth::Result<AudioChunk>> = text
            .split_whitespace()
            .map(|_| {
                Ok(AudioChunk {
                    sample_rate: rate,
                    samples: vec![1000; CHUNK_SAMPLES],
                })
            })
            .collect();
        Ok(Box::new(chunks.into_iter()))
    }
}

/// Collects written PCM buffers; optionally fails every write.
#[derive(Clone, Default)]
pub struct CollectingOut {
    buffers: Arc<Mutex<Vec<Vec<u8>>>>,
    pub fail: bool,
}

impl CollectingOut {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn buffers(&self) -> Vec<Vec<u8>> {
        self.buffers.lock().unwrap().clone()
    }
}

impl AudioOut for CollectingOut {
    fn write(&mut self, pcm: &[u8]) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        self.buffers.lock().unwrap().push(pcm.to_vec());
        Ok(())
    }
}

/// Records alert activity without any display tool.
#[derive(Clone, Default)]
pub struct RecordingSink {
    creates: Arc<Mutex<usize>>,
    updates: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn creates(&self) -> usize {
        *self.creates.lock().unwrap()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl notify::AlertSink for RecordingSink {
    async fn create(&self, _message: &str) -> notify::Result<String> {
        let mut creates = self.creates.lock().unwrap();
        *creates += 1;
        Ok(format!("id-{creates}"))
    }

    async fn update(&self, _id: &str, message: &str) -> notify::Result<()> {
        self.updates.lock().unwrap().push(message.to_string());
        Ok(())
    }
}
