use crate::{db_to_gain, Effect};

/// Quantizes samples down to the given bit depth.
pub struct Bitcrush {
    levels: f32,
}

impl Bitcrush {
    pub fn new(bit_depth: u32) -> Self {
        Self {
            levels: (1u32 << (bit_depth.max(1) - 1)) as f32,
        }
    }
}

impl Effect for Bitcrush {
    fn process(&mut self, samples: &mut [f32], _sample_rate: u32) {
        for s in samples.iter_mut() {
            *s = (*s * self.levels).round() / self.levels;
        }
    }
}

/// Tanh waveshaping distortion with a pre-gain in decibels.
pub struct Drive {
    gain: f32,
}

impl Drive {
    pub fn new(drive_db: f32) -> Self {
        Self {
            gain: db_to_gain(drive_db),
        }
    }
}

impl Effect for Drive {
    fn process(&mut self, samples: &mut [f32], _sample_rate: u32) {
        for s in samples.iter_mut() {
            *s = (*s * self.gain).tanh();
        }
    }
}
