use std::f32::consts::TAU;

use crate::Effect;

const CENTER_DELAY_SECONDS: f32 = 0.0075;

/// LFO-modulated delay line blended with the dry signal.
pub struct Chorus {
    rate_hz: f32,
    depth: f32,
    mix: f32,
    buf: Vec<f32>,
    pos: usize,
    phase: f32,
    center: f32,
    rate: u32,
}

impl Chorus {
    pub fn new(rate_hz: f32, depth: f32, mix: f32) -> Self {
        Self {
            rate_hz,
            depth,
            mix,
            buf: Vec::new(),
            pos: 0,
            phase: 0.0,
            center: 0.0,
            rate: 0,
        }
    }

    fn tune(&mut self, rate: u32) {
        self.center = CENTER_DELAY_SECONDS * rate as f32;
        let max_delay = (self.center * 2.0) as usize + 2;
        self.buf = vec![0.0; max_delay];
        self.pos = 0;
        self.phase = 0.0;
        self.rate = rate;
    }
}

impl Effect for Chorus {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32) {
        if self.rate != sample_rate {
            self.tune(sample_rate);
        }
        let len = self.buf.len();
        let step = TAU * self.rate_hz / sample_rate as f32;
        for s in samples.iter_mut() {
            self.buf[self.pos] = *s;
            let delay = self.center * (1.0 + self.depth * self.phase.sin() * 0.5);
            let read = self.pos as f32 + len as f32 - delay;
            let i0 = read.floor() as usize % len;
            let i1 = (i0 + 1) % len;
            let frac = read - read.floor();
            let wet = self.buf[i0] * (1.0 - frac) + self.buf[i1] * frac;
            *s = *s * (1.0 - self.mix) + wet * self.mix;
            self.pos = (self.pos + 1) % len;
            self.phase = (self.phase + step) % TAU;
        }
    }
}
