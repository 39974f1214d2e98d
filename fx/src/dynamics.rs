use crate::{db_to_gain, Effect};

fn smoothing_coef(ms: f32, rate: u32) -> f32 {
    let samples = (ms / 1000.0 * rate as f32).max(1.0);
    (-1.0 / samples).exp()
}

/// Downward compressor with attack/release envelope smoothing.
pub struct Compressor {
    threshold: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    attack: f32,
    release: f32,
    env: f32,
    rate: u32,
}

impl Compressor {
    pub fn new(threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            threshold: db_to_gain(threshold_db),
            ratio,
            attack_ms,
            release_ms,
            attack: 0.0,
            release: 0.0,
            env: 0.0,
            rate: 0,
        }
    }

    fn tune(&mut self, rate: u32) {
        self.attack = smoothing_coef(self.attack_ms, rate);
        self.release = smoothing_coef(self.release_ms, rate);
        self.rate = rate;
    }
}

impl Effect for Compressor {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32) {
        if self.rate != sample_rate {
            self.tune(sample_rate);
        }
        for s in samples.iter_mut() {
            let level = s.abs();
            let coef = if level > self.env {
                self.attack
            } else {
                self.release
            };
            self.env = coef * self.env + (1.0 - coef) * level;
            if self.env > self.threshold {
                let over_db = 20.0 * (self.env / self.threshold).log10();
                let reduction_db = over_db * (1.0 - 1.0 / self.ratio);
                *s *= db_to_gain(-reduction_db);
            }
        }
    }
}

/// Hard ceiling: instant attack, smoothed release.
pub struct Limiter {
    threshold: f32,
    release_ms: f32,
    release: f32,
    env: f32,
    rate: u32,
}

impl Limiter {
    pub fn new(threshold_db: f32, release_ms: f32) -> Self {
        Self {
            threshold: db_to_gain(threshold_db),
            release_ms,
            release: 0.0,
            env: 0.0,
            rate: 0,
        }
    }
}

impl Effect for Limiter {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32) {
        if self.rate != sample_rate {
            self.release = smoothing_coef(self.release_ms, sample_rate);
            self.rate = sample_rate;
        }
        for s in samples.iter_mut() {
            let level = s.abs();
            self.env = if level > self.env {
                level
            } else {
                self.release * self.env + (1.0 - self.release) * level
            };
            if self.env > self.threshold {
                *s *= self.threshold / self.env;
            }
        }
    }
}
