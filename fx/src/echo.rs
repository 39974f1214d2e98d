use crate::Effect;

/// Single feedback delay line.
pub struct Delay {
    delay_seconds: f32,
    feedback: f32,
    mix: f32,
    buf: Vec<f32>,
    pos: usize,
    rate: u32,
}

impl Delay {
    pub fn new(delay_seconds: f32, feedback: f32, mix: f32) -> Self {
        Self {
            delay_seconds,
            feedback,
            mix,
            buf: Vec::new(),
            pos: 0,
            rate: 0,
        }
    }

    fn tune(&mut self, rate: u32) {
        let len = ((self.delay_seconds * rate as f32) as usize).max(1);
        self.buf = vec![0.0; len];
        self.pos = 0;
        self.rate = rate;
    }
}

impl Effect for Delay {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32) {
        if self.rate != sample_rate {
            self.tune(sample_rate);
        }
        let len = self.buf.len();
        for s in samples.iter_mut() {
            let wet = self.buf[self.pos];
            self.buf[self.pos] = *s + wet * self.feedback;
            self.pos = (self.pos + 1) % len;
            *s = *s * (1.0 - self.mix) + wet * self.mix;
        }
    }
}

// Schroeder tunings, in samples at 44.1 kHz.
const COMB_TUNINGS: [usize; 4] = [1116, 1188, 1277, 1356];
const ALLPASS_TUNINGS: [usize; 2] = [556, 441];

struct Comb {
    buf: Vec<f32>,
    pos: usize,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buf: vec![0.0; len.max(1)],
            pos: 0,
            feedback,
            damp,
            store: 0.0,
        }
    }

    fn tick(&mut self, x: f32) -> f32 {
        let out = self.buf[self.pos];
        self.store = out * (1.0 - self.damp) + self.store * self.damp;
        self.buf[self.pos] = x + self.store * self.feedback;
        self.pos = (self.pos + 1) % self.buf.len();
        out
    }
}

struct Allpass {
    buf: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buf: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    fn tick(&mut self, x: f32) -> f32 {
        let delayed = self.buf[self.pos];
        self.buf[self.pos] = x + delayed * 0.5;
        self.pos = (self.pos + 1) % self.buf.len();
        delayed - x
    }
}

/// Parallel damped combs into series allpasses, wet/dry mixed at the end.
pub struct Reverb {
    room_size: f32,
    damping: f32,
    wet: f32,
    dry: f32,
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    rate: u32,
}

impl Reverb {
    pub fn new(room_size: f32, damping: f32, wet: f32, dry: f32) -> Self {
        Self {
            room_size,
            damping,
            wet,
            dry,
            combs: Vec::new(),
            allpasses: Vec::new(),
            rate: 0,
        }
    }

    fn tune(&mut self, rate: u32) {
        let scale = rate as f32 / 44100.0;
        let feedback = self.room_size * 0.28 + 0.7;
        let damp = self.damping * 0.4;
        self.combs = COMB_TUNINGS
            .iter()
            .map(|&len| Comb::new((len as f32 * scale) as usize, feedback, damp))
            .collect();
        self.allpasses = ALLPASS_TUNINGS
            .iter()
            .map(|&len| Allpass::new((len as f32 * scale) as usize))
            .collect();
        self.rate = rate;
    }
}

impl Effect for Reverb {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32) {
        if self.rate != sample_rate {
            self.tune(sample_rate);
        }
        for s in samples.iter_mut() {
            let x = *s;
            let mut wet = 0.0;
            for comb in &mut self.combs {
                wet += comb.tick(x);
            }
            for allpass in &mut self.allpasses {
                wet = allpass.tick(wet);
            }
            *s = self.dry * x + self.wet * wet;
        }
    }
}
