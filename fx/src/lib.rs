//! Audio effect units and the fixed board that shapes the daemon's voice.
//!
//! Every unit is a length-preserving transform over a buffer of float
//! samples. Units keep their own filter memory; an instance belongs to
//! exactly one owner and is fed buffers in stream order.

mod drive;
mod dynamics;
mod echo;
mod filter;
mod modulation;

pub use drive::{Bitcrush, Drive};
pub use dynamics::{Compressor, Limiter};
pub use echo::{Delay, Reverb};
pub use filter::{Highpass, Peak};
pub use modulation::Chorus;

/// A length-preserving transform over a buffer of float samples.
pub trait Effect: Send {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32);
}

/// Ordered chain of effect units applied in sequence.
pub struct Board {
    units: Vec<Box<dyn Effect>>,
}

impl Board {
    pub fn new(units: Vec<Box<dyn Effect>>) -> Self {
        Self { units }
    }

    /// The fixed chain behind the daemon's voice. Unit order matters: the
    /// dynamics units at the end keep the wet effects from clipping.
    pub fn voice_character() -> Self {
        Self::new(vec![
            Box::new(Bitcrush::new(6)),
            Box::new(Drive::new(18.0)),
            Box::new(Highpass::new(120.0)),
            Box::new(Peak::new(150.0, 18.0, 1.5)),
            Box::new(Peak::new(80.0, 12.0, 2.0)),
            Box::new(Peak::new(800.0, -12.0, 4.0)),
            Box::new(Peak::new(1800.0, 10.0, 3.0)),
            Box::new(Peak::new(3200.0, 8.0, 2.5)),
            Box::new(Peak::new(5500.0, 4.0, 1.5)),
            Box::new(Chorus::new(1.2, 0.8, 0.3)),
            Box::new(Reverb::new(0.6, 0.4, 0.35, 0.65)),
            Box::new(Delay::new(0.05, 0.35, 0.25)),
            Box::new(Compressor::new(-25.0, 8.0, 2.0, 300.0)),
            Box::new(Limiter::new(-0.5, 50.0)),
        ])
    }
}

impl Effect for Board {
    fn process(&mut self, samples: &mut [f32], sample_rate: u32) {
        for unit in &mut self.units {
            unit.process(samples, sample_rate);
        }
    }
}

pub(crate) fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}
