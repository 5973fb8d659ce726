//! Delay lines.

use crate::Wave;

/// Windowless sinc kernel, optionally tabulated.
#[derive(Debug, Clone)]
pub struct SincTable {
    order: usize,
    scale: f32,
    data: Vec<f32>,
}

fn sinc(x: f32) -> f32 {
    let t = std::f32::consts::PI * x.abs() + f32::EPSILON;
    t.sin() / t
}

impl SincTable {
    /// Kernel of `order` taps to each side; `oversampling > 0` tabulates it
    /// with that many entries per sample.
    pub fn new(order: usize, oversampling: usize) -> Self {
        let data = if oversampling > 0 {
            let n = (order + 1) * oversampling + 1;
            (0..n)
                .map(|k| sinc(k as f32 / oversampling as f32))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            order,
            scale: oversampling as f32,
            data,
        }
    }

    /// Interpolation order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Kernel value at `x` samples.
    pub fn value(&self, x: f32) -> f32 {
        if self.data.is_empty() {
            return sinc(x);
        }
        let idx = ((x.abs() * self.scale) as usize).min(self.data.len() - 1);
        self.data[idx]
    }
}

/// Circular delay line read at a variable delay.
///
/// A delay of zero returns the most recently pushed sample.
#[derive(Debug, Clone)]
pub struct VariDelay {
    line: Vec<f32>,
    pos: usize,
    dist2sample: f64,
    sinc: SincTable,
}

impl VariDelay {
    /// Delay line of `maxdelay` samples for sample rate `fs` and speed of sound `c`.
    pub fn new(maxdelay: usize, fs: f64, c: f64, sinc_order: usize) -> Self {
        Self::with_oversampling(maxdelay, fs, c, sinc_order, 0)
    }

    /// As [`VariDelay::new`], with a tabulated sinc kernel.
    pub fn with_oversampling(
        maxdelay: usize,
        fs: f64,
        c: f64,
        sinc_order: usize,
        oversampling: usize,
    ) -> Self {
        Self {
            line: vec![0.0; maxdelay.max(1)],
            pos: 0,
            dist2sample: fs / c,
            sinc: SincTable::new(sinc_order, oversampling),
        }
    }

    /// Capacity in samples.
    pub fn capacity(&self) -> usize {
        self.line.len()
    }

    /// Append one sample.
    pub fn push(&mut self, x: f32) {
        self.pos += 1;
        if self.pos >= self.line.len() {
            self.pos = 0;
        }
        self.line[self.pos] = x;
    }

    /// Append a block of samples.
    pub fn add_chunk(&mut self, x: &[f32]) {
        for v in x {
            self.push(*v);
        }
    }

    /// Sample delayed by `delay` samples, clamped to the capacity.
    pub fn get(&self, delay: usize) -> f32 {
        let n = self.line.len();
        let delay = delay.min(n - 1);
        self.line[(self.pos + n - delay) % n]
    }

    /// Band-limited read at a fractional delay.
    pub fn get_sinc(&self, delay: f64) -> f32 {
        let integer = delay.round();
        let frac = (delay - integer) as f32;
        let order = self.sinc.order() as i64;
        (-order..=order)
            .map(|o| {
                let idx = (integer as i64 + o).max(0) as usize;
                self.sinc.value(o as f32 - frac) * self.get(idx)
            })
            .sum()
    }

    /// Read at the delay that corresponds to `dist` metres.
    pub fn get_dist(&self, dist: f64) -> f32 {
        let delay = self.dist2sample * dist;
        if self.sinc.order() > 0 {
            self.get_sinc(delay)
        } else {
            self.get(delay.max(0.0).round() as usize)
        }
    }

    /// Push `x`, then read at the delay of `dist` metres.
    pub fn get_dist_push(&mut self, dist: f64, x: f32) -> f32 {
        self.push(x);
        self.get_dist(dist)
    }
}

/// Fixed integer delay.
#[derive(Debug, Clone)]
pub struct StaticDelay {
    line: Vec<f32>,
    pos: usize,
}

impl StaticDelay {
    /// Delay by `d` samples; zero is a pass-through.
    pub fn new(d: usize) -> Self {
        Self {
            line: vec![0.0; d],
            pos: 0,
        }
    }

    /// Delay in samples.
    pub fn delay(&self) -> usize {
        self.line.len()
    }

    /// Process one sample.
    pub fn process(&mut self, x: f32) -> f32 {
        if self.line.is_empty() {
            return x;
        }
        let y = std::mem::replace(&mut self.line[self.pos], x);
        self.pos = (self.pos + 1) % self.line.len();
        y
    }

    /// Process a block in place.
    pub fn process_wave(&mut self, w: &mut Wave) {
        if self.line.is_empty() {
            return;
        }
        for v in w.iter_mut() {
            *v = self.process(*v);
        }
    }
}
