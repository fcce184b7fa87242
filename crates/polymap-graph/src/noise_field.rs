//! Multi-octave fractal Brownian motion (fBm) over simplex noise.
//!
//! Used by the island builder to give mesh corners natural-looking elevation
//! and moisture values with features at several spatial frequencies.

use noise::{NoiseFn, Simplex};

/// Configuration for a multi-octave fBm field.
#[derive(Clone, Debug)]
pub struct FbmParams {
    /// Seed for the underlying simplex noise.
    pub seed: u32,
    /// Number of octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per mesh unit.
    pub base_frequency: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
        }
    }
}

/// A 2D scalar field normalized to roughly `[-1, 1]`.
pub struct FbmField {
    noise: Simplex,
    params: FbmParams,
    norm: f64,
}

impl FbmField {
    /// Create a field with the given parameters.
    pub fn new(params: FbmParams) -> Self {
        let noise = Simplex::new(params.seed);
        let mut norm = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..params.octaves {
            norm += amplitude;
            amplitude *= params.persistence;
        }
        Self {
            noise,
            params,
            norm: if norm > 0.0 { norm } else { 1.0 },
        }
    }

    /// Sample the field at a point in mesh space.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = 1.0;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total / self.norm
    }

    /// Sample and remap into `[0, 1]`.
    pub fn sample_unit(&self, x: f64, y: f64) -> f64 {
        (self.sample(x, y) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &FbmParams {
        &self.params
    }
}
