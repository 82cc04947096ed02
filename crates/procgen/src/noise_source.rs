//! Coherent 2D noise used for cloud shapes.

use noise::{NoiseFn, Simplex};

/// Smooth pseudo-random function of two coordinates, in `[-1, 1]`.
pub trait NoiseSource {
    fn noise2d(&self, x: f64, y: f64) -> f64;
}

/// Closures make handy fixed-field sources.
impl<F> NoiseSource for F
where
    F: Fn(f64, f64) -> f64,
{
    fn noise2d(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// Derive a 32-bit noise seed from a world seed and a per-layer offset.
pub(crate) fn deterministic_noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Simplex noise, deterministic for a given seed.
#[derive(Clone)]
pub struct SimplexNoise {
    seed: u64,
    simplex: Simplex,
}

impl SimplexNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            simplex: Simplex::new(deterministic_noise_seed(seed, 0)),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl std::fmt::Debug for SimplexNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplexNoise").field("seed", &self.seed).finish()
    }
}

impl NoiseSource for SimplexNoise {
    fn noise2d(&self, x: f64, y: f64) -> f64 {
        self.simplex.get([x, y]).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(noise: &impl NoiseSource) -> Vec<f64> {
        (0..64)
            .map(|i| {
                let t = i as f64 * 0.37;
                noise.noise2d(t, t * 1.7 + 0.11)
            })
            .collect()
    }

    #[test]
    fn same_seed_same_field() {
        assert_eq!(samples(&SimplexNoise::new(42)), samples(&SimplexNoise::new(42)));
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(samples(&SimplexNoise::new(1)), samples(&SimplexNoise::new(2)));
    }

    #[test]
    fn values_stay_in_unit_range() {
        let noise = SimplexNoise::new(7);
        for v in samples(&noise) {
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn closures_are_noise_sources() {
        let flat = |_: f64, _: f64| 0.5;
        assert_eq!(flat.noise2d(10.0, -3.0), 0.5);
    }
}
