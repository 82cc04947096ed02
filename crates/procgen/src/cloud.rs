//! Voxel clouds: noise-thresholded blobs drifting above the sea.

use crate::noise_source::{NoiseSource, SimplexNoise};
use glam::{UVec3, Vec2, Vec3};
use rand::prelude::*;

/// Parameters for a cloud field.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub num_clouds: usize,
    pub min_height: f32,
    pub max_height: f32,
    /// Scale applied to world x/z before sampling noise.
    pub noise_scale: f64,
    /// A voxel is filled when its weighted noise exceeds this.
    pub threshold: f64,
    /// Voxel grid dimensions per cloud.
    pub size: UVec3,
    /// Extent of the field on x and z, centred on the origin.
    pub bounds: Vec2,
    pub drift_rate: f32,
    pub drift_speed: f32,
    pub seed: u64,
    /// Regenerate the whole field this often. `None` keeps the first set.
    pub refresh_interval_ms: Option<f32>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            num_clouds: 10,
            min_height: 100.0,
            max_height: 150.0,
            noise_scale: 0.1,
            threshold: 0.3,
            size: UVec3::new(10, 3, 10),
            bounds: Vec2::new(500.0, 500.0),
            drift_rate: 0.001,
            drift_speed: 0.05,
            seed: 0,
            refresh_interval_ms: None,
        }
    }
}

impl CloudConfig {
    /// The lower, denser sky used by the island scene.
    pub fn scene(seed: u64) -> Self {
        Self {
            num_clouds: 15,
            min_height: 80.0,
            max_height: 120.0,
            noise_scale: 0.15,
            threshold: 0.25,
            size: UVec3::new(8, 2, 8),
            bounds: Vec2::new(400.0, 400.0),
            seed,
            ..Default::default()
        }
    }

    /// Repair values that would make sampling meaningless.
    fn sanitized(mut self) -> Self {
        if self.min_height > self.max_height {
            log::warn!(
                "Cloud min_height {} above max_height {}, clamping",
                self.min_height,
                self.max_height
            );
            self.max_height = self.min_height;
        }
        if self.bounds.x < 0.0 || self.bounds.y < 0.0 {
            log::warn!("Negative cloud bounds {:?}, using magnitude", self.bounds);
            self.bounds = self.bounds.abs();
        }
        self
    }
}

/// One cloud: a dense occupancy grid anchored in the sky.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudBlob {
    /// Where the grid was sampled. Occupancy is a function of this.
    pub anchor: Vec3,
    /// Current position after drift.
    pub position: Vec3,
    pub size: UVec3,
    occupancy: Vec<bool>,
}

impl CloudBlob {
    #[inline]
    pub fn index(&self, dx: u32, dy: u32, dz: u32) -> usize {
        let (sx, sy) = (self.size.x as usize, self.size.y as usize);
        dx as usize + sx * (dy as usize + sy * dz as usize)
    }

    pub fn is_occupied(&self, dx: u32, dy: u32, dz: u32) -> bool {
        if dx >= self.size.x || dy >= self.size.y || dz >= self.size.z {
            return false;
        }
        self.occupancy[self.index(dx, dy, dz)]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&v| v).count()
    }

    /// Grid coordinates of every filled voxel.
    pub fn occupied_voxels(&self) -> impl Iterator<Item = UVec3> + '_ {
        let size = self.size;
        (0..size.z).flat_map(move |dz| {
            (0..size.y).flat_map(move |dy| {
                (0..size.x).filter_map(move |dx| {
                    self.is_occupied(dx, dy, dz).then_some(UVec3::new(dx, dy, dz))
                })
            })
        })
    }

    /// World position of a voxel at the cloud's current position.
    pub fn voxel_position(&self, voxel: UVec3) -> Vec3 {
        self.position + voxel.as_vec3()
    }
}

/// Number of voxels in a grid of `size`, counted in `usize`.
#[inline]
pub fn grid_len(size: UVec3) -> usize {
    size.x as usize * size.y as usize * size.z as usize
}

/// Fraction of noise kept at layer `dy`: 1 at the base, fading upward.
#[inline]
pub fn height_factor(dy: u32, size_y: u32) -> f64 {
    1.0 - dy as f64 / size_y as f64
}

/// Sample a single cloud grid at `anchor`.
pub fn generate_cloud<N: NoiseSource + ?Sized>(
    noise: &N,
    anchor: Vec3,
    config: &CloudConfig,
) -> CloudBlob {
    let size = config.size;
    let mut occupancy = vec![false; grid_len(size)];

    for dz in 0..size.z {
        for dy in 0..size.y {
            for dx in 0..size.x {
                let nx = (anchor.x as f64 + dx as f64) * config.noise_scale;
                let nz = (anchor.z as f64 + dz as f64) * config.noise_scale;
                let value = noise.noise2d(nx, nz) * height_factor(dy, size.y);
                occupancy[(dx + size.x * (dy + size.y * dz)) as usize] = value > config.threshold;
            }
        }
    }

    CloudBlob {
        anchor,
        position: anchor,
        size,
        occupancy,
    }
}

fn sample_range(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Wrap one axis into `[-half, half]`.
#[inline]
fn wrap_axis(v: f32, half: f32) -> f32 {
    if v > half {
        -half
    } else if v < -half {
        half
    } else {
        v
    }
}

/// The whole sky: a set of clouds plus the RNG that places them.
#[derive(Debug)]
pub struct CloudField {
    config: CloudConfig,
    clouds: Vec<CloudBlob>,
    rng: StdRng,
    noise: SimplexNoise,
    last_generated_ms: f32,
    generation: u32,
}

impl CloudField {
    /// Build and generate a field.
    pub fn new(config: CloudConfig) -> Self {
        let config = config.sanitized();
        let mut field = Self {
            rng: StdRng::seed_from_u64(config.seed),
            noise: SimplexNoise::new(config.seed),
            config,
            clouds: Vec::new(),
            last_generated_ms: 0.0,
            generation: 0,
        };
        field.generate();
        field
    }

    /// Replace every cloud with a freshly placed set.
    pub fn generate(&mut self) {
        let half = self.config.bounds * 0.5;
        let mut clouds = Vec::with_capacity(self.config.num_clouds);
        for _ in 0..self.config.num_clouds {
            let x = sample_range(&mut self.rng, -half.x, half.x);
            let y = sample_range(&mut self.rng, self.config.min_height, self.config.max_height);
            let z = sample_range(&mut self.rng, -half.y, half.y);
            clouds.push(generate_cloud(&self.noise, Vec3::new(x, y, z), &self.config));
        }
        self.clouds = clouds;
        self.generation += 1;

        log::info!(
            "Generated {} clouds ({} voxels)",
            self.clouds.len(),
            self.total_voxels()
        );
    }

    /// Drift every cloud for the session clock `elapsed_ms`.
    pub fn update(&mut self, elapsed_ms: f32) {
        let half = self.config.bounds * 0.5;
        let rate = self.config.drift_rate;
        let speed = self.config.drift_speed;
        for (i, cloud) in self.clouds.iter_mut().enumerate() {
            let phase = elapsed_ms * rate + i as f32;
            cloud.position.x = wrap_axis(cloud.position.x + phase.sin() * speed, half.x);
            cloud.position.z = wrap_axis(cloud.position.z + phase.cos() * speed, half.y);
        }
    }

    /// Regenerate when the refresh interval has passed. Returns true if it did.
    pub fn maybe_refresh(&mut self, elapsed_ms: f32) -> bool {
        let Some(interval) = self.config.refresh_interval_ms else {
            return false;
        };
        if elapsed_ms - self.last_generated_ms < interval {
            return false;
        }
        self.generate();
        self.last_generated_ms = elapsed_ms;
        log::debug!("Cloud field refreshed (generation {})", self.generation);
        true
    }

    pub fn clouds(&self) -> &[CloudBlob] {
        &self.clouds
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Number of times the field has been generated.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn total_voxels(&self) -> usize {
        self.clouds.iter().map(CloudBlob::occupied_count).sum()
    }

    pub fn noise(&self) -> &SimplexNoise {
        &self.noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let a = CloudField::new(CloudConfig::scene(9));
        let b = CloudField::new(CloudConfig::scene(9));
        assert_eq!(a.clouds(), b.clouds());
        assert_eq!(a.clouds().len(), 15);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn grid_len_does_not_wrap_for_large_sizes() {
        assert_eq!(grid_len(UVec3::new(2048, 2048, 1024)), 1usize << 32);
        assert_eq!(grid_len(UVec3::new(10, 3, 10)), 300);
    }

    #[test]
    fn anchors_stay_inside_bounds_and_heights() {
        let field = CloudField::new(CloudConfig::default());
        for cloud in field.clouds() {
            assert!(cloud.anchor.x >= -250.0 && cloud.anchor.x < 250.0);
            assert!(cloud.anchor.z >= -250.0 && cloud.anchor.z < 250.0);
            assert!(cloud.anchor.y >= 100.0 && cloud.anchor.y < 150.0);
        }
    }

    #[test]
    fn every_voxel_matches_the_threshold_rule() {
        let field = CloudField::new(CloudConfig::scene(3));
        let config = field.config();
        assert!(field.total_voxels() > 0);
        for cloud in field.clouds() {
            for dz in 0..cloud.size.z {
                for dy in 0..cloud.size.y {
                    for dx in 0..cloud.size.x {
                        let value = field.noise().noise2d(
                            (cloud.anchor.x as f64 + dx as f64) * config.noise_scale,
                            (cloud.anchor.z as f64 + dz as f64) * config.noise_scale,
                        ) * height_factor(dy, cloud.size.y);
                        assert_eq!(cloud.is_occupied(dx, dy, dz), value > config.threshold);
                    }
                }
            }
        }
    }

    #[test]
    fn threshold_above_one_leaves_clouds_empty() {
        let field = CloudField::new(CloudConfig {
            num_clouds: 1,
            size: UVec3::ONE,
            threshold: 1.1,
            ..Default::default()
        });
        assert_eq!(field.clouds().len(), 1);
        assert_eq!(field.total_voxels(), 0);
    }

    #[test]
    fn top_layer_fades_out() {
        // Constant noise of 1.0: layer dy keeps 1 - dy/3.
        let flat = |_: f64, _: f64| 1.0;
        let config = CloudConfig {
            size: UVec3::new(2, 3, 2),
            threshold: 0.5,
            ..Default::default()
        };
        let cloud = generate_cloud(&flat, Vec3::ZERO, &config);
        assert!(cloud.is_occupied(1, 0, 1));
        assert!(cloud.is_occupied(0, 1, 0));
        assert!(!cloud.is_occupied(0, 2, 0));
        assert_eq!(cloud.occupied_count(), 8);
        assert_eq!(cloud.occupied_voxels().count(), 8);
        assert!(!cloud.is_occupied(5, 0, 0));
    }

    #[test]
    fn drift_is_additive_and_wraps() {
        let mut field = CloudField::new(CloudConfig {
            num_clouds: 2,
            ..Default::default()
        });
        let before: Vec<Vec3> = field.clouds().iter().map(|c| c.position).collect();
        field.update(0.0);
        let c0 = field.clouds()[0].position;
        assert!((c0.x - (before[0].x + 0.0f32.sin() * 0.05)).abs() < 1e-4);
        assert!((c0.z - (before[0].z + 0.05)).abs() < 1e-4);
        assert_eq!(c0.y, before[0].y);

        field.clouds[1].position.x = 250.0 + 0.01;
        field.clouds[1].position.z = -250.0 - 0.01;
        // sin(1) > 0 keeps x past the edge, cos(1) > 0 pulls z back in.
        field.update(0.0);
        assert_eq!(field.clouds()[1].position.x, -250.0);
        assert!(field.clouds()[1].position.z > -250.0);
    }

    #[test]
    fn refresh_regenerates_after_interval() {
        let mut field = CloudField::new(CloudConfig {
            refresh_interval_ms: Some(1000.0),
            ..CloudConfig::scene(5)
        });
        let first = field.clouds().to_vec();
        assert!(!field.maybe_refresh(500.0));
        assert!(field.maybe_refresh(1000.0));
        assert_eq!(field.generation(), 2);
        assert_ne!(field.clouds(), first.as_slice());
        assert!(!field.maybe_refresh(1500.0));

        let mut fixed = CloudField::new(CloudConfig::default());
        assert!(!fixed.maybe_refresh(1.0e9));
    }

    #[test]
    fn inverted_heights_are_clamped() {
        let field = CloudField::new(CloudConfig {
            min_height: 200.0,
            max_height: 100.0,
            ..Default::default()
        });
        for cloud in field.clouds() {
            assert_eq!(cloud.anchor.y, 200.0);
        }
    }
}
