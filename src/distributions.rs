use std::f64::consts::PI;

use crate::geometry::{try_normalize, Fp, Vec3f};

const HASH_MULTIPLIER: u32 = 793123;

/// Small stateful generator used by the estimator.
///
/// Every step is `state += (state + 195439) * (state + 124395) * (state + 845921)`
/// in wrapping 32-bit arithmetic, so the sequence is a pure function of the seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleRng {
    state: u32,
}

impl SampleRng {
    pub fn new(seed: u32) -> Self {
        SampleRng { state: seed }
    }

    pub fn for_pixel(x: u32, y: u32, width: u32, frame_id: u64) -> Self {
        let pixel_index = width.wrapping_mul(y).wrapping_add(x);
        // +1 so that pixel 0 does not start from the same state every frame
        let seed = pixel_index
            .wrapping_add(1)
            .wrapping_mul(frame_id as u32)
            .wrapping_mul(HASH_MULTIPLIER);
        SampleRng::new(seed)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        let s = self.state;
        let product = s
            .wrapping_add(195439)
            .wrapping_mul(s.wrapping_add(124395))
            .wrapping_mul(s.wrapping_add(845921));
        self.state = s.wrapping_add(product);
        self.state
    }

    pub fn uniform01(&mut self) -> Fp {
        (self.next_u32() as f64 / u32::MAX as f64) as Fp
    }

    pub fn standard_normal(&mut self) -> Fp {
        let theta = 2.0 * PI * self.uniform01() as f64;
        let rho = (-2.0 * (self.uniform01() as f64).ln()).sqrt();
        (rho * theta.cos()) as Fp
    }
}

pub trait SampleDistribution {
    fn sample(&self, normal: &Vec3f, rng: &mut SampleRng) -> Option<Vec3f>;
    fn pdf(&self, normal: &Vec3f, direction: &Vec3f) -> Fp;
}

pub struct HemisphereUniform;

pub fn random_direction(rng: &mut SampleRng) -> Option<Vec3f> {
    let x = rng.standard_normal();
    let y = rng.standard_normal();
    let z = rng.standard_normal();
    try_normalize(&Vec3f::new(x, y, z))
}

pub fn random_hemisphere_direction(normal: &Vec3f, rng: &mut SampleRng) -> Option<Vec3f> {
    let direction = random_direction(rng)?;
    if direction.dot(normal) < 0.0 {
        Some(-direction)
    } else {
        Some(direction)
    }
}

impl SampleDistribution for HemisphereUniform {
    fn sample(&self, normal: &Vec3f, rng: &mut SampleRng) -> Option<Vec3f> {
        random_hemisphere_direction(normal, rng)
    }

    fn pdf(&self, normal: &Vec3f, direction: &Vec3f) -> Fp {
        if direction.dot(normal) >= 0.0 {
            1.0 / (2.0 * std::f32::consts::PI)
        } else {
            0.0
        }
    }
}
