use crate::geometry::{Fp, Vec3f};

pub fn smoothstep(edge0: Fp, edge1: Fp, x: Fp) -> Fp {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn is_finite(v: &Vec3f) -> bool {
    v.iter().all(|c| c.is_finite())
}

pub fn to_byte(x: Fp) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}
