use crate::geometry::{Fp, Ray, Vec3f, EPS};

#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb {
            min: Vec3f::repeat(Fp::INFINITY),
            max: Vec3f::repeat(Fp::NEG_INFINITY),
        }
    }
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3f>) -> Aabb {
        let eps_vec = Vec3f::repeat(EPS);
        let bounds = points
            .into_iter()
            .fold(Aabb::default(), |aabb, point| aabb.extend_point(point));
        if bounds.is_empty() {
            return bounds;
        }
        // flat meshes (a scaled-to-zero plane) still get a box with volume
        Aabb {
            min: bounds.min - eps_vec,
            max: bounds.max + eps_vec,
        }
    }

    pub fn extend_point(&self, point: &Vec3f) -> Aabb {
        Aabb {
            min: self.min.inf(point),
            max: self.max.sup(point),
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn hit_by(&self, ray: &Ray, max_distance: Fp) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut t_min: Fp = 0.0;
        let mut t_max = max_distance;
        for i in 0..3 {
            let inv = 1.0 / ray.direction[i];
            let t0 = (self.min[i] - ray.origin[i]) * inv;
            let t1 = (self.max[i] - ray.origin[i]) * inv;
            // NaN (0 * inf) leaves the axis unconstrained
            t_min = Fp::max(t_min, Fp::min(t0, t1));
            t_max = Fp::min(t_max, Fp::max(t0, t1));
        }
        t_min <= t_max
    }
}
