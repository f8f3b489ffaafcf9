use arrayvec::ArrayVec;
use nalgebra::{Vector3, Vector4};

pub type Fp = f32;
pub type Vec3f = Vector3<Fp>;
pub type Vec4f = Vector4<Fp>;

pub static EPS: Fp = 1e-3;
pub static FAR_SENTINEL: Fp = 1e7;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3f,
    pub direction: Vec3f,
}

impl Ray {
    pub fn at(&self, t: Fp) -> Vec3f {
        self.origin + self.direction * t
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3f,
    pub radius: Fp,
    pub material_id: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Hit {
    pub point: Vec3f,
    pub normal: Vec3f,
    pub material_id: usize,
    pub distance: Fp,
}

#[derive(Clone, Copy, Debug)]
pub struct TriangleHit {
    pub distance: Fp,
    pub u: Fp,
    pub v: Fp,
}

pub fn try_normalize(v: &Vec3f) -> Option<Vec3f> {
    let norm = v.norm();
    if norm > 0.0 && norm.is_finite() {
        Some(v / norm)
    } else {
        None
    }
}

pub fn quadratic_roots(a: Fp, b: Fp, c: Fp) -> ArrayVec<Fp, 2> {
    let mut roots = ArrayVec::new();
    if a == 0.0 {
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    roots.push(Fp::min(t1, t2));
    roots.push(Fp::max(t1, t2));
    roots
}

/// Intersects a ray with a sphere using only the near root.
///
/// A ray starting inside the sphere has a negative near root and is reported
/// as a miss; the far root is never tried.
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere) -> Option<Hit> {
    let delta = ray.origin - sphere.center;
    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * delta.dot(&ray.direction);
    let c = delta.dot(&delta) - sphere.radius * sphere.radius;
    let near = *quadratic_roots(a, b, c).first()?;
    if near < 0.0 {
        return None;
    }
    let point = ray.at(near);
    let normal = try_normalize(&(point - sphere.center))?;
    Some(Hit {
        point,
        normal,
        material_id: sphere.material_id,
        distance: near,
    })
}

/// Möller–Trumbore ray/triangle test. Both faces are hit; distances below
/// [EPS] are rejected.
pub fn intersect_triangle(ray: &Ray, v0: &Vec3f, edge1: &Vec3f, edge2: &Vec3f) -> Option<TriangleHit> {
    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(&pvec);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.origin - v0;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let distance = edge2.dot(&qvec) * inv_det;
    if distance > EPS && distance.is_finite() {
        Some(TriangleHit { distance, u, v })
    } else {
        None
    }
}

pub fn face_forward(normal: Vec3f, direction: &Vec3f) -> Vec3f {
    if normal.dot(direction) > 0.0 {
        -normal
    } else {
        normal
    }
}
