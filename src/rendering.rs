use std::path::Path;

use image::{ImageFormat, RgbImage};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::distributions::{HemisphereUniform, SampleDistribution, SampleRng};
use crate::error::Result;
use crate::geometry::{
    face_forward, intersect_sphere, intersect_triangle, try_normalize, Fp, Hit, Ray, Vec3f, Vec4f,
    FAR_SENTINEL,
};
use crate::scene::{RenderSettings, SceneView, WorldTriangle};
use crate::utils::{is_finite, smoothstep, to_byte};

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Vec4f>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Image {
            width,
            height,
            pixels: vec![Vec4f::new(0.0, 0.0, 0.0, 1.0); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec4f] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec4f] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4f {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn rgb(&self, x: u32, y: u32) -> Vec3f {
        self.pixel(x, y).xyz()
    }

    pub fn mean_rgb(&self) -> Vec3f {
        if self.pixels.is_empty() {
            return Vec3f::zeros();
        }
        self.pixels.iter().map(|p| p.xyz()).sum::<Vec3f>() / self.pixels.len() as Fp
    }

    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixel(x, y);
            image::Rgb([to_byte(p.x), to_byte(p.y), to_byte(p.z)])
        })
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_rgb8().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

fn triangle_hit(ray: &Ray, triangle: &WorldTriangle, distance: Fp, u: Fp, v: Fp) -> Option<Hit> {
    let interpolated = triangle
        .normals
        .and_then(|[n0, n1, n2]| try_normalize(&(n0 * (1.0 - u - v) + n1 * u + n2 * v)));
    let normal = match interpolated {
        Some(normal) => normal,
        None => try_normalize(&triangle.edge1.cross(&triangle.edge2))?,
    };
    Some(Hit {
        point: ray.at(distance),
        normal: face_forward(normal, &ray.direction),
        material_id: triangle.material_id,
        distance,
    })
}

pub fn nearest_hit(view: &SceneView, ray: &Ray) -> Option<Hit> {
    let mut closest = FAR_SENTINEL;
    let mut best = None;
    for sphere in view.spheres {
        if let Some(hit) = intersect_sphere(ray, sphere) {
            if hit.distance < closest {
                closest = hit.distance;
                best = Some(hit);
            }
        }
    }

    let mut best_triangle = None;
    for mesh in &view.meshes {
        if !mesh.aabb.hit_by(ray, closest) {
            continue;
        }
        for triangle in &view.triangles[mesh.triangles.clone()] {
            if let Some(t) = intersect_triangle(ray, &triangle.v0, &triangle.edge1, &triangle.edge2) {
                if t.distance < closest {
                    closest = t.distance;
                    best_triangle = Some((triangle, t));
                }
            }
        }
    }
    match best_triangle {
        Some((triangle, t)) => triangle_hit(ray, triangle, t.distance, t.u, t.v),
        None => best,
    }
}

pub fn sky_color(settings: &RenderSettings, direction: &Vec3f) -> Vec3f {
    let t = smoothstep(0.0, 0.4, direction.y).powf(0.35);
    let gradient = settings.horizon_color.lerp(&settings.zenith_color, t);
    let ground_to_sky = smoothstep(-0.01, 0.0, direction.y);
    settings.ground_color.lerp(&gradient, ground_to_sky)
}

pub fn estimate_radiance(view: &SceneView, ray: &Ray, max_bounce: u32, rng: &mut SampleRng) -> Vec3f {
    let mut throughput = Vec3f::repeat(1.0);
    let mut radiance = Vec3f::zeros();
    let mut ray = *ray;
    for _ in 0..max_bounce {
        let Some(hit) = nearest_hit(view, &ray) else {
            if view.settings.sky {
                radiance += throughput.component_mul(&sky_color(view.settings, &ray.direction));
            }
            break;
        };
        let Some(material) = view.materials.get(hit.material_id) else {
            break;
        };
        radiance += throughput.component_mul(&material.emission());
        throughput = throughput.component_mul(&material.albedo);
        let Some(direction) = HemisphereUniform.sample(&hit.normal, rng) else {
            break;
        };
        ray = Ray {
            origin: hit.point,
            direction,
        };
    }
    radiance
}

/// Radiance sample for one pixel. `frame_id` varies the seed between frames;
/// a non-finite result is replaced by black so it cannot poison an average.
pub fn render_pixel_sample(view: &SceneView, camera: &Camera, x: u32, y: u32, frame_id: u64) -> Vec3f {
    let mut rng = SampleRng::for_pixel(x, y, camera.width, frame_id);
    let ray = camera.primary_ray(x, y);
    let color = estimate_radiance(view, &ray, view.settings.max_bounce, &mut rng);
    if is_finite(&color) {
        color
    } else {
        Vec3f::zeros()
    }
}

/// Running average step: `accumulated += (working - accumulated) / frame_counter`.
pub fn blend_images(accumulated: &mut Image, working: &Image, frame_counter: u32) {
    let weight = 1.0 / frame_counter.max(1) as Fp;
    accumulated
        .pixels
        .par_iter_mut()
        .zip(working.pixels.par_iter())
        .for_each(|(acc, new)| *acc += (new - *acc) * weight);
}

pub trait SampleBackend: Sync {
    fn render_pass(&self, view: &SceneView, camera: &Camera, frame_id: u64, target: &mut Image);

    fn blend(&self, accumulated: &mut Image, working: &Image, frame_counter: u32) {
        blend_images(accumulated, working, frame_counter)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBackend;

impl SampleBackend for CpuBackend {
    fn render_pass(&self, view: &SceneView, camera: &Camera, frame_id: u64, target: &mut Image) {
        let width = target.width as usize;
        if width == 0 {
            return;
        }
        target
            .pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let c = render_pixel_sample(view, camera, x as u32, y as u32, frame_id);
                    *pixel = Vec4f::new(c.x, c.y, c.z, 1.0);
                }
            });
    }
}
