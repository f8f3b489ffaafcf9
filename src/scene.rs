use std::ops::Range;

use na::{Unit, UnitQuaternion};

use crate::aabb::Aabb;
use crate::buffer::AppendBuffer;
use crate::error::{Error, Result};
use crate::geometry::{try_normalize, Fp, Sphere, Vec3f};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    pub albedo: Vec3f,
    pub emission_color: Vec3f,
    pub emission_strength: Fp,
    pub smoothness: Fp,
}

impl Material {
    pub fn emission(&self) -> Vec3f {
        self.emission_color * self.emission_strength
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3f; 3],
    pub normals: [Vec3f; 3],
}

impl Triangle {
    pub fn has_normals(&self) -> bool {
        self.normals.iter().all(|n| n.norm_squared() > 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mesh {
    pub position: Vec3f,
    pub rotation: UnitQuaternion<Fp>,
    pub scale: Vec3f,
    pub first_triangle: usize,
    pub triangle_count: usize,
    pub material_id: usize,
}

impl Mesh {
    pub fn triangle_range(&self) -> Range<usize> {
        self.first_triangle..self.first_triangle + self.triangle_count
    }

    pub fn to_world(&self, point: &Vec3f) -> Vec3f {
        self.position + self.rotation.transform_vector(&self.scale.component_mul(point))
    }

    pub fn normal_to_world(&self, normal: &Vec3f) -> Option<Vec3f> {
        if self.scale.iter().any(|s| *s == 0.0) {
            return None;
        }
        try_normalize(&self.rotation.transform_vector(&normal.component_div(&self.scale)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub max_bounce: u32,
    pub horizon_color: Vec3f,
    pub zenith_color: Vec3f,
    pub ground_color: Vec3f,
    pub sky: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            max_bounce: 30,
            horizon_color: Vec3f::new(1.0, 1.0, 1.0),
            zenith_color: Vec3f::new(0.08, 0.36, 0.7),
            ground_color: Vec3f::new(0.35, 0.35, 0.35),
            sky: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadingToggles {
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
}

impl Default for ShadingToggles {
    fn default() -> Self {
        ShadingToggles {
            ambient: true,
            diffuse: true,
            specular: true,
        }
    }
}

/// Append-only scene store. Entities are never removed, so ids stay valid.
#[derive(Debug, Default)]
pub struct Scene {
    materials: AppendBuffer<Material>,
    spheres: AppendBuffer<Sphere>,
    triangles: AppendBuffer<Triangle>,
    meshes: AppendBuffer<Mesh>,
    pub settings: RenderSettings,
    pub moving: bool,
    pub toggles: ShadingToggles,
}

fn invalid(kind: &'static str, id: usize, count: usize) -> Error {
    Error::InvalidReference { kind, id, count }
}

fn rotation_about(angle: Fp, axis: &Vec3f) -> Result<UnitQuaternion<Fp>> {
    let axis = Unit::try_new(*axis, 1e-12).ok_or(Error::DegenerateGeometry("rotation axis"))?;
    Ok(UnitQuaternion::from_axis_angle(&axis, angle))
}

impl Scene {
    pub fn new(settings: RenderSettings) -> Self {
        Scene {
            settings,
            ..Default::default()
        }
    }

    pub fn materials(&self) -> &[Material] {
        self.materials.as_slice()
    }

    pub fn spheres(&self) -> &[Sphere] {
        self.spheres.as_slice()
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.triangles.as_slice()
    }

    pub fn meshes(&self) -> &[Mesh] {
        self.meshes.as_slice()
    }

    pub fn mesh(&self, mesh_id: usize) -> Result<&Mesh> {
        self.meshes
            .get(mesh_id)
            .ok_or_else(|| invalid("mesh", mesh_id, self.meshes.count()))
    }

    fn mesh_mut(&mut self, mesh_id: usize) -> Result<&mut Mesh> {
        let count = self.meshes.count();
        self.meshes
            .get_mut(mesh_id)
            .ok_or_else(|| invalid("mesh", mesh_id, count))
    }

    fn check_material(&self, material_id: usize) -> Result<()> {
        if material_id < self.materials.count() {
            Ok(())
        } else {
            Err(invalid("material", material_id, self.materials.count()))
        }
    }

    pub fn add_material(
        &mut self,
        albedo: Vec3f,
        emission_color: Vec3f,
        emission_strength: Fp,
        smoothness: Fp,
    ) -> Result<usize> {
        self.materials.push_value(Material {
            albedo,
            emission_color,
            emission_strength: emission_strength.max(0.0),
            smoothness: smoothness.clamp(0.0, 1.0),
        })
    }

    pub fn add_sphere(&mut self, center: Vec3f, radius: Fp, material_id: usize) -> Result<usize> {
        self.check_material(material_id)?;
        if !(radius > 0.0) {
            return Err(Error::DegenerateGeometry("sphere radius must be positive"));
        }
        self.spheres.push_value(Sphere {
            center,
            radius,
            material_id,
        })
    }

    /// Appends a triangle soup: every 3 indices form a triangle whose vertex
    /// positions are copied into the triangle buffer. Trailing indices that do
    /// not complete a triangle are ignored.
    pub fn add_mesh(&mut self, vertices: &[Vec3f], indices: &[u32], material_id: usize) -> Result<usize> {
        self.add_mesh_with_normals(vertices, &[], indices, material_id)
    }

    pub fn add_mesh_with_normals(
        &mut self,
        vertices: &[Vec3f],
        normals: &[Vec3f],
        indices: &[u32],
        material_id: usize,
    ) -> Result<usize> {
        self.check_material(material_id)?;
        if let Some(bad) = indices.iter().find(|i| **i as usize >= vertices.len()) {
            return Err(invalid("vertex", *bad as usize, vertices.len()));
        }
        if !normals.is_empty() && normals.len() != vertices.len() {
            return Err(invalid("normal", normals.len(), vertices.len()));
        }

        let first_triangle = self.triangles.count();
        let triangle_count = indices.len() / 3;
        let slots = self.triangles.push_array(triangle_count)?;
        for (slot, corners) in slots.iter_mut().zip(indices.chunks_exact(3)) {
            for (k, index) in corners.iter().enumerate() {
                slot.vertices[k] = vertices[*index as usize];
                if !normals.is_empty() {
                    slot.normals[k] = normals[*index as usize];
                }
            }
        }

        self.meshes.push_value(Mesh {
            position: Vec3f::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vec3f::repeat(1.0),
            first_triangle,
            triangle_count,
            material_id,
        })
    }

    pub fn add_plane(&mut self, material_id: usize, width: Fp, height: Fp) -> Result<usize> {
        let vertices = [
            Vec3f::new(-1.0, -1.0, 0.0),
            Vec3f::new(-1.0, 1.0, 0.0),
            Vec3f::new(1.0, -1.0, 0.0),
            Vec3f::new(1.0, 1.0, 0.0),
        ];
        let indices = [0, 1, 2, 1, 3, 2];
        let id = self.add_mesh(&vertices, &indices, material_id)?;
        self.scale_mesh(id, Vec3f::new(width, height, 0.0))?;
        Ok(id)
    }

    pub fn set_mesh_position(&mut self, mesh_id: usize, position: Vec3f) -> Result<()> {
        self.mesh_mut(mesh_id)?.position = position;
        Ok(())
    }

    pub fn move_mesh_by(&mut self, mesh_id: usize, delta: Vec3f) -> Result<()> {
        self.mesh_mut(mesh_id)?.position += delta;
        Ok(())
    }

    pub fn set_mesh_rotation(&mut self, mesh_id: usize, angle: Fp, axis: Vec3f) -> Result<()> {
        let rotation = rotation_about(angle, &axis)?;
        self.mesh_mut(mesh_id)?.rotation = rotation;
        Ok(())
    }

    /// Composes `angle` radians about `axis` with the current rotation as
    /// `current * delta`: the new rotation acts in the mesh's local frame.
    pub fn rotate_mesh_by(&mut self, mesh_id: usize, angle: Fp, axis: Vec3f) -> Result<()> {
        let delta = rotation_about(angle, &axis)?;
        let mesh = self.mesh_mut(mesh_id)?;
        mesh.rotation = mesh.rotation * delta;
        mesh.rotation.renormalize();
        Ok(())
    }

    pub fn scale_mesh(&mut self, mesh_id: usize, scale: Vec3f) -> Result<()> {
        self.mesh_mut(mesh_id)?.scale = scale;
        Ok(())
    }

    pub fn scale_mesh_uniform(&mut self, mesh_id: usize, scale: Fp) -> Result<()> {
        self.scale_mesh(mesh_id, Vec3f::repeat(scale))
    }

    pub fn view(&self) -> SceneView<'_> {
        let mut triangles = Vec::with_capacity(self.triangles.count());
        let mut meshes = Vec::with_capacity(self.meshes.count());
        for mesh in &self.meshes {
            let start = triangles.len();
            for triangle in &self.triangles.as_slice()[mesh.triangle_range()] {
                let [a, b, c] = triangle.vertices.map(|v| mesh.to_world(&v));
                let normals = if triangle.has_normals() {
                    match triangle.normals.map(|n| mesh.normal_to_world(&n)) {
                        [Some(n0), Some(n1), Some(n2)] => Some([n0, n1, n2]),
                        _ => None,
                    }
                } else {
                    None
                };
                triangles.push(WorldTriangle {
                    v0: a,
                    edge1: b - a,
                    edge2: c - a,
                    normals,
                    material_id: mesh.material_id,
                });
            }
            let corners = triangles[start..]
                .iter()
                .flat_map(|t| [t.v0, t.v0 + t.edge1, t.v0 + t.edge2])
                .collect::<Vec<_>>();
            meshes.push(MeshView {
                aabb: Aabb::from_points(&corners),
                triangles: start..triangles.len(),
            });
        }
        SceneView {
            settings: &self.settings,
            materials: self.materials.as_slice(),
            spheres: self.spheres.as_slice(),
            triangles,
            meshes,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WorldTriangle {
    pub v0: Vec3f,
    pub edge1: Vec3f,
    pub edge2: Vec3f,
    pub normals: Option<[Vec3f; 3]>,
    pub material_id: usize,
}

#[derive(Clone, Debug)]
pub struct MeshView {
    pub aabb: Aabb,
    pub triangles: Range<usize>,
}

pub struct SceneView<'a> {
    pub settings: &'a RenderSettings,
    pub materials: &'a [Material],
    pub spheres: &'a [Sphere],
    pub triangles: Vec<WorldTriangle>,
    pub meshes: Vec<MeshView>,
}
