use std::path::Path;

use gltf::buffer::Data;
use na::{Matrix3, Matrix4, Vector4};

use crate::error::Result;
use crate::geometry::{try_normalize, Fp, Vec3f};
use crate::scene::Scene;

/// Imports every mesh primitive of a glTF file as one scene mesh with `material_id`.
/// Node transforms are baked into the vertices, so the meshes start with an
/// identity transform. Returns the new mesh ids.
pub fn load_gltf_meshes(path: &Path, scene: &mut Scene, material_id: usize) -> Result<Vec<usize>> {
    let (document, buffers, _) = gltf::import(path)?;
    let mut mesh_ids = Vec::new();
    for gltf_scene in document.scenes() {
        for node in gltf_scene.nodes() {
            read_meshes(scene, material_id, &buffers, &node, &Matrix4::identity(), &mut mesh_ids)?;
        }
    }
    log::info!("loaded {} meshes from {}", mesh_ids.len(), path.display());
    Ok(mesh_ids)
}

fn read_meshes(
    scene: &mut Scene,
    material_id: usize,
    buffers: &[Data],
    node: &gltf::Node,
    transformation: &Matrix4<Fp>,
    mesh_ids: &mut Vec<usize>,
) -> Result<()> {
    let local = node.transform().matrix();
    // glTF matrices are column major
    let local_transformation = Matrix4::from_fn(|row, column| local[column][row]);
    let m_transformation = transformation * local_transformation;
    let normal_transformation = m_transformation
        .fixed_view::<3, 3>(0, 0)
        .into_owned()
        .try_inverse()
        .map(|m: Matrix3<Fp>| m.transpose());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(positions) = reader.read_positions() else {
                log::warn!("skipping primitive {} without positions", primitive.index());
                continue;
            };
            let vertices = positions
                .map(|[x, y, z]| {
                    let p = m_transformation * Vector4::new(x, y, z, 1.0);
                    Vec3f::new(p.x / p.w, p.y / p.w, p.z / p.w)
                })
                .collect::<Vec<_>>();
            let normals = match (reader.read_normals(), normal_transformation) {
                (Some(normals), Some(to_world)) => normals
                    .map(|[x, y, z]| {
                        try_normalize(&(to_world * Vec3f::new(x, y, z))).unwrap_or_else(Vec3f::zeros)
                    })
                    .collect::<Vec<_>>(),
                _ => Vec::new(),
            };
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<_>>(),
                None => (0..vertices.len() as u32).collect(),
            };
            mesh_ids.push(scene.add_mesh_with_normals(&vertices, &normals, &indices, material_id)?);
        }
    }
    for child in node.children() {
        read_meshes(scene, material_id, buffers, &child, &m_transformation, mesh_ids)?;
    }
    Ok(())
}
