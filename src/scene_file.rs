use std::path::Path;

use crate::camera::CameraSettings;
use crate::error::{Error, Result};
use crate::geometry::{Fp, Vec3f};
use crate::gltf_to_scene::load_gltf_meshes;
use crate::scene::{RenderSettings, Scene};

pub const DEMO_SCENE: &str = include_str!("../scenes/demo.scene");

pub struct SceneDescription {
    pub scene: Scene,
    pub camera: CameraSettings,
}

const TETRAHEDRON_VERTICES: [[Fp; 3]; 4] = [
    [0.0, 1.0, 0.0],
    [0.5, 0.0, -0.5],
    [-0.5, 0.0, -0.5],
    [0.0, 0.0, 0.5],
];
const TETRAHEDRON_INDICES: [u32; 12] = [0, 1, 2, 0, 2, 3, 0, 3, 1, 1, 3, 2];

pub fn add_tetrahedron(scene: &mut Scene, material_id: usize) -> Result<usize> {
    let vertices = TETRAHEDRON_VERTICES.map(|[x, y, z]| Vec3f::new(x, y, z));
    scene.add_mesh(&vertices, &TETRAHEDRON_INDICES, material_id)
}

struct Tokens<'a> {
    line: usize,
    tokens: Vec<&'a str>,
}

impl<'a> Tokens<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::SceneParse {
            line: self.line,
            message: message.into(),
        }
    }

    fn str(&self, index: usize) -> Result<&'a str> {
        self.tokens
            .get(index)
            .copied()
            .ok_or_else(|| self.error(format!("{} expects more arguments", self.tokens[0])))
    }

    fn float(&self, index: usize) -> Result<Fp> {
        let token = self.str(index)?;
        token
            .parse()
            .map_err(|_| self.error(format!("expected a number, got {:?}", token)))
    }

    fn uint(&self, index: usize) -> Result<u32> {
        let token = self.str(index)?;
        token
            .parse()
            .map_err(|_| self.error(format!("expected an unsigned integer, got {:?}", token)))
    }

    fn vector(&self, index: usize) -> Result<Vec3f> {
        Ok(Vec3f::new(
            self.float(index)?,
            self.float(index + 1)?,
            self.float(index + 2)?,
        ))
    }
}

pub fn parse_scene(content: &str, base_dir: &Path) -> Result<SceneDescription> {
    let mut scene = Scene::new(RenderSettings::default());
    let mut camera = CameraSettings::default();
    let mut current_mesh: Option<usize> = None;

    for (number, raw_line) in content.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("");
        let tokens = Tokens {
            line: number + 1,
            tokens: line.split_whitespace().collect(),
        };
        if tokens.tokens.is_empty() {
            continue;
        }
        let selected = current_mesh;
        let mesh = || selected.ok_or_else(|| tokens.error("no mesh to transform yet"));

        match tokens.tokens[0] {
            "MAX_BOUNCE" => scene.settings.max_bounce = tokens.uint(1)?,
            "HORIZON_COLOR" => scene.settings.horizon_color = tokens.vector(1)?,
            "ZENITH_COLOR" => scene.settings.zenith_color = tokens.vector(1)?,
            "GROUND_COLOR" => scene.settings.ground_color = tokens.vector(1)?,
            "SKY" => scene.settings.sky = tokens.uint(1)? != 0,
            "CAMERA_POSITION" => camera.position = tokens.vector(1)?,
            "CAMERA_YAW" => camera.yaw = tokens.float(1)?,
            "CAMERA_PITCH" => camera.pitch = tokens.float(1)?,
            "MATERIAL" => {
                scene.add_material(
                    tokens.vector(1)?,
                    tokens.vector(4)?,
                    tokens.float(7)?,
                    tokens.float(8)?,
                )?;
            }
            "SPHERE" => {
                scene.add_sphere(
                    tokens.vector(1)?,
                    tokens.float(4)?,
                    tokens.uint(5)? as usize,
                )?;
            }
            "PLANE" => {
                current_mesh = Some(scene.add_plane(
                    tokens.uint(1)? as usize,
                    tokens.float(2)?,
                    tokens.float(3)?,
                )?);
            }
            "TETRAHEDRON" => {
                current_mesh = Some(add_tetrahedron(&mut scene, tokens.uint(1)? as usize)?);
            }
            "MESH" => {
                let path = base_dir.join(tokens.str(1)?);
                let ids = load_gltf_meshes(&path, &mut scene, tokens.uint(2)? as usize)?;
                current_mesh = ids.last().copied();
            }
            "POSITION" => scene.set_mesh_position(mesh()?, tokens.vector(1)?)?,
            "MOVE" => scene.move_mesh_by(mesh()?, tokens.vector(1)?)?,
            "ROTATION" => {
                scene.set_mesh_rotation(mesh()?, tokens.float(1)?.to_radians(), tokens.vector(2)?)?
            }
            "ROTATE" => {
                scene.rotate_mesh_by(mesh()?, tokens.float(1)?.to_radians(), tokens.vector(2)?)?
            }
            "SCALE" => {
                if tokens.tokens.len() >= 4 {
                    scene.scale_mesh(mesh()?, tokens.vector(1)?)?
                } else {
                    scene.scale_mesh_uniform(mesh()?, tokens.float(1)?)?
                }
            }
            other => {
                log::warn!("line {}: ignoring unknown command {}", number + 1, other);
            }
        }
    }

    Ok(SceneDescription { scene, camera })
}

pub fn load_scene(path: &Path) -> Result<SceneDescription> {
    let content = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_scene(&content, base_dir)
}

pub fn demo_scene() -> Result<SceneDescription> {
    parse_scene(DEMO_SCENE, Path::new("."))
}
