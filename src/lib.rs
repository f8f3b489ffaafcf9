extern crate nalgebra as na;

pub mod aabb;
pub mod accumulation;
pub mod app;
pub mod buffer;
pub mod camera;
pub mod distributions;
pub mod error;
pub mod geometry;
pub mod gltf_to_scene;
pub mod input;
pub mod rendering;
pub mod scene;
pub mod scene_file;
pub mod utils;
pub mod video;


pub use error::{Error, Result};
