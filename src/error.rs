use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid {kind} reference {id} (count: {count})")]
    InvalidReference {
        kind: &'static str,
        id: usize,
        count: usize,
    },

    #[error("Out of memory while growing a buffer to {requested} elements")]
    OutOfMemory { requested: usize },

    #[error("Video sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    #[error("Scene file line {line}: {message}")]
    SceneParse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
