use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Everything that can go wrong while loading a scene and bringing up the
/// renderer. None of these are recovered from: they are reported and the
/// process exits.
#[derive(Error, Debug)]
pub enum Error {
    /// A scene, texture, shader or config file is missing or corrupt, or a
    /// fixed-capacity GPU table is full.
    #[error("failed to load \"{}\": {reason}", .path.display())]
    ResourceLoad { path: PathBuf, reason: String },
    /// A mesh from the scene file breaks the vertex/index layout rules.
    #[error("invalid geometry in mesh {mesh}: {reason}")]
    InvalidGeometry { mesh: String, reason: String },
    /// `stage` is None for link errors.
    #[error(
        "failed to build {} \"{}\":\n{log}",
        .stage.map_or("shader program".to_string(), |stage| format!("{stage} shader")),
        .path.display()
    )]
    ShaderBuild {
        stage: Option<ShaderStage>,
        path: PathBuf,
        log: String,
    },
    #[error("{what} id {id} is out of bounds (table holds {len})")]
    PreconditionViolation {
        what: &'static str,
        id: u32,
        len: usize,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unsupported OpenGL implementation: {0}")]
    Unsupported(String),
}

impl Error {
    pub fn resource(path: impl AsRef<Path>, reason: impl Display) -> Error {
        Error::ResourceLoad {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
