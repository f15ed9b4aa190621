use std::path::PathBuf;
use thiserror::Error;

/// Why a model never made it into the scene.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to import glTF model {path:?}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("glTF model {path:?} requires {extension}, which cannot be decoded")]
    UnsupportedCompression { path: PathBuf, extension: String },

    #[error("glTF model {0:?} contains no scene")]
    NoScene(PathBuf),

    #[error("model loader stopped without reporting a result")]
    LoaderVanished,

    #[error("failed to start the model loader thread")]
    Spawn(#[source] std::io::Error),
}
