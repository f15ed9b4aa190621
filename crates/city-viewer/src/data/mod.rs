// src/data/mod.rs
//! Model data for the city viewer.
//!
//! This module provides functionality for:
//! - Importing glTF/GLB files into CPU-side meshes, materials and clips.
//! - Running that import off the render thread and handing the result back.

pub mod error;
pub mod import;
pub mod loader;
pub mod model;

pub use self::error::LoadError;
pub use self::import::import_model;
pub use self::loader::{spawn_model_load, PendingModel};
pub use self::model::{LoadedModel, MaterialData, MeshData, MeshVertex, Primitive, TextureData};
