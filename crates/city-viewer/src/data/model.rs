//! CPU-side model data produced by the loader and owned by the scene.

use crate::animation::AnimationClip;
use crate::scene::Transform;

/// Per-vertex data uploaded to the GPU vertex buffer.
/// Must match the vertex inputs in the mesh pipeline's WGSL.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Linear RGBA vertex colour; white when the source has none.
    pub color: [f32; 4],
}

/// One indexed triangle list drawn with a single material.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Index into the owning material list.
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.indices.len() / 3).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Linear RGBA base colour factor.
    pub base_color: [f32; 4],
    /// Index into the owning texture list.
    pub base_color_texture: Option<usize>,
    pub double_sided: bool,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            base_color: [1.0; 4],
            base_color_texture: None,
            double_sided: false,
        }
    }
}

/// An sRGB-encoded RGBA8 image.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// A 1x1 opaque white texture.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![0xff; 4],
        }
    }
}

/// A node of the loaded hierarchy. Indices refer to `LoadedModel::nodes`
/// and `LoadedModel::meshes`.
#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// Everything the loader hands back in one piece.
///
/// Animation tracks in `clips` target node indices of `nodes`.
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    pub nodes: Vec<ModelNode>,
    /// Top-level nodes of the displayed scene.
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub textures: Vec<TextureData>,
    pub clips: Vec<AnimationClip>,
}
