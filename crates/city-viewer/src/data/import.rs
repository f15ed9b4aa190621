//! glTF/GLB import.
//!
//! Reads the whole file (buffers and images included) and converts it into a
//! [`LoadedModel`]. Only triangle primitives are kept; skins and morph
//! targets are not read.

use super::error::LoadError;
use super::model::{
    LoadedModel, MaterialData, MeshData, MeshVertex, ModelNode, Primitive, TextureData,
};
use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
use crate::scene::{NodeId, Transform};
use glam::{Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;
use rayon::prelude::*;
use std::path::Path;

/// Imports the model at `path`.
///
/// The default scene is displayed, or the first scene when none is marked
/// as default.
pub fn import_model(path: &Path) -> Result<LoadedModel, LoadError> {
    check_required_extensions(path)?;
    let (document, buffers, images) = gltf::import(path).map_err(|source| LoadError::Import {
        path: path.to_path_buf(),
        source,
    })?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::NoScene(path.to_path_buf()))?;

    let meshes: Vec<gltf::Mesh> = document.meshes().collect();
    let meshes: Vec<MeshData> = meshes
        .par_iter()
        .map(|mesh| convert_mesh(mesh, &buffers))
        .collect();

    let model = LoadedModel {
        nodes: document.nodes().map(convert_node).collect(),
        roots: scene.nodes().map(|n| n.index()).collect(),
        meshes,
        materials: document.materials().map(convert_material).collect(),
        textures: images.iter().map(convert_image).collect(),
        clips: document
            .animations()
            .map(|a| convert_animation(&a, &buffers))
            .collect(),
    };

    log::info!(
        "Imported {:?}: {} nodes, {} meshes ({} triangles), {} textures, {} clips",
        path,
        model.nodes.len(),
        model.meshes.len(),
        model.meshes.iter().map(MeshData::triangle_count).sum::<usize>(),
        model.textures.len(),
        model.clips.len()
    );
    Ok(model)
}

/// Geometry compression extensions with no decoder available here.
const UNDECODABLE_EXTENSIONS: &[&str] = &["KHR_draco_mesh_compression", "EXT_meshopt_compression"];

/// Rejects files that require a compression extension this importer cannot
/// decode. Unreadable or malformed files pass through so that
/// `gltf::import` reports them.
fn check_required_extensions(path: &Path) -> Result<(), LoadError> {
    let Ok(bytes) = std::fs::read(path) else {
        return Ok(());
    };
    let Ok(gltf) = gltf::Gltf::from_slice_without_validation(&bytes) else {
        return Ok(());
    };
    let required = &gltf.document.as_json().extensions_required;
    match required
        .iter()
        .find(|ext| UNDECODABLE_EXTENSIONS.contains(&ext.as_str()))
    {
        Some(ext) => Err(LoadError::UnsupportedCompression {
            path: path.to_path_buf(),
            extension: ext.clone(),
        }),
        None => Ok(()),
    }
}

fn convert_node(node: gltf::Node) -> ModelNode {
    let (t, r, s) = node.transform().decomposed();
    ModelNode {
        name: node.name().map(str::to_owned),
        transform: Transform::from_trs(t, r, s),
        mesh: node.mesh().map(|m| m.index()),
        children: node.children().map(|c| c.index()).collect(),
    }
}

fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> MeshData {
    let primitives = mesh
        .primitives()
        .filter_map(|primitive| {
            if primitive.mode() != Mode::Triangles {
                log::debug!(
                    "Skipping {:?} primitive in mesh {}",
                    primitive.mode(),
                    mesh.index()
                );
                return None;
            }
            convert_primitive(&primitive, buffers)
        })
        .collect();

    MeshData {
        name: mesh.name().map(str::to_owned),
        primitives,
    }
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Option<Primitive> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

    let Some(positions) = reader.read_positions() else {
        log::warn!("Primitive {} has no positions; skipped", primitive.index());
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let count = positions.len();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(ix) => ix.into_u32().collect(),
        None => (0..count as u32).collect(),
    };
    let Some(indices) = valid_triangles(&indices, count) else {
        log::warn!("Primitive {} has a broken index list; skipped", primitive.index());
        return None;
    };

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(n) => n.collect(),
        None => smooth_normals(&positions, &indices),
    };
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|t| t.into_f32().collect());
    let colors: Option<Vec<[f32; 4]>> = reader.read_colors(0).map(|c| c.into_rgba_f32().collect());

    let vertices = (0..count)
        .map(|i| MeshVertex {
            position: positions[i],
            normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            uv: uvs.as_ref().and_then(|u| u.get(i).copied()).unwrap_or([0.0; 2]),
            color: colors.as_ref().and_then(|c| c.get(i).copied()).unwrap_or([1.0; 4]),
        })
        .collect();

    Some(Primitive {
        vertices,
        indices,
        material: primitive.material().index(),
    })
}

/// Keeps the triangles whose three indices all address one of `count`
/// vertices. `None` when the list is not a whole number of triangles.
fn valid_triangles(indices: &[u32], count: usize) -> Option<Vec<u32>> {
    if indices.len() % 3 != 0 {
        return None;
    }
    let kept: Vec<u32> = indices
        .chunks_exact(3)
        .filter(|tri| tri.iter().all(|&i| (i as usize) < count))
        .flatten()
        .copied()
        .collect();
    if kept.len() < indices.len() {
        log::warn!(
            "Dropped {} triangle(s) with out-of-range vertex indices",
            (indices.len() - kept.len()) / 3
        );
    }
    Some(kept)
}

/// Area-weighted vertex normals for a triangle list.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

fn convert_material(material: gltf::Material) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    MaterialData {
        base_color: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|info| info.texture().source().index()),
        double_sided: material.double_sided(),
    }
}

fn convert_image(image: &gltf::image::Data) -> TextureData {
    use gltf::image::Format;

    let rgba: Vec<u8> = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 0xff])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 0xff]).collect(),
        other => {
            log::warn!("Unsupported texture format {:?}; using white", other);
            return TextureData::white();
        }
    };

    if rgba.len() != image.width as usize * image.height as usize * 4 {
        log::warn!("Texture data does not match {}x{}; using white", image.width, image.height);
        return TextureData::white();
    }
    TextureData {
        width: image.width,
        height: image.height,
        rgba,
    }
}

fn convert_animation(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> AnimationClip {
    let mut tracks = Vec::new();

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
        let target = NodeId::from_index(channel.target().node().index());
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        let Some(times) = reader.read_inputs() else {
            log::warn!("Animation channel without keyframe times; skipped");
            continue;
        };
        let times: Vec<f32> = times.collect();

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(v)) => {
                TrackValues::Translation(v.map(Vec3::from).collect())
            }
            Some(ReadOutputs::Rotations(v)) => {
                TrackValues::Rotation(v.into_f32().map(Vec4::from).collect())
            }
            Some(ReadOutputs::Scales(v)) => TrackValues::Scale(v.map(Vec3::from).collect()),
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                log::debug!("Morph target weights are not animated; channel skipped");
                continue;
            }
            None => {
                log::warn!("Animation channel without output values; skipped");
                continue;
            }
        };

        let track = Track {
            target,
            times,
            values,
            interpolation,
        };
        if track.is_well_formed() {
            tracks.push(track);
        } else {
            log::warn!(
                "Animation {:?} has a channel whose key and value counts disagree; skipped",
                animation.name()
            );
        }
    }

    AnimationClip::new(animation.name().map(str::to_owned), tracks)
}
