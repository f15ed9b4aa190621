//! Imports a small hand-written glTF file end to end.

use city_viewer::config::ViewerConfig;
use city_viewer::context::ViewerContext;
use city_viewer::data::{import_model, spawn_model_load, LoadError};
use city_viewer::viewport::ViewportSize;
use glam::Vec3;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const CITY_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [ { "nodes": [0] } ],
  "nodes": [
    { "name": "block", "children": [1], "translation": [4.0, 0.0, 0.0] },
    { "name": "car", "mesh": 0 }
  ],
  "meshes": [
    { "name": "car", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] }
  ],
  "materials": [
    { "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }, "doubleSided": true }
  ],
  "animations": [
    {
      "name": "drive",
      "channels": [ { "sampler": 0, "target": { "node": 1, "path": "translation" } } ],
      "samplers": [ { "input": 2, "output": 3, "interpolation": "LINEAR" } ]
    }
  ],
  "buffers": [ { "uri": "city.bin", "byteLength": 76 } ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
    { "buffer": 0, "byteOffset": 44, "byteLength": 8 },
    { "buffer": 0, "byteOffset": 52, "byteLength": 24 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
    { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [2.0] },
    { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
  ]
}"#;

fn city_bin() -> Vec<u8> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let indices: [u16; 3] = [0, 1, 2];
    let times: [f32; 2] = [0.0, 2.0];
    let translations: [[f32; 3]; 2] = [[0.0, 0.0, 0.0], [0.0, 0.0, 8.0]];

    let mut bin = Vec::with_capacity(76);
    bin.extend_from_slice(bytemuck::cast_slice(&positions));
    bin.extend_from_slice(bytemuck::cast_slice(&indices));
    bin.extend_from_slice(&[0, 0]); // align to 4
    bin.extend_from_slice(bytemuck::cast_slice(&times));
    bin.extend_from_slice(bytemuck::cast_slice(&translations));
    assert_eq!(bin.len(), 76);
    bin
}

fn write_city(dir: &Path) -> PathBuf {
    std::fs::write(dir.join("city.bin"), city_bin()).unwrap();
    let path = dir.join("city.gltf");
    std::fs::write(&path, CITY_GLTF).unwrap();
    path
}

#[test]
fn imports_hierarchy_mesh_material_and_clip() {
    let dir = tempfile::tempdir().unwrap();
    let model = import_model(&write_city(dir.path())).unwrap();

    assert_eq!(model.nodes.len(), 2);
    assert_eq!(model.roots, vec![0]);
    assert_eq!(model.nodes[0].children, vec![1]);
    assert_eq!(model.nodes[0].transform.translation, Vec3::new(4.0, 0.0, 0.0));
    assert_eq!(model.nodes[1].mesh, Some(0));

    assert_eq!(model.meshes.len(), 1);
    let prim = &model.meshes[0].primitives[0];
    assert_eq!(prim.indices, vec![0, 1, 2]);
    assert_eq!(prim.material, Some(0));
    // No normals in the file: generated from the winding.
    for v in &prim.vertices {
        assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::Z, 1e-6));
        assert_eq!(v.color, [1.0; 4]);
    }

    assert_eq!(model.materials[0].base_color, [1.0, 0.0, 0.0, 1.0]);
    assert!(model.materials[0].double_sided);
    assert!(model.textures.is_empty());

    assert_eq!(model.clips.len(), 1);
    assert_eq!(model.clips[0].name.as_deref(), Some("drive"));
    assert_eq!(model.clips[0].duration(), 2.0);
}

#[test]
fn loaded_city_animates_at_half_speed_under_scaled_root() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_city(dir.path());

    let mut pending = spawn_model_load(path);
    let deadline = Instant::now() + Duration::from_secs(10);
    let result = loop {
        if let Some(r) = pending.poll() {
            break r;
        }
        assert!(Instant::now() < deadline, "loader never finished");
        std::thread::sleep(Duration::from_millis(5));
    };

    let mut ctx = ViewerContext::new(
        ViewerConfig::default(),
        ViewportSize::from_logical(800, 600, 1.0, 2.0),
    );
    ctx.on_model_loaded(result).unwrap();

    // One second of frame time moves the car a quarter of the way.
    ctx.animation.advance(1.0, &mut ctx.scene);
    let instances = ctx.scene.mesh_instances();
    assert_eq!(instances.len(), 1);
    let origin = instances[0].world.transform_point3(Vec3::ZERO);
    let expected = Vec3::new(4.0, 0.0, 2.0) * 0.025;
    assert!(origin.abs_diff_eq(expected, 1e-6), "{origin} != {expected}");
}

#[test]
fn missing_buffer_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("city.gltf");
    std::fs::write(&path, CITY_GLTF).unwrap();
    assert!(matches!(import_model(&path), Err(LoadError::Import { .. })));
}
