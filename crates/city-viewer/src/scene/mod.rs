//! Scene graph host.
//!
//! Owns the node hierarchy, the CPU copies of mesh/material/texture data
//! the nodes reference, the lights and the background colour. Nodes live in
//! an arena and are addressed by [`NodeId`].

pub mod light;
pub mod transform;

pub use light::{AmbientLight, Color, DirectionalLight};
pub use transform::Transform;

use crate::data::model::{LoadedModel, MaterialData, MeshData, TextureData};
use glam::Mat4;

/// Handle to a node in a [`SceneGraph`] (or, before insertion, an index
/// into a [`LoadedModel`]'s node list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn from_index(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Index into [`SceneGraph::meshes`].
    pub mesh: Option<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: Some(name.into()),
            transform,
            ..Self::default()
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A mesh to draw with its world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    pub node: NodeId,
    pub mesh: usize,
    pub world: Mat4,
}

/// Result of inserting a [`LoadedModel`].
#[derive(Debug, Clone)]
pub struct InsertedModel {
    /// Node carrying the import scale; parent of the model's roots.
    pub root: NodeId,
    /// Scene node for each model node, by model index.
    pub node_map: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub background: Color,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    meshes: Vec<MeshData>,
    materials: Vec<MaterialData>,
    textures: Vec<TextureData>,
}

impl SceneGraph {
    pub fn new(background: Color, ambient: AmbientLight, directional: DirectionalLight) -> Self {
        Self {
            background,
            ambient,
            directional,
            nodes: Vec::new(),
            roots: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Adds `node` under `parent`, or as a root when `parent` is `None`.
    pub fn add_node(&mut self, mut node: SceneNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn materials(&self) -> &[MaterialData] {
        &self.materials
    }

    pub fn textures(&self) -> &[TextureData] {
        &self.textures
    }

    /// Inserts a loaded model's hierarchy under a new root node scaled
    /// uniformly by `scale`, taking ownership of its mesh, material and
    /// texture data.
    ///
    /// Animation clips are left in `model`; retarget them with the returned
    /// `node_map`.
    pub fn insert_model(&mut self, model: &mut LoadedModel, scale: f32) -> InsertedModel {
        let mesh_base = self.meshes.len();
        let material_base = self.materials.len();
        let texture_base = self.textures.len();

        self.textures.append(&mut model.textures);
        self.materials.extend(model.materials.drain(..).map(|mut m| {
            m.base_color_texture = m.base_color_texture.map(|t| t + texture_base);
            m
        }));
        self.meshes.extend(model.meshes.drain(..).map(|mut mesh| {
            for p in &mut mesh.primitives {
                p.material = p.material.map(|m| m + material_base);
            }
            mesh
        }));

        let root = self.add_node(
            SceneNode::new("model-root", Transform::from_uniform_scale(scale)),
            None,
        );

        // Allocate ids first so children can be linked in any order.
        let node_base = self.nodes.len();
        let node_map: Vec<NodeId> = (0..model.nodes.len()).map(|i| NodeId(node_base + i)).collect();
        for src in &model.nodes {
            self.nodes.push(SceneNode {
                name: src.name.clone(),
                transform: src.transform,
                mesh: src.mesh.map(|m| m + mesh_base),
                parent: None,
                children: src.children.iter().filter_map(|&c| node_map.get(c).copied()).collect(),
            });
        }
        for (i, src) in model.nodes.iter().enumerate() {
            for &c in &src.children {
                if let Some(child) = self.nodes.get_mut(node_base + c) {
                    child.parent = Some(node_map[i]);
                }
            }
        }
        for &r in &model.roots {
            if let Some(&id) = node_map.get(r) {
                self.nodes[id.0].parent = Some(root);
                self.nodes[root.0].children.push(id);
            }
        }

        InsertedModel { root, node_map }
    }

    /// Walks the hierarchy from the roots and collects every mesh-bearing
    /// node with its world matrix. Nodes unreachable from a root are skipped.
    pub fn mesh_instances(&self) -> Vec<MeshInstance> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, Mat4)> =
            self.roots.iter().rev().map(|&r| (r, Mat4::IDENTITY)).collect();
        let mut visited = vec![false; self.nodes.len()];

        while let Some((id, parent_world)) = stack.pop() {
            if std::mem::replace(&mut visited[id.0], true) {
                log::warn!("Scene node {} reached twice; hierarchy has a cycle", id.0);
                continue;
            }
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();
            if let Some(mesh) = node.mesh {
                out.push(MeshInstance { node: id, mesh, world });
            }
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }
        out
    }

    /// World matrix of a single node.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id.0)?;
        let mut world = node.transform.matrix();
        let mut hops = 0;
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            world = node.transform.matrix() * world;
            hops += 1;
            if hops > self.nodes.len() {
                return None;
            }
        }
        Some(world)
    }
}

#[cfg(test)]
pub(crate) fn test_scene() -> SceneGraph {
    SceneGraph::new(
        Color::from_srgb_hex(0x87ceeb),
        AmbientLight { color: Color::WHITE, intensity: 2.4 },
        DirectionalLight {
            color: Color::WHITE,
            intensity: 1.8,
            position: glam::Vec3::Y,
            target: glam::Vec3::ZERO,
        },
    )
}
