//! GLB document loading
//!
//! Parses a binary glTF container into immutable in-memory data: the
//! node hierarchy, normalized mesh primitives, skins, and animation
//! clips. Everything is validated here so downstream consumers never
//! branch on per-model quirks; a document that cannot be rendered is
//! rejected outright rather than partially loaded.

pub mod accessor;
pub mod glb;
pub mod json;

use std::path::Path;

use glam::{Mat4, Quat, Vec3};

use crate::animation::{AnimationChannel, AnimationClip, ChannelPath, MAX_JOINTS};
use crate::core::Error;
use crate::scene::Transform;
use accessor::Reader;

/// Fixed interleaved vertex layout shared by every primitive.
///
/// Joint indices are widened to f32 because the shader consumes them as
/// a float vector attribute.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [f32; 4],
    pub weights: [f32; 4],
}

/// One entry in the scene hierarchy.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    /// None for roots; forms a forest, verified at load
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Authored rest transform, immutable after load
    pub base: Transform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

/// One drawable primitive, already normalized into the fixed vertex
/// layout, tagged with the node and skin it belongs to.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
    pub node: usize,
    pub skin: Option<usize>,
}

/// Joint list plus one inverse-bind matrix per joint.
#[derive(Clone, Debug)]
pub struct Skin {
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

/// Immutable scene data produced once by the loader.
#[derive(Debug)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub primitives: Vec<Primitive>,
    pub skins: Vec<Skin>,
    /// Insertion-ordered; looked up by name via `find_animation`
    pub animations: Vec<AnimationClip>,
}

impl Document {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let chunks = glb::split(bytes)?;
        let root: json::Root = serde_json::from_slice(chunks.json)?;
        let reader = Reader::new(&root, chunks.bin)?;

        let nodes = build_nodes(&root)?;
        let skins = build_skins(&root, &reader, nodes.len())?;
        let primitives = build_primitives(&root, &reader, &nodes, skins.len())?;
        let animations = build_animations(&root, &reader, nodes.len())?;

        log::info!(
            "loaded document: {} nodes, {} primitives, {} skins, {} animations",
            nodes.len(),
            primitives.len(),
            skins.len(),
            animations.len()
        );

        Ok(Self {
            nodes,
            primitives,
            skins,
            animations,
        })
    }

    pub fn find_animation(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }

    pub fn animation_names(&self) -> Vec<String> {
        self.animations.iter().map(|a| a.name.clone()).collect()
    }
}

fn base_transform(node: &json::Node) -> Transform {
    if let Some(m) = node.matrix {
        let (scale, rotation, translation) =
            Mat4::from_cols_array(&m).to_scale_rotation_translation();
        return Transform {
            translation,
            rotation: rotation.normalize(),
            scale,
        };
    }
    Transform {
        translation: node.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
        rotation: node
            .rotation
            .map(|[x, y, z, w]| Quat::from_xyzw(x, y, z, w).normalize())
            .unwrap_or(Quat::IDENTITY),
        scale: node.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
    }
}

/// Build the flat node array and its parent pointers in one pass over
/// every node's child list, then verify the hierarchy is a forest.
fn build_nodes(root: &json::Root) -> Result<Vec<Node>, Error> {
    let count = root.nodes.len();
    let mut nodes: Vec<Node> = root
        .nodes
        .iter()
        .map(|n| Node {
            name: n.name.clone(),
            parent: None,
            children: n.children.clone(),
            base: base_transform(n),
            mesh: n.mesh,
            skin: n.skin,
        })
        .collect();

    for parent in 0..count {
        for &child in &root.nodes[parent].children {
            if child >= count {
                return Err(Error::Format(format!(
                    "node {parent} lists child {child}, only {count} nodes exist"
                )));
            }
            if nodes[child].parent.is_some() {
                return Err(Error::Format(format!(
                    "node {child} has more than one parent"
                )));
            }
            nodes[child].parent = Some(parent);
        }
    }

    // A walk longer than the node count can only mean a cycle
    for start in 0..count {
        let mut steps = 0usize;
        let mut current = nodes[start].parent;
        while let Some(parent) = current {
            steps += 1;
            if steps > count {
                return Err(Error::Cycle(start));
            }
            current = nodes[parent].parent;
        }
    }

    Ok(nodes)
}

fn build_skins(
    root: &json::Root,
    reader: &Reader<'_>,
    node_count: usize,
) -> Result<Vec<Skin>, Error> {
    let mut skins = Vec::with_capacity(root.skins.len());
    for (index, skin) in root.skins.iter().enumerate() {
        if skin.joints.len() > MAX_JOINTS {
            return Err(Error::Capacity {
                got: skin.joints.len(),
                max: MAX_JOINTS,
            });
        }
        for &joint in &skin.joints {
            if joint >= node_count {
                return Err(Error::Format(format!(
                    "skin {index}: joint node {joint} out of range"
                )));
            }
        }

        let inverse_bind = match skin.inverse_bind_matrices {
            Some(acc) => {
                let matrices = reader.read_mat4s(acc, "inverseBindMatrices")?;
                if matrices.len() < skin.joints.len() {
                    return Err(Error::Format(format!(
                        "skin {index}: {} inverse bind matrices for {} joints",
                        matrices.len(),
                        skin.joints.len()
                    )));
                }
                matrices[..skin.joints.len()].to_vec()
            }
            None => vec![Mat4::IDENTITY; skin.joints.len()],
        };

        skins.push(Skin {
            joints: skin.joints.clone(),
            inverse_bind,
        });
    }
    Ok(skins)
}

/// Normalize a primitive into the interleaved layout. Present optional
/// attributes are fully validated; absent ones get fixed defaults.
fn build_vertices(reader: &Reader<'_>, prim: &json::Primitive) -> Result<Vec<Vertex>, Error> {
    let position_acc = *prim
        .attributes
        .get("POSITION")
        .ok_or(Error::MissingAttribute("POSITION"))?;
    let positions = reader.read_vec3s(position_acc, "POSITION")?;

    let normals = prim
        .attributes
        .get("NORMAL")
        .map(|&acc| reader.read_vec3s(acc, "NORMAL"))
        .transpose()?;
    let uvs = prim
        .attributes
        .get("TEXCOORD_0")
        .map(|&acc| reader.read_vec2s(acc, "TEXCOORD_0"))
        .transpose()?;
    let joints = prim
        .attributes
        .get("JOINTS_0")
        .map(|&acc| reader.read_joints(acc))
        .transpose()?;
    let weights = prim
        .attributes
        .get("WEIGHTS_0")
        .map(|&acc| reader.read_weights(acc))
        .transpose()?;

    let mut vertices = Vec::with_capacity(positions.len());
    for (i, &position) in positions.iter().enumerate() {
        let normal = normals
            .as_ref()
            .and_then(|n| n.get(i).copied())
            .unwrap_or([0.0, 1.0, 0.0]);
        // Derive a planar projection from the position when the model
        // carries no texture coordinates
        let uv = uvs.as_ref().and_then(|u| u.get(i).copied()).unwrap_or([
            (position[0] + 1.0) / 2.0,
            (position[1] + 1.0) / 2.0,
        ]);
        let joints = joints
            .as_ref()
            .and_then(|j| j.get(i).copied())
            .map(|[a, b, c, d]| [a as f32, b as f32, c as f32, d as f32])
            .unwrap_or([0.0; 4]);
        let weights = weights
            .as_ref()
            .and_then(|w| w.get(i).copied())
            .unwrap_or([0.0; 4]);

        vertices.push(Vertex {
            position,
            normal,
            uv,
            joints,
            weights,
        });
    }
    Ok(vertices)
}

fn build_primitives(
    root: &json::Root,
    reader: &Reader<'_>,
    nodes: &[Node],
    skin_count: usize,
) -> Result<Vec<Primitive>, Error> {
    let mut primitives = Vec::new();
    for (node_index, node) in nodes.iter().enumerate() {
        let Some(mesh_index) = node.mesh else {
            continue;
        };
        let mesh = root.meshes.get(mesh_index).ok_or_else(|| {
            Error::Format(format!("node {node_index}: mesh {mesh_index} out of range"))
        })?;
        if let Some(skin) = node.skin {
            if skin >= skin_count {
                return Err(Error::Format(format!(
                    "node {node_index}: skin {skin} out of range"
                )));
            }
        }

        for prim in &mesh.primitives {
            let vertices = build_vertices(reader, prim)?;
            let indices = match prim.indices {
                Some(acc) => {
                    let indices = reader.read_indices(acc)?;
                    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                        return Err(Error::Format(format!(
                            "index {bad} out of range for {} vertices",
                            vertices.len()
                        )));
                    }
                    Some(indices)
                }
                None => None,
            };
            primitives.push(Primitive {
                vertices,
                indices,
                node: node_index,
                skin: node.skin,
            });
        }
    }

    if primitives.is_empty() {
        return Err(Error::Format("no meshes in document".into()));
    }
    Ok(primitives)
}

fn build_animations(
    root: &json::Root,
    reader: &Reader<'_>,
    node_count: usize,
) -> Result<Vec<AnimationClip>, Error> {
    let mut clips = Vec::new();
    for (anim_index, anim) in root.animations.iter().enumerate() {
        let mut channels = Vec::new();
        for channel in &anim.channels {
            // Channels without a target node drive nothing we render
            let Some(node) = channel.target.node else {
                continue;
            };
            if node >= node_count {
                return Err(Error::Format(format!(
                    "animation {anim_index}: channel targets node {node} out of range"
                )));
            }
            let Some(path) = ChannelPath::parse(&channel.target.path) else {
                log::warn!(
                    "animation {anim_index}: skipping unsupported target path '{}'",
                    channel.target.path
                );
                continue;
            };

            let sampler = anim.samplers.get(channel.sampler).ok_or_else(|| {
                Error::Format(format!(
                    "animation {anim_index}: sampler {} out of range",
                    channel.sampler
                ))
            })?;
            if sampler.interpolation.as_deref() == Some("CUBICSPLINE") {
                return Err(Error::Format(format!(
                    "animation {anim_index}: cubic spline interpolation unsupported"
                )));
            }

            let timestamps = reader.read_floats(sampler.input, "keyframe times", "SCALAR")?;
            if timestamps.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::Format(format!(
                    "animation {anim_index}: keyframe times not strictly increasing"
                )));
            }

            let element_type = if path == ChannelPath::Rotation {
                "VEC4"
            } else {
                "VEC3"
            };
            let values = reader.read_floats(sampler.output, "keyframe values", element_type)?;
            if values.len() != timestamps.len() * path.components() {
                return Err(Error::Format(format!(
                    "animation {anim_index}: {} values for {} keyframes",
                    values.len(),
                    timestamps.len()
                )));
            }

            channels.push(AnimationChannel {
                node,
                path,
                timestamps,
                values,
            });
        }

        if channels.is_empty() {
            continue;
        }

        let name = anim
            .name
            .clone()
            .unwrap_or_else(|| format!("animation_{}", clips.len()));
        let clip = AnimationClip::new(name, channels);
        log::info!(
            "loaded animation: {} (duration: {:.2}s, channels: {})",
            clip.name,
            clip.duration,
            clip.channels.len()
        );
        clips.push(clip);
    }
    Ok(clips)
}

#[cfg(test)]
pub mod test_support {
    //! Synthetic documents and GLB containers shared across module tests.

    use super::*;
    use crate::animation::{AnimationChannel, AnimationClip, ChannelPath};

    fn bare_node(base: Transform, parent: Option<usize>) -> Node {
        Node {
            name: None,
            parent,
            children: Vec::new(),
            base,
            mesh: None,
            skin: None,
        }
    }

    /// A single parent chain: node i is the parent of node i+1, each
    /// translated by the given offset.
    pub fn document_with_chain(offsets: &[Vec3]) -> Document {
        let nodes = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| {
                bare_node(
                    Transform {
                        translation: offset,
                        ..Transform::IDENTITY
                    },
                    if i == 0 { None } else { Some(i - 1) },
                )
            })
            .collect();
        Document {
            nodes,
            primitives: Vec::new(),
            skins: Vec::new(),
            animations: Vec::new(),
        }
    }

    /// Two identity root joints with an identity-inverse-bind skin.
    pub fn two_joint_rig() -> (Document, Skin) {
        let doc = Document {
            nodes: vec![
                bare_node(Transform::IDENTITY, None),
                bare_node(Transform::IDENTITY, None),
            ],
            primitives: Vec::new(),
            skins: Vec::new(),
            animations: Vec::new(),
        };
        let skin = Skin {
            joints: vec![0, 1],
            inverse_bind: vec![Mat4::IDENTITY, Mat4::IDENTITY],
        };
        (doc, skin)
    }

    /// One node with base translation (1,0,0) and a clip of the given
    /// name moving it from x=0 to x=10 over one second.
    pub fn document_with_clip(name: &str) -> Document {
        let channel = AnimationChannel {
            node: 0,
            path: ChannelPath::Translation,
            timestamps: vec![0.0, 1.0],
            values: vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0],
        };
        Document {
            nodes: vec![bare_node(
                Transform {
                    translation: Vec3::new(1.0, 0.0, 0.0),
                    ..Transform::IDENTITY
                },
                None,
            )],
            primitives: Vec::new(),
            skins: Vec::new(),
            animations: vec![AnimationClip::new(name, vec![channel])],
        }
    }

    /// Append raw bytes at 4-byte alignment; returns (offset, length).
    pub struct BinBuilder {
        pub bytes: Vec<u8>,
    }

    impl BinBuilder {
        pub fn new() -> Self {
            Self { bytes: Vec::new() }
        }

        pub fn push(&mut self, data: &[u8]) -> (usize, usize) {
            while self.bytes.len() % 4 != 0 {
                self.bytes.push(0);
            }
            let offset = self.bytes.len();
            self.bytes.extend_from_slice(data);
            (offset, data.len())
        }

        pub fn push_f32s(&mut self, values: &[f32]) -> (usize, usize) {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            self.push(&bytes)
        }

        pub fn push_u16s(&mut self, values: &[u16]) -> (usize, usize) {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            self.push(&bytes)
        }
    }

    /// Assemble a GLB container from a JSON value and a binary payload.
    pub fn build_glb(json: &serde_json::Value, bin: &[u8]) -> Vec<u8> {
        glb::assemble(json.to_string().as_bytes(), bin)
    }
}
