//! Serde view of the glTF JSON chunk
//!
//! Only the subset the loader consumes is modeled; unknown fields are
//! ignored by serde. Index fields stay raw `usize`s here and are bounds
//! checked when the document is built.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level glTF document description.
#[derive(Debug, Default, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub skins: Vec<Skin>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default, rename = "bufferViews")]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    /// Quaternion as (x, y, z, w)
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    /// Column-major matrix, mutually exclusive with TRS in authored files
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub mesh: Option<usize>,
    #[serde(default)]
    pub skin: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Deserialize)]
pub struct Primitive {
    #[serde(default)]
    pub attributes: HashMap<String, usize>,
    #[serde(default)]
    pub indices: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Skin {
    #[serde(default)]
    pub joints: Vec<usize>,
    #[serde(default, rename = "inverseBindMatrices")]
    pub inverse_bind_matrices: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Animation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub samplers: Vec<Sampler>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub sampler: usize,
    pub target: Target,
}

#[derive(Debug, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub node: Option<usize>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Sampler {
    pub input: usize,
    pub output: usize,
    #[serde(default)]
    pub interpolation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Accessor {
    #[serde(default, rename = "bufferView")]
    pub buffer_view: Option<usize>,
    #[serde(default, rename = "byteOffset")]
    pub byte_offset: usize,
    #[serde(rename = "componentType")]
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub normalized: bool,
}

#[derive(Debug, Deserialize)]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default, rename = "byteOffset")]
    pub byte_offset: usize,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(default, rename = "byteStride")]
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Buffer {
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(default)]
    pub uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_root() {
        let root: Root = serde_json::from_str(r#"{"asset":{"version":"2.0"}}"#).unwrap();
        assert!(root.nodes.is_empty());
        assert!(root.meshes.is_empty());
    }

    #[test]
    fn test_parse_node_trs() {
        let json = r#"{
            "nodes": [{
                "name": "joint",
                "translation": [1.0, 2.0, 3.0],
                "rotation": [0.0, 0.0, 0.0, 1.0],
                "children": [1]
            }, {}]
        }"#;
        let root: Root = serde_json::from_str(json).unwrap();
        assert_eq!(root.nodes.len(), 2);
        assert_eq!(root.nodes[0].translation, Some([1.0, 2.0, 3.0]));
        assert_eq!(root.nodes[0].children, vec![1]);
        assert!(root.nodes[1].translation.is_none());
    }

    #[test]
    fn test_parse_accessor() {
        let json = r#"{
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3"
            }]
        }"#;
        let root: Root = serde_json::from_str(json).unwrap();
        let acc = &root.accessors[0];
        assert_eq!(acc.buffer_view, Some(0));
        assert_eq!(acc.component_type, 5126);
        assert_eq!(acc.byte_offset, 0);
        assert_eq!(acc.element_type, "VEC3");
        assert!(!acc.normalized);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"scenes": [{"nodes": [0]}], "scene": 0, "nodes": [{}]}"#;
        let root: Root = serde_json::from_str(json).unwrap();
        assert_eq!(root.nodes.len(), 1);
    }
}
