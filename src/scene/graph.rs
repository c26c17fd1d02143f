//! Per-node pose storage and global transform resolution

use glam::Mat4;

use super::Transform;
use crate::document::Document;

/// Current transform of every node for one tick.
///
/// A fresh pose is produced each tick from the document's immutable base
/// transforms (plus whatever the active clip overwrites), so no shared
/// state is ever mutated mid-frame.
#[derive(Clone, Debug)]
pub struct Pose {
    transforms: Vec<Transform>,
}

impl Pose {
    /// The authored rest pose of the document.
    pub fn base(doc: &Document) -> Self {
        Self {
            transforms: doc.nodes.iter().map(|n| n.base).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn get(&self, node: usize) -> Option<&Transform> {
        self.transforms.get(node)
    }

    pub fn get_mut(&mut self, node: usize) -> Option<&mut Transform> {
        self.transforms.get_mut(node)
    }

    /// Local matrix of a node, identity if the index is out of range.
    pub fn local_matrix(&self, node: usize) -> Mat4 {
        self.transforms
            .get(node)
            .map(Transform::to_mat4)
            .unwrap_or(Mat4::IDENTITY)
    }
}

/// Global (model-space) transform of a node: the product of the local
/// matrices from the root of its tree down to the node itself.
///
/// O(depth) per call and uncached; invoked once per joint per frame,
/// which stays cheap at the fixed joint capacity. The walk is bounded by
/// the node count; the loader already rejects cyclic hierarchies, so
/// hitting the bound would be a logic error rather than bad input.
pub fn global_transform(doc: &Document, pose: &Pose, node: usize) -> Mat4 {
    if node >= doc.nodes.len() {
        return Mat4::IDENTITY;
    }

    let mut matrix = pose.local_matrix(node);
    let mut current = doc.nodes[node].parent;
    let mut steps = 0usize;
    while let Some(parent) = current {
        debug_assert!(steps <= doc.nodes.len(), "parent chain longer than node count");
        matrix = pose.local_matrix(parent) * matrix;
        current = doc.nodes[parent].parent;
        steps += 1;
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_support::document_with_chain;
    use glam::Vec3;

    #[test]
    fn test_base_pose_matches_document() {
        let doc = document_with_chain(&[
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ]);
        let pose = Pose::base(&doc);
        assert_eq!(pose.len(), 2);
        assert_eq!(pose.get(0).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_global_transform_is_chain_product() {
        // Three-deep chain of translations
        let offsets = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let doc = document_with_chain(&offsets);
        let pose = Pose::base(&doc);

        let expected = pose.local_matrix(0) * pose.local_matrix(1) * pose.local_matrix(2);
        assert_eq!(global_transform(&doc, &pose, 2), expected);

        let leaf_pos = global_transform(&doc, &pose, 2).w_axis.truncate();
        assert!((leaf_pos - Vec3::new(1.0, 1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_root_global_is_local() {
        let doc = document_with_chain(&[Vec3::new(3.0, 0.0, 0.0)]);
        let pose = Pose::base(&doc);
        assert_eq!(global_transform(&doc, &pose, 0), pose.local_matrix(0));
    }

    #[test]
    fn test_out_of_range_node_is_identity() {
        let doc = document_with_chain(&[Vec3::ZERO]);
        let pose = Pose::base(&doc);
        assert_eq!(global_transform(&doc, &pose, 7), Mat4::IDENTITY);
    }
}
