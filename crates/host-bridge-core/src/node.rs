//! Host children as handed over by the reconciler, and their flattening.
//!
//! Composite nodes (components that render other nodes) have no native
//! counterpart. Flattening expands them in child order and keeps only the
//! view and text leaves, which is what the native side is told about.

use crate::tag::Tag;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeafKind {
    View,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostLeaf {
    pub kind: LeafKind,
    pub tag: Tag,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostNode {
    View(Tag),
    Text(Tag),
    Composite(Vec<HostNode>),
}

impl HostNode {
    pub fn composite(children: impl IntoIterator<Item = HostNode>) -> Self {
        HostNode::Composite(children.into_iter().collect())
    }

    pub fn leaf(&self) -> Option<HostLeaf> {
        match self {
            HostNode::View(tag) => Some(HostLeaf {
                kind: LeafKind::View,
                tag: *tag,
            }),
            HostNode::Text(tag) => Some(HostLeaf {
                kind: LeafKind::Text,
                tag: *tag,
            }),
            HostNode::Composite(_) => None,
        }
    }

    /// Leaves of this node in render order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }
}

/// Depth-first, in-order iterator over the leaves of a host node.
pub struct Leaves<'a> {
    stack: Vec<&'a HostNode>,
}

impl Iterator for Leaves<'_> {
    type Item = HostLeaf;

    fn next(&mut self) -> Option<HostLeaf> {
        while let Some(node) = self.stack.pop() {
            match node {
                HostNode::View(_) | HostNode::Text(_) => return node.leaf(),
                HostNode::Composite(children) => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}

/// Tags of all leaves under `children`, in render order.
pub fn flatten_children<'a>(children: impl IntoIterator<Item = &'a HostNode>) -> Vec<Tag> {
    children
        .into_iter()
        .flat_map(HostNode::leaves)
        .map(|leaf| leaf.tag)
        .collect()
}

/// Like [`flatten_children`] but keeps the leaf kind alongside each tag.
pub fn flatten_leaves<'a>(children: impl IntoIterator<Item = &'a HostNode>) -> Vec<HostLeaf> {
    children.into_iter().flat_map(HostNode::leaves).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_composites_flatten_to_nothing() {
        let tree = HostNode::composite([
            HostNode::Composite(Vec::new()),
            HostNode::composite([HostNode::Composite(Vec::new())]),
        ]);
        assert!(flatten_children([&tree]).is_empty());
        assert!(flatten_children(&[] as &[HostNode]).is_empty());
    }

    #[test]
    fn single_leaf_flattens_to_its_tag() {
        assert_eq!(flatten_children([&HostNode::View(Tag(7))]), vec![Tag(7)]);
    }

    #[test]
    fn nested_composites_keep_sibling_order() {
        let children = vec![
            HostNode::View(Tag(2)),
            HostNode::composite([
                HostNode::composite([HostNode::Text(Tag(3)), HostNode::View(Tag(4))]),
                HostNode::View(Tag(5)),
            ]),
            HostNode::Text(Tag(6)),
        ];
        assert_eq!(
            flatten_children(&children),
            vec![Tag(2), Tag(3), Tag(4), Tag(5), Tag(6)]
        );
        let kinds: Vec<LeafKind> = flatten_leaves(&children)
            .into_iter()
            .map(|leaf| leaf.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LeafKind::View,
                LeafKind::Text,
                LeafKind::View,
                LeafKind::View,
                LeafKind::Text
            ]
        );
    }

    #[test]
    fn leaves_iterator_is_lazy_and_stops() {
        let tree = HostNode::composite((0..1000).map(|i| HostNode::View(Tag(i))));
        let first: Vec<Tag> = tree.leaves().take(3).map(|leaf| leaf.tag).collect();
        assert_eq!(first, vec![Tag(0), Tag(1), Tag(2)]);
    }
}
