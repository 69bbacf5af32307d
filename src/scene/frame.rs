//! Frame hierarchy
//!
//! The skeleton is built from an external tree of named frames. The tree is
//! consumed through [`FrameHierarchy`], an arena + index view with
//! first-child / next-sibling links. [`FrameTree`] is a minimal owned
//! implementation for tools and tests that have no scene graph of their own.

use glam::Affine3A;

use crate::scene::pose::BoneTransform;

/// Index of a frame inside a [`FrameHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

/// Read-only view of a frame tree.
///
/// Only used while building a [`Skeleton`](crate::scene::skeleton::Skeleton);
/// the skeleton keeps [`FrameId`] back-references, never the frames themselves.
pub trait FrameHierarchy {
    fn first_child(&self, frame: FrameId) -> Option<FrameId>;

    fn next_sibling(&self, frame: FrameId) -> Option<FrameId>;

    fn parent(&self, frame: FrameId) -> Option<FrameId>;

    /// Transform relative to the parent frame.
    fn local_transform(&self, frame: FrameId) -> Affine3A;

    fn name(&self, frame: FrameId) -> &str;

    /// Transform relative to the tree root's space.
    ///
    /// The default walks the parent chain; implementations with cached world
    /// matrices should override it.
    fn world_transform(&self, frame: FrameId) -> Affine3A {
        let mut world = self.local_transform(frame);
        let mut current = self.parent(frame);
        while let Some(parent) = current {
            world = self.local_transform(parent) * world;
            current = self.parent(parent);
        }
        world
    }
}

/// A node in a [`FrameTree`].
#[derive(Debug, Clone)]
pub struct FrameNode {
    pub name: String,
    pub transform: BoneTransform,
    parent: Option<FrameId>,
    first_child: Option<FrameId>,
    last_child: Option<FrameId>,
    next_sibling: Option<FrameId>,
}

impl FrameNode {
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }
}

/// Flat arena of named frames linked as a first-child / next-sibling tree.
#[derive(Debug, Clone, Default)]
pub struct FrameTree {
    nodes: Vec<FrameNode>,
}

impl FrameTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame as the last child of `parent` (or as a new root).
    ///
    /// A `parent` that does not belong to this tree is ignored and the frame
    /// becomes a root.
    pub fn add_frame(
        &mut self,
        name: impl Into<String>,
        transform: BoneTransform,
        parent: Option<FrameId>,
    ) -> FrameId {
        let id = FrameId(self.nodes.len());
        let parent = parent.filter(|p| {
            let valid = p.0 < self.nodes.len();
            if !valid {
                log::warn!("FrameTree: parent {p:?} does not exist, adding {id:?} as a root");
            }
            valid
        });

        self.nodes.push(FrameNode {
            name: name.into(),
            transform,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
        });

        if let Some(parent) = parent {
            let previous_last = self.nodes[parent.0].last_child.replace(id);
            match previous_last {
                Some(sibling) => self.nodes[sibling.0].next_sibling = Some(id),
                None => self.nodes[parent.0].first_child = Some(id),
            }
        }

        id
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&FrameNode> {
        self.nodes.get(id.0)
    }

    #[inline]
    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut FrameNode> {
        self.nodes.get_mut(id.0)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<FrameId> {
        self.nodes.iter().position(|n| n.name == name).map(FrameId)
    }
}

impl FrameHierarchy for FrameTree {
    fn first_child(&self, frame: FrameId) -> Option<FrameId> {
        self.get(frame).and_then(|n| n.first_child)
    }

    fn next_sibling(&self, frame: FrameId) -> Option<FrameId> {
        self.get(frame).and_then(|n| n.next_sibling)
    }

    fn parent(&self, frame: FrameId) -> Option<FrameId> {
        self.get(frame).and_then(|n| n.parent)
    }

    fn local_transform(&self, frame: FrameId) -> Affine3A {
        self.get(frame)
            .map_or(Affine3A::IDENTITY, |n| n.transform.to_affine())
    }

    fn name(&self, frame: FrameId) -> &str {
        self.get(frame).map_or("", |n| n.name.as_str())
    }
}
