//! Ordered tree of composited rectangles.
//!
//! The root covers the output and paints the background; its children are
//! the windows, bottom to top. Sibling order is the only z-order
//! representation. Nodes live in an arena and link to each other by index,
//! so the stack can hold plain [`NodeId`]s without aliasing.

use bitflags::bitflags;

use crate::error::{Result, StackError};
use crate::geometry::{Rect, subtract_all};
use crate::window::WindowId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegionFlags: u8 {
        /// Takes part in hit testing.
        const INPUT = 1 << 0;
        /// Takes part in composition.
        const OUTPUT = 1 << 1;
        /// Currently shown. Inactive nodes neither paint nor occlude.
        const ACTIVE = 1 << 2;
        /// Fully covers what is below it.
        const OPAQUE = 1 << 3;
        /// Content defines its own shape; never occludes.
        const SHAPED = 1 << 4;
    }
}

/// What a node paints when it is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionClass {
    Background,
    Window(WindowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct RegionNode {
    pub class: RegionClass,
    pub flags: RegionFlags,
    /// Geometry relative to the parent's origin.
    pub rect: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl RegionNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children bottom to top.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn occludes(&self) -> bool {
        self.flags
            .contains(RegionFlags::ACTIVE | RegionFlags::OUTPUT | RegionFlags::OPAQUE)
            && !self.flags.contains(RegionFlags::SHAPED)
    }
}

#[derive(Debug)]
pub struct RegionTree {
    nodes: Vec<Option<RegionNode>>,
    free: Vec<usize>,
    live: usize,
    limit: usize,
}

impl RegionTree {
    pub fn new(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            live: 0,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&RegionNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut RegionNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Create a node on top of `parent`'s children (or a new root).
    pub fn create(
        &mut self,
        class: RegionClass,
        flags: RegionFlags,
        rect: Rect,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if self.live >= self.limit {
            return Err(StackError::ResourceExhaustion(format!(
                "region limit of {} nodes reached",
                self.limit
            )));
        }
        if let Some(parent) = parent {
            let Some(node) = self.get_mut(parent) else {
                return Err(StackError::not_found(format!("parent region {parent:?}")));
            };
            node.children
                .try_reserve(1)
                .map_err(|e| StackError::ResourceExhaustion(e.to_string()))?;
        }
        let node = RegionNode {
            class,
            flags,
            rect,
            parent,
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes
                    .try_reserve(1)
                    .map_err(|e| StackError::ResourceExhaustion(e.to_string()))?;
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        self.live += 1;
        if let Some(parent) = parent
            && let Some(node) = self.get_mut(parent)
        {
            node.children.push(id);
        }
        Ok(id)
    }

    /// Destroy `id` and its whole subtree.
    pub fn destroy(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        self.live -= 1;
        self.free.push(id.0);
        if let Some(parent) = node.parent
            && let Some(parent) = self.get_mut(parent)
        {
            parent.children.retain(|child| *child != id);
        }
        for child in node.children {
            // Unlink first so the recursive call does not touch our (gone) vec.
            if let Some(child_node) = self.get_mut(child) {
                child_node.parent = None;
            }
            self.destroy(child);
        }
    }

    pub fn enable(&mut self, id: NodeId, flags: RegionFlags) {
        if let Some(node) = self.get_mut(id) {
            node.flags.insert(flags);
        }
    }

    pub fn disable(&mut self, id: NodeId, flags: RegionFlags) {
        if let Some(node) = self.get_mut(id) {
            node.flags.remove(flags);
        }
    }

    pub fn set_flags(&mut self, id: NodeId, flags: RegionFlags, enabled: bool) {
        if let Some(node) = self.get_mut(id) {
            node.flags.set(flags, enabled);
        }
    }

    pub fn move_to(&mut self, id: NodeId, x: i32, y: i32) {
        if let Some(node) = self.get_mut(id) {
            node.rect.x = x;
            node.rect.y = y;
        }
    }

    pub fn resize(&mut self, id: NodeId, width: i32, height: i32) {
        if let Some(node) = self.get_mut(id) {
            node.rect.width = width;
            node.rect.height = height;
        }
    }

    /// Position of `id` among its siblings, bottom = 0.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self.get(parent)?
            .children
            .iter()
            .position(|child| *child == id)
    }

    /// Move `id` to `index` among its siblings (clamped to the top).
    pub fn restack(&mut self, id: NodeId, index: usize) {
        let Some(parent) = self.get(id).and_then(|node| node.parent) else {
            return;
        };
        let Some(parent) = self.get_mut(parent) else {
            return;
        };
        let Some(old) = parent.children.iter().position(|child| *child == id) else {
            return;
        };
        parent.children.remove(old);
        let index = index.min(parent.children.len());
        parent.children.insert(index, id);
    }

    /// Geometry of `id` in root coordinates.
    pub fn absolute_rect(&self, id: NodeId) -> Rect {
        let Some(node) = self.get(id) else {
            return Rect::default();
        };
        let mut rect = node.rect;
        let mut parent = node.parent;
        while let Some(pid) = parent {
            let Some(p) = self.get(pid) else { break };
            rect = rect.translate(p.rect.x, p.rect.y);
            parent = p.parent;
        }
        rect
    }

    /// Absolute geometry of `id` clipped by all of its ancestors.
    fn clip_rect(&self, id: NodeId) -> Option<Rect> {
        let mut clip = self.absolute_rect(id);
        let mut parent = self.get(id)?.parent;
        while let Some(pid) = parent {
            clip = clip.intersection(&self.absolute_rect(pid))?;
            parent = self.get(pid)?.parent;
        }
        (!clip.is_empty()).then_some(clip)
    }

    /// Absolute rectangles of every opaque node stacked above `id` at any level.
    fn occluders(&self, id: NodeId) -> Vec<Rect> {
        let mut holes = Vec::new();
        let mut current = id;
        while let Some(parent) = self.get(current).and_then(|node| node.parent) {
            let Some(siblings) = self.get(parent).map(|node| &node.children) else {
                break;
            };
            if let Some(pos) = siblings.iter().position(|child| *child == current) {
                for &above in &siblings[pos + 1..] {
                    if self.get(above).is_some_and(RegionNode::occludes) {
                        holes.push(self.absolute_rect(above));
                    }
                }
            }
            current = parent;
        }
        holes
    }

    /// Disjoint parts of `rect` (root coordinates) where `id` is not covered
    /// by opaque nodes above it. `None` when more than `max` pieces result.
    pub fn visible(&self, id: NodeId, rect: Rect, max: usize) -> Option<Vec<Rect>> {
        let Some(clip) = self.clip_rect(id).and_then(|clip| clip.intersection(&rect)) else {
            return Some(Vec::new());
        };
        let mut pieces = vec![clip];
        for hole in self.occluders(id) {
            subtract_all(&mut pieces, &hole);
            if pieces.is_empty() {
                break;
            }
        }
        (pieces.len() <= max).then_some(pieces)
    }

    /// Fast path: nothing opaque above `id` touches `rect`.
    pub fn fully_visible(&self, id: NodeId, rect: Rect) -> bool {
        let Some(clip) = self.clip_rect(id).and_then(|clip| clip.intersection(&rect)) else {
            return false;
        };
        self.occluders(id).iter().all(|hole| !hole.intersects(&clip))
    }

    /// Composite `rect` (root coordinates) starting at `id`.
    ///
    /// `paint` is called back to front for every active, output-enabled node
    /// in the subtree, once per disjoint piece of the node that is inside
    /// `rect` and not covered by an opaque node above it (its own opaque
    /// children included).
    pub fn update<F>(&self, id: NodeId, rect: Rect, paint: &mut F)
    where
        F: FnMut(&RegionNode, Rect),
    {
        let Some(node) = self.get(id) else {
            return;
        };
        if !node.flags.contains(RegionFlags::ACTIVE) {
            return;
        }
        let Some(clip) = self.clip_rect(id).and_then(|clip| clip.intersection(&rect)) else {
            return;
        };
        if node.flags.contains(RegionFlags::OUTPUT) {
            let mut pieces = vec![clip];
            let own_holes = node
                .children
                .iter()
                .filter(|child| self.get(**child).is_some_and(RegionNode::occludes))
                .map(|child| self.absolute_rect(*child));
            for hole in self.occluders(id).into_iter().chain(own_holes) {
                subtract_all(&mut pieces, &hole);
            }
            for piece in pieces {
                paint(node, piece);
            }
        }
        for &child in &node.children {
            self.update(child, clip, paint);
        }
    }
}
