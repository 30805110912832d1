//! The node tree.
//!
//! Every space owns at most one [`Tree`]: a proper binary tree (every
//! internal node has exactly two children) whose leaves hold windows, plus a
//! doubly linked monocle list that can live either at the root (monocle
//! spaces) or embedded in a leaf (`NodeKind::Link`).
//!
//! Nodes live in a slotmap arena; parent references are plain keys, so the
//! parent/child cycle carries no ownership. Container geometry is stored on
//! nodes but computed by [`crate::layout::container`].

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::common::collections::HashSet;
use crate::model::window::WindowId;
use crate::sys::geometry::{Point, Rect};

slotmap::new_key_type! {
    pub struct NodeId;
    pub struct LinkId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Side-by-side children, split along a vertical line.
    Vertical,
    /// Stacked children, split along a horizontal line.
    Horizontal,
}

impl Orientation {
    pub fn toggled(self) -> Orientation {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An ordinary tree node.
    #[default]
    Tree,
    /// A leaf that carries a monocle sub-list.
    Link,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl TryFrom<i64> for Rotation {
    type Error = ();

    fn try_from(value: i64) -> Result<Self, ()> {
        match value {
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// `Some` on an occupied leaf; `Some` on an internal node means a
    /// zoom override (render only that window at this container).
    pub window: Option<WindowId>,
    pub kind: NodeKind,
    pub container: Rect,
    pub split: Option<Orientation>,
    pub ratio: f64,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) list: Option<LinkId>,
}

impl Node {
    fn leaf(window: Option<WindowId>, ratio: f64) -> Node {
        Node {
            window,
            kind: NodeKind::Tree,
            container: Rect::default(),
            split: None,
            ratio,
            parent: None,
            left: None,
            right: None,
            list: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkNode {
    pub window: WindowId,
    pub container: Rect,
    pub(crate) prev: Option<LinkId>,
    pub(crate) next: Option<LinkId>,
}

/// Outcome of removing a window's leaf from the BSP tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    NotFound,
    /// The removed leaf was the only node; the caller should drop the tree.
    TreeEmpty,
    /// The sibling subtree was promoted; containers below the returned node
    /// need recomputing.
    Spliced(NodeId),
}

/// Outcome of removing a window from a monocle list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkRemoveOutcome {
    NotFound,
    Removed,
    /// The holding node's list is now empty.
    ListEmptied(NodeId),
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: SlotMap<NodeId, Node>,
    links: SlotMap<LinkId, LinkNode>,
    root: NodeId,
}

impl Tree {
    /// Creates a tree consisting of a single empty leaf.
    pub fn new(ratio: f64) -> Tree {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::leaf(None, ratio));
        Tree {
            nodes,
            links: SlotMap::with_key(),
            root,
        }
    }

    pub fn root(&self) -> NodeId { self.root }

    pub fn node(&self, id: NodeId) -> Option<&Node> { self.nodes.get(id) }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> { self.nodes.get_mut(id) }

    pub fn link(&self, id: LinkId) -> Option<&LinkNode> { self.links.get(id) }

    pub(crate) fn link_mut(&mut self, id: LinkId) -> Option<&mut LinkNode> {
        self.links.get_mut(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> { self.nodes.get(id).and_then(|n| n.parent) }

    pub fn left(&self, id: NodeId) -> Option<NodeId> { self.nodes.get(id).and_then(|n| n.left) }

    pub fn right(&self, id: NodeId) -> Option<NodeId> { self.nodes.get(id).and_then(|n| n.right) }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes.get(id).map(|n| n.left.is_none() && n.right.is_none()).unwrap_or(false)
    }

    /// An empty placeholder slot.
    pub fn is_pseudo(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .map(|n| {
                n.left.is_none() && n.right.is_none() && n.window.is_none() && n.list.is_none()
            })
            .unwrap_or(false)
    }

    pub fn is_left_child(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.left == Some(id))
            .unwrap_or(false)
    }

    pub fn is_right_child(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.right == Some(id))
            .unwrap_or(false)
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    /// Leftmost leaf of the subtree rooted at `from`.
    pub fn first_leaf(&self, from: NodeId) -> NodeId {
        let mut node = from;
        while let Some(left) = self.left(node) {
            node = left;
        }
        node
    }

    /// Rightmost leaf of the subtree rooted at `from`.
    pub fn last_leaf(&self, from: NodeId) -> NodeId {
        let mut node = from;
        while let Some(right) = self.right(node) {
            node = right;
        }
        node
    }

    /// In-order successor leaf, or `None` at the tree's right edge.
    pub fn nearest_leaf_right(&self, id: NodeId) -> Option<NodeId> {
        let mut node = id;
        loop {
            let parent = self.parent(node)?;
            if self.right(parent) == Some(node) {
                node = parent;
                continue;
            }
            let right = self.right(parent)?;
            return Some(self.first_leaf(right));
        }
    }

    /// In-order predecessor leaf, or `None` at the tree's left edge.
    pub fn nearest_leaf_left(&self, id: NodeId) -> Option<NodeId> {
        let mut node = id;
        loop {
            let parent = self.parent(node)?;
            if self.left(parent) == Some(node) {
                node = parent;
                continue;
            }
            let left = self.left(parent)?;
            return Some(self.last_leaf(left));
        }
    }

    /// All leaves in order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(self.first_leaf(self.root));
        while let Some(leaf) = current {
            out.push(leaf);
            current = self.nearest_leaf_right(leaf);
        }
        out
    }

    /// Breadth-first search for the shallowest leaf. The tree is proper, so
    /// this always finds one.
    pub fn min_depth_leaf(&self) -> NodeId {
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(self.root);
        while let Some(node) = queue.pop_front() {
            if self.is_leaf(node) {
                return node;
            }
            if let Some(left) = self.left(node) {
                queue.push_back(left);
            }
            if let Some(right) = self.right(node) {
                queue.push_back(right);
            }
        }
        debug_assert!(false, "proper tree without a leaf");
        self.root
    }

    pub fn first_pseudo_leaf(&self) -> Option<NodeId> {
        self.leaves().into_iter().find(|&leaf| self.is_pseudo(leaf))
    }

    pub fn leaf_for_window(&self, window: WindowId) -> Option<NodeId> {
        self.leaves().into_iter().find(|&leaf| {
            self.nodes.get(leaf).map(|n| n.window == Some(window)).unwrap_or(false)
        })
    }

    pub fn link_for_window(&self, window: WindowId) -> Option<(NodeId, LinkId)> {
        for leaf in self.leaves() {
            let mut cursor = self.nodes.get(leaf).and_then(|n| n.list);
            while let Some(link) = cursor {
                let node = self.links.get(link)?;
                if node.window == window {
                    return Some((leaf, link));
                }
                cursor = node.next;
            }
        }
        None
    }

    /// The leaf that owns `window`, whether it sits in the leaf itself or in
    /// the leaf's monocle sub-list.
    pub fn node_for_window(&self, window: WindowId) -> Option<NodeId> {
        self.leaf_for_window(window)
            .or_else(|| self.link_for_window(window).map(|(node, _)| node))
    }

    pub fn leaf_at_point(&self, point: Point) -> Option<NodeId> {
        self.leaves().into_iter().find(|&leaf| {
            self.nodes.get(leaf).map(|n| n.container.contains(point)).unwrap_or(false)
        })
    }

    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            chain.push(node);
            cursor = self.parent(node);
        }
        chain
    }

    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        if !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return None;
        }
        let seen: HashSet<NodeId> = self.ancestors(a).into_iter().collect();
        self.ancestors(b).into_iter().find(|node| seen.contains(node))
    }

    /// Converts `parent` from a leaf into a split holding two new leaves.
    ///
    /// `first` is the window that previously occupied `parent` (its leaf
    /// inherits any monocle sub-list), `second` is the incoming window. With
    /// the spawn-left setting the incoming window takes the left slot.
    /// Containers of the new children are stale until the caller recomputes
    /// them.
    pub fn insert_leaf_pair(
        &mut self,
        parent: NodeId,
        first: Option<WindowId>,
        second: Option<WindowId>,
        orientation: Orientation,
        ratio: f64,
        spawn_left: bool,
    ) -> Option<(NodeId, NodeId)> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let (old_kind, old_list) = {
            let node = &self.nodes[parent];
            (node.kind, node.list)
        };

        let (left_window, right_window) = if spawn_left { (second, first) } else { (first, second) };

        let mut left_node = Node::leaf(left_window, ratio);
        left_node.parent = Some(parent);
        let left = self.nodes.insert(left_node);
        let mut right_node = Node::leaf(right_window, ratio);
        right_node.parent = Some(parent);
        let right = self.nodes.insert(right_node);

        // The child keeping the original occupant also keeps the sub-list.
        let keeper = if spawn_left { right } else { left };
        {
            let keeper_node = &mut self.nodes[keeper];
            keeper_node.kind = old_kind;
            keeper_node.list = old_list;
        }

        let node = &mut self.nodes[parent];
        node.window = None;
        node.kind = NodeKind::Tree;
        node.list = None;
        node.split = Some(orientation);
        node.ratio = ratio;
        node.left = Some(left);
        node.right = Some(right);

        Some((left, right))
    }

    /// Removes the leaf holding `window` and promotes its sibling subtree in
    /// place of the parent. Ancestors above the splice point keep their
    /// containers.
    pub fn remove_leaf(&mut self, window: WindowId) -> RemoveOutcome {
        let Some(leaf) = self.leaf_for_window(window) else {
            return RemoveOutcome::NotFound;
        };

        // Clear a zoom override pointing at the departing window.
        if leaf != self.root && self.nodes[self.root].window == Some(window) {
            self.nodes[self.root].window = None;
        }

        let Some(parent) = self.parent(leaf) else {
            return RemoveOutcome::TreeEmpty;
        };

        let (parent_left, parent_right) = {
            let node = &self.nodes[parent];
            (node.left, node.right)
        };
        let (Some(left), Some(right)) = (parent_left, parent_right) else {
            debug_assert!(false, "leaf parent is not a proper split");
            return RemoveOutcome::NotFound;
        };
        let sibling = if leaf == right { left } else { right };

        // A root zoom override onto the surviving sibling is also stale.
        let root_window = self.nodes[self.root].window;
        if root_window.is_some()
            && (root_window == self.nodes[left].window || root_window == self.nodes[right].window)
        {
            self.nodes[self.root].window = None;
        }

        let sibling_node = self.nodes[sibling].clone();
        {
            let node = &mut self.nodes[parent];
            node.window = sibling_node.window;
            node.kind = sibling_node.kind;
            node.list = sibling_node.list;
            node.left = sibling_node.left;
            node.right = sibling_node.right;
            if sibling_node.left.is_some() {
                node.split = sibling_node.split;
                node.ratio = sibling_node.ratio;
            }
        }
        if let Some(child) = sibling_node.left {
            self.nodes[child].parent = Some(parent);
        }
        if let Some(child) = sibling_node.right {
            self.nodes[child].parent = Some(parent);
        }

        self.remove_list(leaf);
        self.nodes.remove(leaf);
        self.nodes.remove(sibling);
        RemoveOutcome::Spliced(parent)
    }

    fn remove_list(&mut self, node: NodeId) {
        let mut cursor = self.nodes.get(node).and_then(|n| n.list);
        while let Some(link) = cursor {
            cursor = self.links.get(link).and_then(|l| l.next);
            self.links.remove(link);
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.list = None;
        }
    }

    /// Appends a window to the monocle list of `node`.
    pub fn push_link(&mut self, node: NodeId, window: WindowId, container: Rect) -> Option<LinkId> {
        if !self.nodes.contains_key(node) {
            return None;
        }
        let link = self.links.insert(LinkNode {
            window,
            container,
            prev: None,
            next: None,
        });
        let head = self.nodes[node].list;
        match head {
            None => {
                self.nodes[node].list = Some(link);
            }
            Some(head) => {
                let mut tail = head;
                while let Some(next) = self.links[tail].next {
                    tail = next;
                }
                self.links[tail].next = Some(link);
                self.links[link].prev = Some(tail);
            }
        }
        Some(link)
    }

    /// Unlinks `window` from whichever monocle list holds it.
    pub fn remove_link_for_window(&mut self, window: WindowId) -> LinkRemoveOutcome {
        let Some((node, link)) = self.link_for_window(window) else {
            return LinkRemoveOutcome::NotFound;
        };
        let (prev, next) = {
            let l = &self.links[link];
            (l.prev, l.next)
        };
        if let Some(prev) = prev {
            self.links[prev].next = next;
        }
        if let Some(next) = next {
            self.links[next].prev = prev;
        }
        if self.nodes[node].list == Some(link) {
            self.nodes[node].list = next;
        }
        self.links.remove(link);
        if self.nodes[node].list.is_none() {
            LinkRemoveOutcome::ListEmptied(node)
        } else {
            LinkRemoveOutcome::Removed
        }
    }

    pub fn links_of(&self, node: NodeId) -> Vec<LinkId> {
        let mut out = Vec::new();
        let mut cursor = self.nodes.get(node).and_then(|n| n.list);
        while let Some(link) = cursor {
            out.push(link);
            cursor = self.links.get(link).and_then(|l| l.next);
        }
        out
    }

    pub fn link_windows(&self, node: NodeId) -> Vec<WindowId> {
        self.links_of(node).into_iter().filter_map(|l| self.links.get(l)).map(|l| l.window).collect()
    }

    /// Swaps the payloads (window, kind, sub-list) of two tree nodes,
    /// leaving their containers in place.
    pub fn swap_node_windows(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return false;
        }
        let (wa, ka, la) = {
            let n = &self.nodes[a];
            (n.window, n.kind, n.list)
        };
        let (wb, kb, lb) = {
            let n = &self.nodes[b];
            (n.window, n.kind, n.list)
        };
        {
            let n = &mut self.nodes[a];
            n.window = wb;
            n.kind = kb;
            n.list = lb;
        }
        {
            let n = &mut self.nodes[b];
            n.window = wa;
            n.kind = ka;
            n.list = la;
        }
        true
    }

    pub fn swap_link_windows(&mut self, a: LinkId, b: LinkId) -> bool {
        if a == b || !self.links.contains_key(a) || !self.links.contains_key(b) {
            return false;
        }
        let wa = self.links[a].window;
        let wb = self.links[b].window;
        self.links[a].window = wb;
        self.links[b].window = wa;
        true
    }

    /// Collapses the empty placeholder sibling of `leaf`, giving the parent
    /// slot back to `leaf`'s window. No-op unless the sibling is a pseudo
    /// leaf.
    pub fn collapse_pseudo_sibling(&mut self, leaf: NodeId) -> bool {
        if !self.is_leaf(leaf) {
            return false;
        }
        let Some(parent) = self.parent(leaf) else { return false };
        let (Some(left), Some(right)) = (self.left(parent), self.right(parent)) else {
            return false;
        };
        let sibling = if leaf == left { right } else { left };
        if !self.is_pseudo(sibling) {
            return false;
        }

        let leaf_node = self.nodes[leaf].clone();
        {
            let node = &mut self.nodes[parent];
            node.window = leaf_node.window;
            node.kind = leaf_node.kind;
            node.list = leaf_node.list;
            node.left = None;
            node.right = None;
        }
        self.nodes.remove(leaf);
        self.nodes.remove(sibling);
        true
    }

    /// Sets a split ratio; values outside the open interval (0, 1) are
    /// silently ignored.
    pub fn set_ratio(&mut self, node: NodeId, ratio: f64) -> bool {
        if !(ratio > 0.0 && ratio < 1.0) {
            return false;
        }
        match self.nodes.get_mut(node) {
            Some(n) => {
                n.ratio = ratio;
                true
            }
            None => false,
        }
    }

    /// Rotates the tree: 180° mirrors children, 90°/270° additionally flip
    /// every split orientation; the ratio inverts whenever children swap.
    pub fn rotate(&mut self, rotation: Rotation) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.is_leaf(id) {
                continue;
            }
            let node = &mut self.nodes[id];
            if let Some(split) = node.split {
                let swap = match rotation {
                    Rotation::Deg90 => split == Orientation::Vertical,
                    Rotation::Deg270 => split == Orientation::Horizontal,
                    Rotation::Deg180 => true,
                };
                if swap {
                    std::mem::swap(&mut node.left, &mut node.right);
                    node.ratio = 1.0 - node.ratio;
                }
                if rotation != Rotation::Deg180 {
                    node.split = Some(split.toggled());
                }
            }
            if let Some(left) = self.left(id) {
                stack.push(left);
            }
            if let Some(right) = self.right(id) {
                stack.push(right);
            }
        }
    }

    /// All window ids in the tree, in order: each leaf's window followed by
    /// its monocle sub-list.
    pub fn windows(&self) -> Vec<WindowId> {
        let mut out = Vec::new();
        for leaf in self.leaves() {
            if let Some(node) = self.nodes.get(leaf) {
                if let Some(window) = node.window {
                    out.push(window);
                }
                out.extend(self.link_windows(leaf));
            }
        }
        out
    }

    pub fn contains_window(&self, window: WindowId) -> bool {
        self.windows().contains(&window)
    }

    #[cfg(test)]
    pub(crate) fn assert_proper(&self) {
        for (id, node) in self.nodes.iter() {
            match (node.left, node.right) {
                (None, None) => {}
                (Some(left), Some(right)) => {
                    assert_eq!(self.nodes[left].parent, Some(id), "left child parent link");
                    assert_eq!(self.nodes[right].parent, Some(id), "right child parent link");
                    assert!(node.split.is_some(), "internal node without split orientation");
                }
                _ => panic!("node {id:?} has exactly one child"),
            }
            assert!(node.ratio > 0.0 && node.ratio < 1.0, "ratio out of range");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn w(raw: u32) -> WindowId { WindowId::new(raw).unwrap() }

    /// Builds a BSP tree the way the tiler does: fill the root, then split
    /// the shallowest leaf for each additional window.
    fn build(windows: &[u32]) -> Tree {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        if let Some(&first) = windows.first() {
            tree.node_mut(root).unwrap().window = Some(w(first));
        }
        for &window in &windows[1..] {
            let target = tree.min_depth_leaf();
            let existing = tree.node(target).unwrap().window;
            tree.insert_leaf_pair(
                target,
                existing,
                Some(w(window)),
                Orientation::Vertical,
                0.5,
                false,
            );
        }
        tree
    }

    #[test]
    fn single_leaf_tree() {
        let tree = build(&[10]);
        assert!(tree.is_leaf(tree.root()));
        assert_eq!(tree.windows(), vec![w(10)]);
        tree.assert_proper();
    }

    #[test]
    fn insert_keeps_tree_proper() {
        let tree = build(&[10, 20, 30, 40, 50]);
        tree.assert_proper();
        assert_eq!(tree.leaves().len(), 5);
        let windows = tree.windows();
        for id in [10, 20, 30, 40, 50] {
            assert!(windows.contains(&w(id)));
        }
    }

    #[test]
    fn spawn_left_puts_new_window_in_left_slot() {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        tree.node_mut(root).unwrap().window = Some(w(1));
        tree.insert_leaf_pair(root, Some(w(1)), Some(w(2)), Orientation::Vertical, 0.5, true);
        let left = tree.left(root).unwrap();
        let right = tree.right(root).unwrap();
        assert_eq!(tree.node(left).unwrap().window, Some(w(2)));
        assert_eq!(tree.node(right).unwrap().window, Some(w(1)));
    }

    #[test]
    fn monocle_sub_list_moves_to_the_surviving_occupant() {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        tree.node_mut(root).unwrap().window = Some(w(1));
        tree.node_mut(root).unwrap().kind = NodeKind::Link;
        tree.push_link(root, w(7), Rect::default());

        tree.insert_leaf_pair(root, Some(w(1)), Some(w(2)), Orientation::Vertical, 0.5, false);
        let left = tree.left(root).unwrap();
        assert_eq!(tree.node(root).unwrap().kind, NodeKind::Tree);
        assert!(tree.node(root).unwrap().list.is_none());
        assert_eq!(tree.node(left).unwrap().kind, NodeKind::Link);
        assert_eq!(tree.link_windows(left), vec![w(7)]);
    }

    #[test]
    fn remove_only_window_empties_tree() {
        let mut tree = build(&[10]);
        assert_eq!(tree.remove_leaf(w(10)), RemoveOutcome::TreeEmpty);
    }

    #[test]
    fn remove_missing_window_is_a_noop() {
        let mut tree = build(&[10, 20]);
        assert_eq!(tree.remove_leaf(w(99)), RemoveOutcome::NotFound);
        tree.assert_proper();
    }

    #[test]
    fn remove_promotes_leaf_sibling() {
        let mut tree = build(&[10, 20]);
        let outcome = tree.remove_leaf(w(20));
        assert_eq!(outcome, RemoveOutcome::Spliced(tree.root()));
        assert!(tree.is_leaf(tree.root()));
        assert_eq!(tree.windows(), vec![w(10)]);
        tree.assert_proper();
    }

    #[test]
    fn remove_promotes_internal_sibling_with_its_children() {
        let mut tree = build(&[10, 20, 30]);
        // Root splits {10}'s side from the {20,30} subtree depending on
        // insertion order; removing 10 must leave a proper two-leaf tree.
        tree.remove_leaf(w(10));
        tree.assert_proper();
        assert_eq!(tree.leaves().len(), 2);
        let windows = tree.windows();
        assert!(windows.contains(&w(20)) && windows.contains(&w(30)));
    }

    #[test]
    fn insert_then_remove_restores_shape() {
        let reference = build(&[10, 20, 30]);
        let before: Vec<_> = reference.windows();
        let shape_before: Vec<usize> =
            reference.leaves().iter().map(|&l| reference.ancestors(l).len()).collect();

        let mut tree = build(&[10, 20, 30]);
        let target = tree.min_depth_leaf();
        let existing = tree.node(target).unwrap().window;
        tree.insert_leaf_pair(target, existing, Some(w(40)), Orientation::Vertical, 0.5, false);
        tree.remove_leaf(w(40));
        tree.assert_proper();

        assert_eq!(tree.windows(), before);
        let shape_after: Vec<usize> =
            tree.leaves().iter().map(|&l| tree.ancestors(l).len()).collect();
        assert_eq!(shape_after, shape_before);
    }

    #[test]
    fn min_depth_leaf_is_shallowest() {
        let tree = build(&[10, 20, 30]);
        let leaf = tree.min_depth_leaf();
        assert!(tree.is_leaf(leaf));
        let depth = tree.ancestors(leaf).len();
        for other in tree.leaves() {
            assert!(depth <= tree.ancestors(other).len());
        }
    }

    #[test]
    fn lowest_common_ancestor_of_siblings_is_root() {
        let tree = build(&[10, 20]);
        let a = tree.leaf_for_window(w(10)).unwrap();
        let b = tree.leaf_for_window(w(20)).unwrap();
        assert_eq!(tree.lowest_common_ancestor(a, b), Some(tree.root()));
        assert_eq!(tree.lowest_common_ancestor(a, a), Some(a));
    }

    #[test]
    fn lca_with_a_stale_node_is_none() {
        let mut tree = build(&[10, 20]);
        let stale = tree.leaf_for_window(w(20)).unwrap();
        tree.remove_leaf(w(20));
        assert_eq!(tree.lowest_common_ancestor(stale, tree.root()), None);
        assert_eq!(tree.remove_leaf(w(20)), RemoveOutcome::NotFound);
    }

    #[test]
    fn in_order_neighbors() {
        let tree = build(&[10, 20, 30]);
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(tree.nearest_leaf_left(leaves[0]), None);
        assert_eq!(tree.nearest_leaf_right(leaves[0]), Some(leaves[1]));
        assert_eq!(tree.nearest_leaf_left(leaves[2]), Some(leaves[1]));
        assert_eq!(tree.nearest_leaf_right(leaves[2]), None);
    }

    #[test]
    fn rotation_90_flips_orientation_and_children() {
        let mut tree = build(&[10, 20]);
        let root = tree.root();
        tree.node_mut(root).unwrap().ratio = 0.3;
        let left_before = tree.node(tree.left(root).unwrap()).unwrap().window;

        tree.rotate(Rotation::Deg90);
        let node = tree.node(root).unwrap();
        assert_eq!(node.split, Some(Orientation::Horizontal));
        assert!((node.ratio - 0.7).abs() < f64::EPSILON);
        let left_after = tree.node(tree.left(root).unwrap()).unwrap().window;
        assert_ne!(left_before, left_after);
    }

    #[test]
    fn rotation_90_with_even_ratio_keeps_ratio() {
        let mut tree = build(&[10, 20]);
        tree.rotate(Rotation::Deg90);
        let node = tree.node(tree.root()).unwrap();
        assert_eq!(node.split, Some(Orientation::Horizontal));
        assert!((node.ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rotation_180_swaps_without_flipping() {
        let mut tree = build(&[10, 20]);
        let root = tree.root();
        let left_before = tree.node(tree.left(root).unwrap()).unwrap().window;
        tree.rotate(Rotation::Deg180);
        let node = tree.node(root).unwrap();
        assert_eq!(node.split, Some(Orientation::Vertical));
        let left_after = tree.node(tree.left(root).unwrap()).unwrap().window;
        assert_ne!(left_before, left_after);
    }

    #[test]
    fn ratio_setter_rejects_out_of_range() {
        let mut tree = build(&[10, 20]);
        let root = tree.root();
        assert!(tree.set_ratio(root, 0.25));
        assert!(!tree.set_ratio(root, 0.0));
        assert!(!tree.set_ratio(root, 1.0));
        assert!(!tree.set_ratio(root, -0.5));
        assert!(!tree.set_ratio(root, 1.5));
        assert!((tree.node(root).unwrap().ratio - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn link_list_push_and_remove() {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        for id in [10, 20, 30] {
            tree.push_link(root, w(id), Rect::default());
        }
        assert_eq!(tree.link_windows(root), vec![w(10), w(20), w(30)]);

        assert_eq!(tree.remove_link_for_window(w(20)), LinkRemoveOutcome::Removed);
        assert_eq!(tree.link_windows(root), vec![w(10), w(30)]);

        assert_eq!(tree.remove_link_for_window(w(10)), LinkRemoveOutcome::Removed);
        assert_eq!(
            tree.remove_link_for_window(w(30)),
            LinkRemoveOutcome::ListEmptied(root)
        );
        assert_eq!(tree.remove_link_for_window(w(30)), LinkRemoveOutcome::NotFound);
    }

    #[test]
    fn swap_link_windows_keeps_positions() {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        let links: Vec<_> =
            [10, 20, 30].iter().map(|&id| tree.push_link(root, w(id), Rect::default()).unwrap()).collect();
        assert!(tree.swap_link_windows(links[0], links[2]));
        assert_eq!(tree.link_windows(root), vec![w(30), w(20), w(10)]);
    }

    #[test]
    fn swap_node_windows_swaps_payloads() {
        let mut tree = build(&[10, 20]);
        let a = tree.leaf_for_window(w(10)).unwrap();
        let b = tree.leaf_for_window(w(20)).unwrap();
        assert!(tree.swap_node_windows(a, b));
        assert_eq!(tree.node(a).unwrap().window, Some(w(20)));
        assert_eq!(tree.node(b).unwrap().window, Some(w(10)));
        assert!(!tree.swap_node_windows(a, a));
    }

    #[test]
    fn pseudo_leaves_are_found_in_order() {
        let mut tree = build(&[10, 20]);
        assert_eq!(tree.first_pseudo_leaf(), None);
        let leaf = tree.leaf_for_window(w(20)).unwrap();
        tree.insert_leaf_pair(leaf, Some(w(20)), None, Orientation::Horizontal, 0.5, false);
        let pseudo = tree.first_pseudo_leaf().expect("pseudo leaf exists");
        assert!(tree.is_pseudo(pseudo));
    }

    #[test]
    fn removing_a_window_with_zoom_override_clears_it() {
        let mut tree = build(&[10, 20]);
        let root = tree.root();
        tree.node_mut(root).unwrap().window = Some(w(20));
        tree.remove_leaf(w(20));
        assert_eq!(tree.node(root).unwrap().window, Some(w(10)));
        tree.assert_proper();
    }

    #[test]
    fn random_insert_remove_sequence_stays_proper() {
        let mut tree = build(&[1, 2, 3, 4, 5, 6, 7, 8]);
        for id in [3, 1, 7] {
            tree.remove_leaf(w(id));
            tree.assert_proper();
        }
        for id in [9, 10] {
            let target = tree.min_depth_leaf();
            let existing = tree.node(target).unwrap().window;
            tree.insert_leaf_pair(
                target,
                existing,
                Some(w(id)),
                Orientation::Horizontal,
                0.5,
                false,
            );
            tree.assert_proper();
        }
        assert_eq!(tree.leaves().len(), 7);
    }
}
