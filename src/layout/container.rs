//! Container geometry.
//!
//! Pure functions that compute node rectangles from split ratios, the
//! display frame, padding and gaps. Recomputation walks the stored tree
//! state only, so running a pass twice over an unchanged tree yields
//! byte-identical rectangles.

use crate::common::config::{ContainerOffset, SplitPreference};
use crate::model::tree::{NodeId, Orientation, Tree};
use crate::sys::geometry::Rect;

#[derive(Clone, Copy, Debug)]
pub struct LayoutContext {
    pub display_frame: Rect,
    pub offset: ContainerOffset,
    pub optimal_ratio: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The root container: the display frame minus the four padding values.
pub fn root_container(ctx: &LayoutContext) -> Rect {
    let frame = ctx.display_frame;
    let offset = ctx.offset;
    Rect::new(
        frame.origin.x + offset.padding_left,
        frame.origin.y + offset.padding_top,
        f64::max(frame.size.width - offset.padding_left - offset.padding_right, 0.0),
        f64::max(frame.size.height - offset.padding_top - offset.padding_bottom, 0.0),
    )
}

/// Splits `parent` at `ratio` along `orientation` and returns the half for
/// `side`, with half the configured gap shaved off the inner edge.
pub fn split_rect(
    parent: Rect,
    ratio: f64,
    orientation: Orientation,
    side: Side,
    offset: &ContainerOffset,
) -> Rect {
    match orientation {
        Orientation::Vertical => {
            let gap = offset.vertical_gap / 2.0;
            let boundary = parent.size.width * ratio;
            match side {
                Side::Left => Rect::new(
                    parent.origin.x,
                    parent.origin.y,
                    f64::max(boundary - gap, 0.0),
                    parent.size.height,
                ),
                Side::Right => Rect::new(
                    parent.origin.x + boundary + gap,
                    parent.origin.y,
                    f64::max(parent.size.width - boundary - gap, 0.0),
                    parent.size.height,
                ),
            }
        }
        Orientation::Horizontal => {
            let gap = offset.horizontal_gap / 2.0;
            let boundary = parent.size.height * ratio;
            match side {
                Side::Left => Rect::new(
                    parent.origin.x,
                    parent.origin.y,
                    parent.size.width,
                    f64::max(boundary - gap, 0.0),
                ),
                Side::Right => Rect::new(
                    parent.origin.x,
                    parent.origin.y + boundary + gap,
                    parent.size.width,
                    f64::max(parent.size.height - boundary - gap, 0.0),
                ),
            }
        }
    }
}

/// Wide containers split side-by-side, tall ones stack.
pub fn optimal_orientation(container: &Rect, optimal_ratio: f64) -> Orientation {
    if container.size.height <= 0.0 {
        return Orientation::Vertical;
    }
    if container.size.width / container.size.height >= optimal_ratio {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}

pub fn resolve_orientation(
    preference: SplitPreference,
    container: &Rect,
    optimal_ratio: f64,
) -> Orientation {
    match preference {
        SplitPreference::Optimal => optimal_orientation(container, optimal_ratio),
        SplitPreference::Vertical => Orientation::Vertical,
        SplitPreference::Horizontal => Orientation::Horizontal,
    }
}

pub fn set_root_container(tree: &mut Tree, ctx: &LayoutContext) {
    let rect = root_container(ctx);
    let root = tree.root();
    if let Some(node) = tree.node_mut(root) {
        node.container = rect;
    }
    resize_link_containers(tree, root);
}

/// Recomputes the containers of every descendant of `from` out of the stored
/// ratios and orientations. `from`'s own container is taken as given. With
/// `resplit_optimal` each internal node re-chooses its orientation from its
/// container shape first.
pub fn resize_subtree(tree: &mut Tree, from: NodeId, ctx: &LayoutContext, resplit_optimal: bool) {
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        if tree.is_leaf(id) {
            resize_link_containers(tree, id);
            continue;
        }
        let (container, ratio, split) = match tree.node(id) {
            Some(node) => (node.container, node.ratio, node.split),
            None => continue,
        };
        let orientation = if resplit_optimal {
            let chosen = optimal_orientation(&container, ctx.optimal_ratio);
            if let Some(node) = tree.node_mut(id) {
                node.split = Some(chosen);
            }
            chosen
        } else {
            match split {
                Some(orientation) => orientation,
                None => continue,
            }
        };

        let left_rect = split_rect(container, ratio, orientation, Side::Left, &ctx.offset);
        let right_rect = split_rect(container, ratio, orientation, Side::Right, &ctx.offset);
        if let Some(left) = tree.left(id) {
            if let Some(node) = tree.node_mut(left) {
                node.container = left_rect;
            }
            stack.push(left);
        }
        if let Some(right) = tree.right(id) {
            if let Some(node) = tree.node_mut(right) {
                node.container = right_rect;
            }
            stack.push(right);
        }
    }
}

/// Monocle links always cover their holding node's container.
pub fn resize_link_containers(tree: &mut Tree, node: NodeId) {
    let Some(container) = tree.node(node).map(|n| n.container) else {
        return;
    };
    for link in tree.links_of(node) {
        if let Some(l) = tree.link_mut(link) {
            l.container = container;
        }
    }
}

/// Recomputes the whole tree from the display frame down.
pub fn full_layout(tree: &mut Tree, ctx: &LayoutContext, resplit_optimal: bool) {
    set_root_container(tree, ctx);
    let root = tree.root();
    resize_subtree(tree, root, ctx, resplit_optimal);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::window::WindowId;

    fn w(raw: u32) -> WindowId { WindowId::new(raw).unwrap() }

    fn ctx(offset: ContainerOffset) -> LayoutContext {
        LayoutContext {
            display_frame: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            offset,
            optimal_ratio: 1.618,
        }
    }

    fn gapped() -> ContainerOffset {
        ContainerOffset {
            padding_top: 20.0,
            padding_bottom: 10.0,
            padding_left: 15.0,
            padding_right: 5.0,
            vertical_gap: 10.0,
            horizontal_gap: 8.0,
        }
    }

    #[test]
    fn root_container_subtracts_padding() {
        let rect = root_container(&ctx(gapped()));
        assert_eq!(rect, Rect::new(15.0, 20.0, 1900.0, 1050.0));
    }

    #[test]
    fn vertical_split_halves_share_the_gap() {
        let offset = gapped();
        let parent = Rect::new(0.0, 0.0, 1000.0, 500.0);
        let left = split_rect(parent, 0.5, Orientation::Vertical, Side::Left, &offset);
        let right = split_rect(parent, 0.5, Orientation::Vertical, Side::Right, &offset);
        assert_eq!(left, Rect::new(0.0, 0.0, 495.0, 500.0));
        assert_eq!(right, Rect::new(505.0, 0.0, 495.0, 500.0));
        assert_eq!(left.size.width + right.size.width + offset.vertical_gap, parent.size.width);
    }

    #[test]
    fn horizontal_split_respects_ratio() {
        let offset = gapped();
        let parent = Rect::new(0.0, 0.0, 1000.0, 600.0);
        let upper = split_rect(parent, 0.25, Orientation::Horizontal, Side::Left, &offset);
        let lower = split_rect(parent, 0.25, Orientation::Horizontal, Side::Right, &offset);
        assert_eq!(upper, Rect::new(0.0, 0.0, 1000.0, 146.0));
        assert_eq!(lower, Rect::new(0.0, 154.0, 1000.0, 446.0));
    }

    #[test]
    fn optimal_orientation_threshold() {
        assert_eq!(
            optimal_orientation(&Rect::new(0.0, 0.0, 1920.0, 1080.0), 1.618),
            Orientation::Vertical
        );
        assert_eq!(
            optimal_orientation(&Rect::new(0.0, 0.0, 950.0, 1080.0), 1.618),
            Orientation::Horizontal
        );
    }

    fn sample_tree() -> Tree {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        tree.node_mut(root).unwrap().window = Some(w(10));
        tree.insert_leaf_pair(root, Some(w(10)), Some(w(20)), Orientation::Vertical, 0.5, false);
        let right = tree.right(root).unwrap();
        let existing = tree.node(right).unwrap().window;
        tree.insert_leaf_pair(right, existing, Some(w(30)), Orientation::Horizontal, 0.5, false);
        tree
    }

    #[test]
    fn full_layout_covers_the_padded_area() {
        let offset = ContainerOffset {
            vertical_gap: 10.0,
            horizontal_gap: 10.0,
            ..Default::default()
        };
        let mut tree = sample_tree();
        let ctx = ctx(offset);
        full_layout(&mut tree, &ctx, false);

        let root_rect = tree.node(tree.root()).unwrap().container;
        assert_eq!(root_rect, Rect::new(0.0, 0.0, 1920.0, 1080.0));

        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 3);
        let left = tree.node(leaves[0]).unwrap().container;
        let upper = tree.node(leaves[1]).unwrap().container;
        let lower = tree.node(leaves[2]).unwrap().container;

        // widths across the vertical split sum to the root width minus gap
        assert_eq!(left.size.width + upper.size.width + offset.vertical_gap, 1920.0);
        // heights across the horizontal split sum to the root height minus gap
        assert_eq!(upper.size.height + lower.size.height + offset.horizontal_gap, 1080.0);
        assert_eq!(left.size.height, 1080.0);
    }

    #[test]
    fn layout_pass_is_idempotent() {
        let mut tree = sample_tree();
        let ctx = ctx(gapped());
        full_layout(&mut tree, &ctx, false);
        let first: Vec<Rect> =
            tree.leaves().iter().map(|&l| tree.node(l).unwrap().container).collect();
        full_layout(&mut tree, &ctx, false);
        let second: Vec<Rect> =
            tree.leaves().iter().map(|&l| tree.node(l).unwrap().container).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ratio_change_moves_the_boundary() {
        let mut tree = sample_tree();
        let ctx = ctx(ContainerOffset::default());
        full_layout(&mut tree, &ctx, false);

        let root = tree.root();
        tree.set_ratio(root, 0.25);
        resize_subtree(&mut tree, root, &ctx, false);

        let left = tree.left(root).unwrap();
        assert_eq!(tree.node(left).unwrap().container.size.width, 480.0);
    }

    #[test]
    fn link_containers_track_their_node() {
        let mut tree = Tree::new(0.5);
        let root = tree.root();
        tree.push_link(root, w(1), Rect::default());
        tree.push_link(root, w(2), Rect::default());

        let ctx = ctx(gapped());
        full_layout(&mut tree, &ctx, false);
        let expected = tree.node(root).unwrap().container;
        for link in tree.links_of(root) {
            assert_eq!(tree.link(link).unwrap().container, expected);
        }
    }
}
