//! Saving and restoring tree shapes.
//!
//! A saved layout is the shape of the tree only (splits, orientations,
//! ratios); window ids are never persisted. Restoring overlays the live
//! window set onto the shape: leaves fill in order, and any surplus windows
//! pair into the rightmost available leaf so the tree stays proper.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::container::{self, LayoutContext};
use crate::model::tree::{NodeId, Orientation, Tree};
use crate::model::window::WindowId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SavedNode {
    Leaf,
    Split {
        orientation: Orientation,
        ratio: f64,
        left: Box<SavedNode>,
        right: Box<SavedNode>,
    },
}

#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("layout file: {0}")]
    Io(#[from] std::io::Error),
    #[error("layout format: {0}")]
    Format(#[from] ron::error::SpannedError),
    #[error("layout encode: {0}")]
    Encode(#[from] ron::Error),
}

pub fn tree_shape(tree: &Tree) -> SavedNode { shape_of(tree, tree.root()) }

fn shape_of(tree: &Tree, id: NodeId) -> SavedNode {
    match (tree.left(id), tree.right(id)) {
        (Some(left), Some(right)) => {
            let node = tree.node(id).expect("shape of missing node");
            SavedNode::Split {
                orientation: node.split.unwrap_or(Orientation::Vertical),
                ratio: node.ratio,
                left: Box::new(shape_of(tree, left)),
                right: Box::new(shape_of(tree, right)),
            }
        }
        _ => SavedNode::Leaf,
    }
}

/// Rebuilds an empty tree with the saved shape; every leaf is a pseudo slot.
pub fn tree_from_shape(shape: &SavedNode, default_ratio: f64) -> Tree {
    let mut tree = Tree::new(default_ratio);
    let root = tree.root();
    build(&mut tree, root, shape, default_ratio);
    tree
}

fn build(tree: &mut Tree, node: NodeId, shape: &SavedNode, default_ratio: f64) {
    if let SavedNode::Split { orientation, ratio, left, right } = shape {
        let ratio = if *ratio > 0.0 && *ratio < 1.0 { *ratio } else { default_ratio };
        if let Some((left_id, right_id)) =
            tree.insert_leaf_pair(node, None, None, *orientation, ratio, false)
        {
            build(tree, left_id, left, default_ratio);
            build(tree, right_id, right, default_ratio);
        }
    }
}

/// Overlays `windows` onto a deserialized tree: existing leaf slots fill
/// left to right; windows beyond the saved shape descend into the rightmost
/// available subtree and pair in.
pub fn fill_deserialized_tree(tree: &mut Tree, windows: &[WindowId], ctx: &LayoutContext) {
    container::full_layout(tree, ctx, false);

    let leaves = tree.leaves();
    let mut assigned = 0;
    for leaf in &leaves {
        if assigned >= windows.len() {
            break;
        }
        if let Some(node) = tree.node_mut(*leaf) {
            node.window = Some(windows[assigned]);
            assigned += 1;
        }
    }

    while assigned < windows.len() {
        let mut node = tree.root();
        while !tree.is_leaf(node) {
            let left = tree.left(node).expect("proper tree");
            let right = tree.right(node).expect("proper tree");
            node = if !tree.is_leaf(left) && tree.is_leaf(right) { right } else { left };
        }
        let existing = tree.node(node).map(|n| n.window).unwrap_or(None);
        let container = tree.node(node).map(|n| n.container).unwrap_or_default();
        let orientation = container::optimal_orientation(&container, ctx.optimal_ratio);
        let ratio = tree.node(node).map(|n| n.ratio).unwrap_or(0.5);
        tree.insert_leaf_pair(node, existing, Some(windows[assigned]), orientation, ratio, false);
        container::resize_subtree(tree, node, ctx, false);
        assigned += 1;
    }
}

pub fn save_layout(dir: &Path, name: &str, tree: &Tree) -> Result<(), SerializerError> {
    fs::create_dir_all(dir)?;
    let shape = tree_shape(tree);
    let encoded = ron::ser::to_string(&shape)?;
    let mut file = fs::File::create(dir.join(format!("{name}.ron")))?;
    file.write_all(encoded.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

pub fn load_layout(dir: &Path, name: &str) -> Result<SavedNode, SerializerError> {
    let text = fs::read_to_string(dir.join(format!("{name}.ron")))?;
    Ok(ron::from_str(&text)?)
}
