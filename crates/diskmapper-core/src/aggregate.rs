/// Bottom-up size aggregation.
///
/// The scanner calls [`propagate`] once per listed directory with the bytes
/// of the files it found *at that level*. Each byte therefore reaches every
/// ancestor exactly once, and directory sizes only ever grow. Repeated calls
/// are additive; nothing here replaces a size.
use crate::error::TreeError;
use crate::model::{EntryTree, NodeIndex};

/// Add `delta` to `start` and to every ancestor up to and including the root.
pub fn propagate(tree: &mut EntryTree, start: NodeIndex, delta: u64) {
    if delta == 0 {
        return;
    }
    let mut current = Some(start);
    while let Some(idx) = current {
        let node = &mut tree.nodes[idx.idx()];
        node.size = node.size.saturating_add(delta);
        current = node.parent;
    }
}

/// Sum of the sizes of all files in the loaded subtree of `index`.
///
/// Iterative, so it is safe on arbitrarily deep trees.
pub fn loaded_file_total(tree: &EntryTree, index: NodeIndex) -> u64 {
    let mut total = 0u64;
    let mut stack = vec![index];
    while let Some(idx) = stack.pop() {
        let node = tree.node(idx);
        if node.is_dir {
            stack.extend_from_slice(node.children());
        } else {
            total = total.saturating_add(node.size);
        }
    }
    total
}

/// Check that every directory's size equals the files committed below it.
///
/// Children are always appended after their parent in the arena, so a
/// reverse pass sees every child before its parent and the check is O(n).
pub fn verify(tree: &EntryTree) -> Result<(), TreeError> {
    let mut expected = vec![0u64; tree.len()];
    for i in (0..tree.len()).rev() {
        let idx = NodeIndex::new(i);
        let node = tree.node(idx);
        let own = if node.is_dir {
            if node.size != expected[idx.idx()] {
                return Err(TreeError::SizeMismatch {
                    node: idx,
                    path: tree.path(idx),
                    recorded: node.size,
                    expected: expected[idx.idx()],
                });
            }
            expected[idx.idx()]
        } else {
            node.size
        };
        if let Some(parent) = node.parent {
            expected[parent.idx()] = expected[parent.idx()].saturating_add(own);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;

    /// Build: root -> (a: 10, d -> (b: 20)) without propagating anything.
    fn unpropagated() -> (EntryTree, NodeIndex) {
        let mut tree = EntryTree::new("/r");
        let root = tree.root();
        tree.set_children(
            root,
            vec![
                Entry::new_file("a", 10, Some(root)),
                Entry::new_dir("d", Some(root)),
            ],
        )
        .unwrap();
        let d = tree.children(root)[1];
        tree.set_children(d, vec![Entry::new_file("b", 20, Some(d))])
            .unwrap();
        (tree, d)
    }

    #[test]
    fn propagate_reaches_every_ancestor() {
        let (mut tree, d) = unpropagated();
        propagate(&mut tree, d, 20);
        assert_eq!(tree.node(d).size, 20);
        assert_eq!(tree.node(tree.root()).size, 20);
    }

    #[test]
    fn propagate_is_additive() {
        let (mut tree, d) = unpropagated();
        let root = tree.root();
        propagate(&mut tree, d, 20);
        propagate(&mut tree, root, 10);
        assert_eq!(tree.node(root).size, 30);
        assert_eq!(tree.node(d).size, 20);
        assert!(verify(&tree).is_ok());
    }

    #[test]
    fn verify_reports_missing_bytes() {
        let (mut tree, d) = unpropagated();
        propagate(&mut tree, d, 20);
        let err = verify(&tree).unwrap_err();
        match err {
            TreeError::SizeMismatch {
                node,
                recorded,
                expected,
                ..
            } => {
                assert_eq!(node, tree.root());
                assert_eq!(recorded, 20);
                assert_eq!(expected, 30);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn loaded_file_total_sums_subtree() {
        let (tree, d) = unpropagated();
        assert_eq!(loaded_file_total(&tree, tree.root()), 30);
        assert_eq!(loaded_file_total(&tree, d), 20);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let (mut tree, d) = unpropagated();
        propagate(&mut tree, d, 0);
        assert_eq!(tree.node(tree.root()).size, 0);
    }
}
