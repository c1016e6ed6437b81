//! Post-order tree views.

/// One node of an [`OrderedTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedNode<T> {
    pub item: T,
    pub parent: Option<usize>,
    /// Post-order indices of the children, in document order.
    pub children: Vec<usize>,
    /// Post-order index of the leftmost leaf descendant (itself for a leaf).
    pub leftmost: usize,
}

/// A tree flattened in post-order: every node appears after all of its
/// descendants, and siblings appear in document order. The root is last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedTree<T> {
    nodes: Vec<OrderedNode<T>>,
}

impl<T: Clone> OrderedTree<T> {
    /// Build a view rooted at `root`, enumerating children with `children`.
    pub fn build<F>(root: T, mut children: F) -> Self
    where
        F: FnMut(&T) -> Vec<T>,
    {
        let mut nodes = Vec::new();
        Self::visit(root, &mut children, &mut nodes);
        Self { nodes }
    }

    fn visit<F>(item: T, children: &mut F, nodes: &mut Vec<OrderedNode<T>>) -> usize
    where
        F: FnMut(&T) -> Vec<T>,
    {
        let child_indices: Vec<usize> = children(&item)
            .into_iter()
            .map(|child| Self::visit(child, children, nodes))
            .collect();

        let index = nodes.len();
        let leftmost = child_indices
            .first()
            .map(|first| nodes[*first].leftmost)
            .unwrap_or(index);
        for child in &child_indices {
            nodes[*child].parent = Some(index);
        }
        nodes.push(OrderedNode {
            item,
            parent: None,
            children: child_indices,
            leftmost,
        });
        index
    }
}

impl<T> OrderedTree<T> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[OrderedNode<T>] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&OrderedNode<T>> {
        self.nodes.get(index)
    }

    /// Post-order index of the root.
    pub fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Items in post-order.
    pub fn items(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes.iter().map(|node| &node.item)
    }

    pub(crate) fn leftmost(&self) -> Vec<usize> {
        self.nodes.iter().map(|node| node.leftmost).collect()
    }
}
