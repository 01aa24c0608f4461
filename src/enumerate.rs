//! Turning a disambiguated forest into concrete trees: a linear-time count
//! via dynamic programming, and a lazy [`Enumerator`] that decodes one tree
//! per `next()` call instead of materializing the (possibly exponential)
//! full list up front.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::forest::{Child, Forest, NodeId};
use crate::grammar::ProdId;

/// One concrete parse tree: a leaf token, or a node built from one
/// production with its own children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tree<T> {
    Leaf(T),
    Node { lhs: String, prod: ProdId, children: Vec<Tree<T>> },
}

impl<T: fmt::Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Leaf(t) => write!(f, "{t}"),
            Tree::Node { lhs, children, .. } => {
                write!(f, "({lhs}")?;
                for c in children {
                    write!(f, " {c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Exact count of distinct trees rooted at `id`, computed as a product (over
/// an alternative's children) of sums (over alternatives), memoized per
/// node. O(number of forest nodes) regardless of how many trees that
/// represents — this must never call into [`Enumerator`].
pub fn count<T>(forest: &Forest<'_, T>, id: NodeId) -> u128 {
    let mut memo = HashMap::new();
    count_memo(forest, id, &mut memo)
}

fn count_memo<T>(forest: &Forest<'_, T>, id: NodeId, memo: &mut HashMap<NodeId, u128>) -> u128 {
    if let Some(&c) = memo.get(&id) {
        return c;
    }
    // Reserve a slot before recursing: a self-referencing alternative is
    // forbidden by construction (§ forest builder), so this is never
    // actually read back mid-computation — it only guards against
    // pathological input, not a case this crate's forests produce.
    memo.insert(id, 0);
    let node = forest.node(id);
    let mut total: u128 = 0;
    for alt in &node.alternatives {
        let mut product: u128 = 1;
        for child in &alt.children {
            if let Child::Node(cid) = child {
                product = product.saturating_mul(count_memo(forest, *cid, memo));
            }
        }
        total = total.saturating_add(product);
    }
    memo.insert(id, total);
    total
}

/// Total tree count across every root (a forest with more than one root only
/// arises from an ambiguous choice of start production covering the whole
/// input, which `Grammar`/`Forest::build` already collapse into one node per
/// start symbol — kept as a sum for forward-compatibility with multi-root
/// forests).
pub fn total_count<T>(forest: &Forest<'_, T>) -> u128 {
    forest.roots().iter().map(|&r| count(forest, r)).sum()
}

/// A lazy, `Iterator`-implementing walk over every distinct tree rooted at
/// one forest node, in the lexicographic order of (alternative index, DFS
/// left-to-right branch choice). Each `next()` call decodes exactly one
/// tree from a flat index into the node's precomputed alternative/count
/// table — no tree is built until it is yielded, and dropping an
/// `Enumerator` between calls costs nothing, since all of its state is this
/// struct's own fields, never a cursor written onto the forest itself.
pub struct Enumerator<'f, 'g, T> {
    forest: &'f Forest<'g, T>,
    root: Option<NodeId>,
    counts: HashMap<NodeId, u128>,
    total: u128,
    next_index: u128,
}

impl<'f, 'g, T> Enumerator<'f, 'g, T> {
    /// Enumerate every tree rooted at `root` (or an immediately-empty
    /// enumerator if `root` is `None`, the "input did not recognize" case).
    pub fn new(forest: &'f Forest<'g, T>, root: Option<NodeId>) -> Self {
        let mut counts = HashMap::new();
        let total = match root {
            Some(r) => count_memo(forest, r, &mut counts),
            None => 0,
        };
        Enumerator { forest, root, counts, total, next_index: 0 }
    }

    /// Number of trees this enumerator will yield in total.
    pub fn len(&self) -> u128 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl<'f, 'g, T: Clone> Iterator for Enumerator<'f, 'g, T> {
    type Item = Tree<T>;

    fn next(&mut self) -> Option<Tree<T>> {
        if self.next_index >= self.total {
            return None;
        }
        let root = self.root?;
        let tree = decode(self.forest, root, self.next_index, &self.counts);
        self.next_index += 1;
        Some(tree)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next_index).min(usize::MAX as u128) as usize;
        (remaining, usize::try_from(self.total - self.next_index).ok())
    }
}

/// Decode the `index`-th tree (0-based, in alternative-major / left-to-right
/// DFS order) rooted at `id`, using `counts` as a precomputed `NodeId ->
/// tree count` table so no sub-count is ever recomputed.
fn decode<T: Clone>(forest: &Forest<'_, T>, id: NodeId, mut index: u128, counts: &HashMap<NodeId, u128>) -> Tree<T> {
    let node = forest.node(id);
    for alt in &node.alternatives {
        let child_counts: Vec<u128> = alt
            .children
            .iter()
            .map(|c| match c {
                Child::Leaf(_) => 1,
                Child::Node(cid) => *counts.get(cid).expect("counts precomputed for every reachable node"),
            })
            .collect();
        let bucket: u128 = child_counts.iter().product();
        if index < bucket {
            // Mixed-radix decode: the leftmost child is the slowest-varying
            // digit (outermost loop), matching the "first child varies
            // slowest" order an eager left-to-right cartesian product would
            // produce.
            let mut suffix_weight = vec![1u128; child_counts.len() + 1];
            for i in (0..child_counts.len()).rev() {
                suffix_weight[i] = suffix_weight[i + 1].saturating_mul(child_counts[i]);
            }
            let mut children = Vec::with_capacity(alt.children.len());
            let mut remaining = index;
            for (i, child) in alt.children.iter().enumerate() {
                let weight = suffix_weight[i + 1];
                let digit = if weight == 0 { 0 } else { remaining / weight };
                remaining -= digit.saturating_mul(weight);
                children.push(match child {
                    Child::Leaf(t) => Tree::Leaf(t.clone()),
                    Child::Node(cid) => decode(forest, *cid, digit, counts),
                });
            }
            return Tree::Node { lhs: node.lhs.clone(), prod: alt.prod, children };
        }
        index -= bucket;
    }
    unreachable!("index {index} out of range for node {id:?}'s alternative space")
}
