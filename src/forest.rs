//! The shared packed parse forest: every `(non-terminal, start, end)` span
//! is packed into one symbol node, and its ambiguity is represented as a
//! list of alternatives — one per production (and per way that production
//! can split the span) — rather than duplicated nodes.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::chart::Chart;
use crate::grammar::{Grammar, ProdId, Symbol};

/// Identity of a packed symbol node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    lhs: String,
    start: usize,
    end: usize,
}

/// A single child of an alternative: either a terminal leaf (the literal
/// token consumed) or a reference to another packed symbol node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Child<T> {
    Leaf(T),
    Node(NodeId),
}

/// One way to derive a node's span: the production that was used, and its
/// matched children in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alternative<T> {
    pub prod: ProdId,
    pub children: Vec<Child<T>>,
}

/// A packed forest node: every derivation of one non-terminal over one span.
#[derive(Debug, Clone)]
pub struct ForestNode<T> {
    pub lhs: String,
    pub start: usize,
    pub end: usize,
    pub alternatives: Vec<Alternative<T>>,
}

/// The shared packed parse forest produced by recognizing some input against
/// a [`Grammar`]. Immutable once built; disambiguation produces a new
/// (pruned) `Forest` rather than mutating this one in place.
pub struct Forest<'g, T> {
    pub(crate) grammar: &'g Grammar<T>,
    pub(crate) nodes: Vec<ForestNode<T>>,
    pub(crate) roots: Vec<NodeId>,
}

impl<'g, T> Forest<'g, T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    /// Build the forest from an accepted chart. Callers should check
    /// [`Chart::accepted`] first; an unaccepted chart simply yields no
    /// roots.
    #[tracing::instrument(skip_all)]
    pub fn build(chart: &Chart<'g, T>, tokens: &[T]) -> Self {
        let grammar = chart.grammar();
        let mut nodes: Vec<ForestNode<T>> = Vec::new();
        let mut index: HashMap<NodeKey, NodeId> = HashMap::new();

        // Completed items, grouped by increasing end position, so a node's
        // children (whose span always nests inside the parent's) are always
        // built before the parent that needs them.
        let n = tokens.len();
        for end in 0..=n {
            for item in chart.completed_ending_at(end) {
                let lhs = grammar.production(item.prod).lhs.clone();
                get_or_build_node(grammar, chart, tokens, &lhs, item.start, end, &mut nodes, &mut index);
            }
        }

        let start = grammar.start().to_string();
        let roots = index
            .get(&NodeKey { lhs: start, start: 0, end: n })
            .into_iter()
            .copied()
            .collect();

        Forest { grammar, nodes, roots }
    }

    pub fn node(&self, id: NodeId) -> &ForestNode<T> {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn grammar(&self) -> &'g Grammar<T> {
        self.grammar
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<'g, T> Forest<'g, T>
where
    T: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    /// The concatenated textual yield of a node, used by reject rules and
    /// follow-restrictions. An ambiguous node yields its first alternative's
    /// text: the terminal content spanned is the same no matter which
    /// derivation produced it, so reject/follow rules never need to see past
    /// alternative 0.
    pub fn yield_of(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        let Some(alt) = node.alternatives.first() else {
            return String::new();
        };
        let mut out = String::new();
        for child in &alt.children {
            match child {
                Child::Leaf(t) => out.push_str(&t.to_string()),
                Child::Node(n) => out.push_str(&self.yield_of(*n)),
            }
        }
        out
    }
}

#[allow(clippy::too_many_arguments)]
fn get_or_build_node<T>(
    grammar: &Grammar<T>,
    chart: &Chart<'_, T>,
    tokens: &[T],
    lhs: &str,
    start: usize,
    end: usize,
    nodes: &mut Vec<ForestNode<T>>,
    index: &mut HashMap<NodeKey, NodeId>,
) -> NodeId
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    let key = NodeKey { lhs: lhs.to_string(), start, end };
    if let Some(&id) = index.get(&key) {
        return id;
    }

    // Reserve the slot before recursing: the recursive search below never
    // proposes a child identical to the node currently being built (the
    // self-reference prohibition), so this never actually needs its own
    // result mid-construction — it's a value placeholder.
    let id = NodeId(nodes.len());
    nodes.push(ForestNode { lhs: lhs.to_string(), start, end, alternatives: Vec::new() });
    index.insert(key, id);

    let mut alternatives = Vec::new();
    for &prod in grammar.prods_for(lhs) {
        let production = grammar.production(prod);
        if production.rhs.is_empty() {
            if start == end {
                alternatives.push(Alternative { prod, children: Vec::new() });
            }
            continue;
        }
        if !was_completed(chart, prod, start, end, grammar) {
            continue;
        }
        let mut found = Vec::new();
        collect_alternatives(
            grammar,
            chart,
            tokens,
            &production.rhs,
            0,
            start,
            end,
            &mut Vec::new(),
            &mut found,
            nodes,
            index,
            (lhs.to_string(), start, end),
        );
        for children in found {
            alternatives.push(Alternative { prod, children });
        }
    }

    nodes[id.0].alternatives = alternatives;
    id
}

#[allow(clippy::too_many_arguments)]
fn collect_alternatives<T>(
    grammar: &Grammar<T>,
    chart: &Chart<'_, T>,
    tokens: &[T],
    rhs: &[Symbol<T>],
    dot: usize,
    pos: usize,
    end: usize,
    acc: &mut Vec<Child<T>>,
    out: &mut Vec<Vec<Child<T>>>,
    nodes: &mut Vec<ForestNode<T>>,
    index: &mut HashMap<NodeKey, NodeId>,
    self_identity: (String, usize, usize),
) where
    T: Eq + Hash + Clone + fmt::Debug,
{
    if dot == rhs.len() {
        if pos == end {
            out.push(acc.clone());
        }
        return;
    }
    if pos > end {
        return;
    }

    match &rhs[dot] {
        Symbol::Terminal(_) | Symbol::Any => {
            if pos < end && pos < tokens.len() {
                acc.push(Child::Leaf(tokens[pos].clone()));
                collect_alternatives(
                    grammar, chart, tokens, rhs, dot + 1, pos + 1, end, acc, out, nodes, index,
                    self_identity,
                );
                acc.pop();
            }
        }
        Symbol::NonTerminal(name) => {
            for candidate_end in pos..=end {
                let identity = (name.clone(), pos, candidate_end);
                if identity == self_identity {
                    continue;
                }
                if !grammar
                    .prods_for(name)
                    .iter()
                    .any(|&p| was_completed(chart, p, pos, candidate_end, grammar))
                {
                    continue;
                }
                let child_id =
                    get_or_build_node(grammar, chart, tokens, name, pos, candidate_end, nodes, index);
                acc.push(Child::Node(child_id));
                collect_alternatives(
                    grammar, chart, tokens, rhs, dot + 1, candidate_end, end, acc, out, nodes, index,
                    self_identity,
                );
                acc.pop();
            }
        }
    }
}

fn was_completed<T>(chart: &Chart<'_, T>, prod: ProdId, start: usize, end: usize, grammar: &Grammar<T>) -> bool
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    use crate::chart::ItemKey;
    let dot = grammar.production(prod).rhs.len();
    chart.sets[end].contains(&ItemKey { prod, dot, start })
}
