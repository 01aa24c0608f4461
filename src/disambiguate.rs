//! The disambiguation pipeline: a pure function from a built [`Forest`] to a
//! pruned one. Rules are applied in a fixed order — prefer/avoid, reject,
//! follow-restriction, priority, associativity — then the forest is
//! garbage-collected so no alternative dangles on a node that lost every
//! alternative of its own.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::forest::{Child, Forest, ForestNode, NodeId};
use crate::grammar::{Direction, FollowKey, ProdId};

/// Apply every rule registered on the forest's grammar's
/// [`crate::grammar::Validator`] and return a new, pruned forest.
#[tracing::instrument(skip_all)]
pub fn disambiguate<'g, T>(forest: &Forest<'g, T>, tokens: &[T]) -> Forest<'g, T>
where
    T: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    let grammar = forest.grammar;
    let mut nodes: Vec<ForestNode<T>> = forest.nodes.clone();

    apply_prefer_avoid(grammar, &mut nodes);
    apply_reject(forest, &mut nodes);
    apply_follow_restriction(forest, &mut nodes, tokens);
    apply_priority(grammar, &mut nodes);
    apply_associativity(grammar, &mut nodes);

    let (nodes, remap) = garbage_collect(nodes);
    let roots = forest.roots.iter().filter_map(|r| remap.get(r).copied()).collect();

    Forest { grammar, nodes, roots }
}

/// prefer/avoid: keyed by the node's own lhs. If any alternative was built
/// from a "preferred" production, every alternative built from a non-
/// preferred production is dropped; separately, alternatives built from an
/// "avoided" production are dropped unless doing so would empty the node.
fn apply_prefer_avoid<T>(grammar: &crate::grammar::Grammar<T>, nodes: &mut [ForestNode<T>]) {
    let validator = grammar.validator();
    for node in nodes.iter_mut() {
        if let Some(avoid) = validator.avoid_for(&node.lhs) {
            let kept: Vec<_> = node
                .alternatives
                .iter()
                .filter(|a| !avoid.contains(&a.prod))
                .cloned()
                .collect();
            if !kept.is_empty() {
                node.alternatives = kept;
            }
        }
        if let Some(prefer) = validator.prefer_for(&node.lhs) {
            let preferred: Vec<_> = node
                .alternatives
                .iter()
                .filter(|a| prefer.contains(&a.prod))
                .cloned()
                .collect();
            if !preferred.is_empty() {
                node.alternatives = preferred;
            }
        }
    }
}

/// reject: drop every alternative of a node whose own yield matches a reject
/// rule registered for that node's left-hand side.
fn apply_reject<T>(forest: &Forest<'_, T>, nodes: &mut [ForestNode<T>])
where
    T: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    let validator = forest.grammar.validator();
    for idx in 0..nodes.len() {
        let lhs = nodes[idx].lhs.clone();
        let Some(rules) = validator.reject_for(&lhs) else { continue };
        let yielded = forest.yield_of(NodeId(idx));
        if rules.iter().any(|r| crate::grammar::yield_matches(r, &yielded)) {
            nodes[idx].alternatives.clear();
        }
    }
}

/// follow-restriction: a non-terminal tagged with a follow-restriction regex
/// is only kept alive if the tokens immediately following its span match
/// that regex from the start (an empty tail at end-of-input is matched
/// against the empty string, same as any other tail).
fn apply_follow_restriction<T>(forest: &Forest<'_, T>, nodes: &mut [ForestNode<T>], tokens: &[T])
where
    T: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    let validator = forest.grammar.validator();
    for node in nodes.iter_mut() {
        let key = FollowKey::NonTerminal(node.lhs.clone());
        let Some(patterns) = validator.follow_restriction_for(&key) else { continue };
        let tail_start = node.end.min(tokens.len());
        let follow: String = tokens[tail_start..].iter().map(|t| t.to_string()).collect();
        let ok = patterns
            .iter()
            .any(|re| re.find(&follow).map(|m| m.start() == 0).unwrap_or(false));
        if !ok {
            node.alternatives.clear();
        }
    }
}

/// priority: an alternative built from production `P` is discarded if any
/// of its direct non-terminal children is a node that could itself be built
/// from a production in `Lower(P)` — i.e. a lower-priority operation
/// appearing unparenthesized as a direct child of a higher-priority one.
/// "Could itself be built from" means *any* of the child node's own
/// alternatives uses that production, the same conservative reading
/// `apply_associativity` gives "the child's production" below.
fn apply_priority<T>(grammar: &crate::grammar::Grammar<T>, nodes: &mut [ForestNode<T>]) {
    let validator = grammar.validator();
    let prod_sets: Vec<Vec<ProdId>> = nodes
        .iter()
        .map(|n| n.alternatives.iter().map(|a| a.prod).collect())
        .collect();

    for node in nodes.iter_mut() {
        let mut kept = Vec::new();
        for alt in node.alternatives.iter() {
            let Some(lower) = validator.lower_of(alt.prod) else {
                kept.push(alt.clone());
                continue;
            };
            let has_dominated_child = alt.children.iter().any(|c| match c {
                Child::Node(id) => prod_sets[id.0].iter().any(|p| lower.contains(p)),
                Child::Leaf(_) => false,
            });
            if !has_dominated_child {
                kept.push(alt.clone());
            }
        }
        if !kept.is_empty() {
            node.alternatives = kept;
        }
    }
}

/// associativity: for a node whose production(s) are tagged Left, Right, or
/// None, drop alternatives that recurse on the disallowed side. A Left rule
/// keeps alternatives that nest the same (or the same group's) production on
/// their leftmost child and forbids it on the rightmost child, and
/// vice-versa for Right; None forbids that production as *any* child at
/// all, so an alternative where the operator nests itself on either side is
/// simply invalid (this can legitimately drop every alternative of a node,
/// i.e. zero surviving trees, when every split re-nests the same production).
fn apply_associativity<T>(grammar: &crate::grammar::Grammar<T>, nodes: &mut [ForestNode<T>]) {
    let validator = grammar.validator();
    let snapshot_lhs: Vec<(String, ProdOf)> =
        nodes.iter().map(|n| (n.lhs.clone(), ProdOf::from(n))).collect();

    for node in nodes.iter_mut() {
        let dirs: Vec<Option<Direction>> = node
            .alternatives
            .iter()
            .map(|a| validator.direction_for(a.prod))
            .collect();
        if dirs.iter().all(Option::is_none) {
            continue;
        }
        let in_group = |prod: usize, around: usize| -> bool {
            if let Some(g) = validator.assoc_group_of(around) {
                g.contains(&prod)
            } else {
                prod == around
            }
        };

        let mut kept = Vec::new();
        for (alt, dir) in node.alternatives.iter().zip(dirs.iter()) {
            let Some(dir) = dir else {
                kept.push(alt.clone());
                continue;
            };
            let nests_prod = |id: &NodeId, alt_prod: ProdId| -> bool {
                let (lhs, prod_of) = &snapshot_lhs[id.0];
                lhs == &node.lhs && prod_of.0.iter().any(|&p| in_group(p, alt_prod))
            };
            let recurses = |children: &[Child<T>], want_last: bool| -> bool {
                let c = if want_last { children.last() } else { children.first() };
                matches!(c, Some(Child::Node(id)) if nests_prod(id, alt.prod))
            };
            let recurses_any = |children: &[Child<T>]| -> bool {
                children
                    .iter()
                    .any(|c| matches!(c, Child::Node(id) if nests_prod(id, alt.prod)))
            };
            let keep = match dir {
                Direction::Left => !recurses(&alt.children, true),
                Direction::Right => !recurses(&alt.children, false),
                Direction::None => !recurses_any(&alt.children),
            };
            if keep {
                kept.push(alt.clone());
            }
        }
        // Unlike prefer/avoid (which backs off rather than emptying a node),
        // associativity rejection is unconditional: a `None` rule whose every
        // alternative re-nests the same production legitimately empties this
        // node, and that must propagate (zero surviving trees), not silently
        // fall back to the unfiltered alternatives.
        node.alternatives = kept;
    }
}

/// The set of productions any alternative of a node was built from — used by
/// associativity to test whether a child node could itself be an instance of
/// the same (or grouped) production.
struct ProdOf(Vec<usize>);

impl<T> From<&ForestNode<T>> for ProdOf {
    fn from(n: &ForestNode<T>) -> Self {
        ProdOf(n.alternatives.iter().map(|a| a.prod).collect())
    }
}

fn garbage_collect<T>(nodes: Vec<ForestNode<T>>) -> (Vec<ForestNode<T>>, HashMap<NodeId, NodeId>)
where
    T: Clone,
{
    let mut alive: Vec<bool> = nodes.iter().map(|n| !n.alternatives.is_empty()).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for (i, node) in nodes.iter().enumerate() {
            if !alive[i] {
                continue;
            }
            let any_live = node.alternatives.iter().any(|alt| {
                alt.children.iter().all(|c| match c {
                    Child::Leaf(_) => true,
                    Child::Node(id) => alive[id.0],
                })
            });
            if !any_live {
                alive[i] = false;
                changed = true;
            }
        }
    }

    let mut filtered = nodes;
    for (i, node) in filtered.iter_mut().enumerate() {
        if !alive[i] {
            continue;
        }
        node.alternatives.retain(|alt| {
            alt.children.iter().all(|c| match c {
                Child::Leaf(_) => true,
                Child::Node(id) => alive[id.0],
            })
        });
    }

    let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
    let mut out: Vec<ForestNode<T>> = Vec::new();
    for (i, node) in filtered.into_iter().enumerate() {
        if alive[i] && !node.alternatives.is_empty() {
            remap.insert(NodeId(i), NodeId(out.len()));
            out.push(node);
        }
    }
    for node in &mut out {
        for alt in &mut node.alternatives {
            for c in alt.children.iter_mut() {
                if let Child::Node(id) = c {
                    *id = *remap.get(id).expect("child survived GC liveness check above");
                }
            }
        }
    }

    (out, remap)
}
