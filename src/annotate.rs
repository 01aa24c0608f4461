//! The annotation hook: when exactly one tree survives enumeration, fold a
//! disambiguated forest bottom-up into a caller-supplied type `A`, letting
//! the host attach semantic behavior keyed by each node's production.

use thiserror::Error;

use crate::enumerate::count;
use crate::forest::{Child, Forest, NodeId};
use crate::grammar::Production;

/// Raised by [`try_unique_annotated`] when a grammar's forest did not
/// collapse to exactly one tree, for callers who want `?`-ergonomics instead
/// of matching on an `Option`. [`Forest::unique_annotated`] itself never
/// errors — it simply returns `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("expected exactly one surviving parse tree, found {found}")]
pub struct AnnotationError {
    pub found: u128,
}

/// Fold the single surviving tree rooted at `id` bottom-up through `binder`,
/// or return `None` if more (or fewer) than one tree survives. `binder`
/// receives the production used at a node, the already-folded annotations of
/// its non-terminal children in left-to-right order, and the slice of
/// tokens spanned by the node (useful for reading terminal text directly).
pub fn unique_annotated<T, A>(
    forest: &Forest<'_, T>,
    id: NodeId,
    tokens: &[T],
    binder: &mut impl FnMut(&Production<T>, Vec<A>, &[T]) -> A,
) -> Option<A>
where
    T: Clone,
{
    if count(forest, id) != 1 {
        return None;
    }
    Some(fold_unique(forest, id, tokens, binder))
}

/// [`unique_annotated`], but reporting the actual tree count as an
/// [`AnnotationError`] instead of collapsing the reason to `None`.
pub fn try_unique_annotated<T, A>(
    forest: &Forest<'_, T>,
    id: NodeId,
    tokens: &[T],
    binder: &mut impl FnMut(&Production<T>, Vec<A>, &[T]) -> A,
) -> Result<A, AnnotationError>
where
    T: Clone,
{
    let found = count(forest, id);
    if found != 1 {
        return Err(AnnotationError { found });
    }
    Ok(fold_unique(forest, id, tokens, binder))
}

fn fold_unique<T, A>(
    forest: &Forest<'_, T>,
    id: NodeId,
    tokens: &[T],
    binder: &mut impl FnMut(&Production<T>, Vec<A>, &[T]) -> A,
) -> A
where
    T: Clone,
{
    let node = forest.node(id);
    // count(id) == 1 guarantees exactly one alternative contributes, and
    // every non-terminal child it references itself has count == 1.
    let alt = &node.alternatives[0];
    let mut children = Vec::new();
    for child in &alt.children {
        if let Child::Node(cid) = child {
            children.push(fold_unique(forest, *cid, tokens, binder));
        }
    }
    let production = forest.grammar().production(alt.prod);
    let span = &tokens[node.start.min(tokens.len())..node.end.min(tokens.len())];
    binder(production, children, span)
}
