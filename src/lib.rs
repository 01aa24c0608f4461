//! A general context-free parser for potentially ambiguous grammars.
//!
//! Given a [`grammar::Grammar`] (productions over terminals and
//! non-terminals, plus a start symbol) and an input token sequence, this
//! crate decides membership in the language with an Earley recognizer that
//! tolerates nullable non-terminals and a wildcard "any token" symbol,
//! builds a shared packed parse forest holding *every* derivation, prunes it
//! with a declarative [`grammar::Validator`] (priority, associativity,
//! reject, follow-restriction, prefer/avoid), and lazily enumerates the
//! surviving trees.
//!
//! ```rust
//! use thicket::{build_parser, grammar::{Grammar, Production, Symbol, Validator}};
//!
//! // S -> 'a' S | 'b'
//! let prods = vec![
//!     Production { lhs: "S".into(), rhs: vec![Symbol::Terminal('a'), Symbol::NonTerminal("S".into())] },
//!     Production { lhs: "S".into(), rhs: vec![Symbol::Terminal('b')] },
//! ];
//! let grammar = Grammar::freeze(prods, "S", Validator::new()).unwrap();
//! let parser = build_parser(grammar);
//!
//! let tokens: Vec<char> = "aaaab".chars().collect();
//! assert!(parser.recognize(&tokens));
//!
//! let forest = parser.parse(&tokens);
//! assert_eq!(forest.count(), 1);
//! ```

pub mod annotate;
pub mod chart;
pub mod diagnostics;
pub mod disambiguate;
pub mod enumerate;
pub mod forest;
pub mod grammar;
pub mod surface;
pub mod tokenizer;

use std::fmt;
use std::hash::Hash;

pub use annotate::AnnotationError;
pub use diagnostics::{ParseFailure, RuleHint};
pub use enumerate::{Enumerator, Tree};
pub use forest::NodeId;
pub use grammar::{Direction, FollowKey, Grammar, GrammarError, ProdId, Production, Symbol, Validator};

/// Build a [`Parser`] from an already-frozen [`Grammar`]. `grammar` must be
/// BNF-normalized, which [`Grammar::freeze`] already guarantees: this
/// function can't itself fail.
pub fn build_parser<T>(grammar: Grammar<T>) -> Parser<T> {
    Parser { grammar }
}

/// A frozen grammar bound into a recognize/parse pipeline. Read-only once
/// built: a `Parser` may be shared (e.g. behind an `Arc`) across concurrently
/// parsed inputs, since recognition and forest-building never mutate the
/// grammar they read.
pub struct Parser<T> {
    grammar: Grammar<T>,
}

impl<T> Parser<T>
where
    T: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    /// Equivalent to [`build_parser`], as an associated constructor.
    pub fn new(grammar: Grammar<T>) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &Grammar<T> {
        &self.grammar
    }

    /// Decide membership in the language without building a forest.
    #[tracing::instrument(skip_all, fields(n = input.len()))]
    pub fn recognize(&self, input: &[T]) -> bool {
        chart::Chart::recognize(&self.grammar, input).accepted()
    }

    /// Recognize `input`, build the shared packed parse forest, and prune it
    /// with the grammar's validator. Always returns a [`ParsedForest`],
    /// whose [`ParsedForest::count`] is simply `0` when `input` is not in
    /// the language — recognition failure is a value, not an error, per the
    /// core's error-handling design.
    #[tracing::instrument(skip_all, fields(n = input.len()))]
    pub fn parse(&self, input: &[T]) -> ParsedForest<'_, T> {
        let chart = chart::Chart::recognize(&self.grammar, input);
        let built = forest::Forest::build(&chart, input);
        let pruned = disambiguate::disambiguate(&built, input);
        ParsedForest { inner: pruned, tokens: input.to_vec() }
    }

    /// Like [`Parser::parse`], but surfaces a [`ParseFailure`] with
    /// furthest-progress diagnostics instead of silently returning a
    /// zero-tree forest.
    pub fn try_parse(&self, input: &[T]) -> Result<ParsedForest<'_, T>, ParseFailure> {
        let chart = chart::Chart::recognize(&self.grammar, input);
        if !chart.accepted() {
            let debug: Vec<String> = input.iter().map(|t| format!("{t:?}")).collect();
            return Err(ParseFailure::from_chart(&chart, &debug));
        }
        let built = forest::Forest::build(&chart, input);
        let pruned = disambiguate::disambiguate(&built, input);
        Ok(ParsedForest { inner: pruned, tokens: input.to_vec() })
    }
}

/// The disambiguated forest returned by [`Parser::parse`]: the pruned DAG
/// plus the input tokens it was built over. `count() == 0` means the
/// grammar's rules pruned away every derivation (including the case where
/// the input was never in the language to begin with).
pub struct ParsedForest<'g, T> {
    inner: forest::Forest<'g, T>,
    tokens: Vec<T>,
}

impl<'g, T> ParsedForest<'g, T> {
    fn root(&self) -> Option<NodeId> {
        self.inner.roots().first().copied()
    }

    pub fn grammar(&self) -> &'g Grammar<T> {
        self.inner.grammar()
    }

    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    /// Number of forest nodes that survived pruning, mostly useful for
    /// diagnostics and tests.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }
}

impl<'g, T: Clone> ParsedForest<'g, T> {
    /// Number of surviving trees, computed in time linear in the forest
    /// size rather than by enumerating.
    pub fn count(&self) -> u128 {
        match self.root() {
            Some(r) => enumerate::count(&self.inner, r),
            None => 0,
        }
    }

    /// A lazy sequence over every surviving tree, in deterministic
    /// (alternative-index, left-to-right) order.
    pub fn trees(&self) -> Enumerator<'_, 'g, T> {
        Enumerator::new(&self.inner, self.root())
    }

    /// If exactly one tree survived, fold it bottom-up through `binder`,
    /// otherwise `None`. `binder` receives the production used at a node,
    /// the already-folded annotations of its non-terminal children in
    /// left-to-right order, and the slice of tokens the node spans.
    pub fn unique_annotated<A>(&self, mut binder: impl FnMut(&Production<T>, Vec<A>, &[T]) -> A) -> Option<A> {
        let root = self.root()?;
        annotate::unique_annotated(&self.inner, root, &self.tokens, &mut binder)
    }

    /// [`ParsedForest::unique_annotated`], but reporting the actual tree
    /// count as an [`AnnotationError`] instead of collapsing it to `None`.
    pub fn try_unique_annotated<A>(
        &self,
        mut binder: impl FnMut(&Production<T>, Vec<A>, &[T]) -> A,
    ) -> Result<A, AnnotationError> {
        let Some(root) = self.root() else {
            return Err(AnnotationError { found: 0 });
        };
        annotate::try_unique_annotated(&self.inner, root, &self.tokens, &mut binder)
    }
}

impl<'g, T> ParsedForest<'g, T>
where
    T: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    /// The textual yield of a node — mostly exposed for debugging grammars
    /// with reject/follow-restriction rules interactively.
    pub fn yield_of(&self, id: NodeId) -> String {
        self.inner.yield_of(id)
    }
}
