//! BNF-normalized grammar model: productions, the nullable set, and the
//! declarative disambiguation rules that travel alongside a grammar into the
//! forest builder.

use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Stable identifier of a production within a [`Grammar`]; it is simply the
/// production's index into `Grammar::productions`, so two `ProdId`s compare
/// equal iff they name the same production.
pub type ProdId = usize;

/// A symbol on the right-hand side of a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol<T> {
    /// A reference to another non-terminal, by name.
    NonTerminal(String),
    /// A single concrete token that must match by value equality.
    Terminal(T),
    /// The wildcard `·`: matches any single input token.
    Any,
}

impl<T: fmt::Display> fmt::Display for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::NonTerminal(n) => write!(f, "{n}"),
            Symbol::Terminal(t) => write!(f, "{t}"),
            Symbol::Any => write!(f, "·"),
        }
    }
}

/// A single production `A -> alpha`. An empty `rhs` is an epsilon production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production<T> {
    pub lhs: String,
    pub rhs: Vec<Symbol<T>>,
}

impl<T: fmt::Display> fmt::Display for Production<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for s in &self.rhs {
            write!(f, " {s}")?;
        }
        Ok(())
    }
}

/// Errors raised while freezing a [`Grammar`], surfaced at parser
/// construction time rather than during recognition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("start symbol `{0}` has no production")]
    NoStartProduction(String),
    #[error("non-terminal `{0}` is referenced but has no production (and is not the wildcard)")]
    DanglingNonTerminal(String),
    #[error("empty terminal literal in a production for `{0}`")]
    EmptyTerminalLiteral(String),
}

/// Left/right/no associativity for a production, or a group of equal-priority
/// productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    None,
}

/// A rejection predicate: either an exact literal match on a node's yield, or
/// a regex that must fully match it.
#[derive(Debug, Clone)]
pub enum RejectRule {
    Literal(String),
    Regex(Regex),
}

impl RejectRule {
    fn matches(&self, yielded: &str) -> bool {
        match self {
            RejectRule::Literal(s) => s == yielded,
            RejectRule::Regex(re) => re
                .find(yielded)
                .map(|m| m.start() == 0 && m.end() == yielded.len())
                .unwrap_or(false),
        }
    }
}

/// Key under which a follow-restriction is registered: either a non-terminal
/// name, or (rarely) the literal yield of a terminal production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FollowKey {
    NonTerminal(String),
    Literal(String),
}

/// The disambiguation rule bundle attached to a [`Grammar`].
///
/// Built with the small fluent builder methods below; every rule that names a
/// production id or non-terminal the grammar doesn't actually have becomes
/// silently inactive (a `tracing::warn!` fires once at [`Grammar::freeze`]
/// time, collected in [`Validator::warnings`]) rather than a hard error.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    priority: HashMap<ProdId, HashSet<ProdId>>,
    priority_closure: HashMap<ProdId, HashSet<ProdId>>,
    associativity: HashMap<ProdId, Direction>,
    assoc_groups: Vec<(Direction, HashSet<ProdId>)>,
    reject: HashMap<String, Vec<RejectRule>>,
    follow_restriction: HashMap<FollowKey, Vec<Regex>>,
    prefer: HashMap<String, HashSet<ProdId>>,
    avoid: HashMap<String, HashSet<ProdId>>,
    warnings: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `higher` has strictly higher priority than `lower`: an alternative
    /// with `lower` as a direct child of a node built from `higher` is
    /// discarded.
    pub fn priority(mut self, higher: ProdId, lower: ProdId) -> Self {
        self.priority.entry(higher).or_default().insert(lower);
        self
    }

    pub fn associativity(mut self, prod: ProdId, dir: Direction) -> Self {
        self.associativity.insert(prod, dir);
        self
    }

    pub fn assoc_group(mut self, dir: Direction, group: impl IntoIterator<Item = ProdId>) -> Self {
        self.assoc_groups.push((dir, group.into_iter().collect()));
        self
    }

    pub fn reject_literal(mut self, lhs: impl Into<String>, literal: impl Into<String>) -> Self {
        self.reject
            .entry(lhs.into())
            .or_default()
            .push(RejectRule::Literal(literal.into()));
        self
    }

    pub fn reject_regex(mut self, lhs: impl Into<String>, re: Regex) -> Self {
        self.reject
            .entry(lhs.into())
            .or_default()
            .push(RejectRule::Regex(re));
        self
    }

    pub fn follow_restriction(mut self, key: FollowKey, re: Regex) -> Self {
        self.follow_restriction.entry(key).or_default().push(re);
        self
    }

    pub fn prefer(mut self, lhs: impl Into<String>, prods: impl IntoIterator<Item = ProdId>) -> Self {
        self.prefer
            .entry(lhs.into())
            .or_default()
            .extend(prods);
        self
    }

    pub fn avoid(mut self, lhs: impl Into<String>, prods: impl IntoIterator<Item = ProdId>) -> Self {
        self.avoid.entry(lhs.into()).or_default().extend(prods);
        self
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn lower_of(&self, prod: ProdId) -> Option<&HashSet<ProdId>> {
        self.priority_closure.get(&prod)
    }

    pub(crate) fn direction_for(&self, prod: ProdId) -> Option<Direction> {
        if let Some(d) = self.associativity.get(&prod) {
            return Some(*d);
        }
        self.assoc_groups
            .iter()
            .find(|(_, g)| g.contains(&prod))
            .map(|(d, _)| *d)
    }

    pub(crate) fn assoc_group_of(&self, prod: ProdId) -> Option<&HashSet<ProdId>> {
        self.assoc_groups
            .iter()
            .find(|(_, g)| g.contains(&prod))
            .map(|(_, g)| g)
    }

    pub(crate) fn reject_for(&self, lhs: &str) -> Option<&[RejectRule]> {
        self.reject.get(lhs).map(|v| v.as_slice())
    }

    pub(crate) fn follow_restriction_for(&self, key: &FollowKey) -> Option<&[Regex]> {
        self.follow_restriction.get(key).map(|v| v.as_slice())
    }

    pub(crate) fn prefer_for(&self, lhs: &str) -> Option<&HashSet<ProdId>> {
        self.prefer.get(lhs)
    }

    pub(crate) fn avoid_for(&self, lhs: &str) -> Option<&HashSet<ProdId>> {
        self.avoid.get(lhs)
    }

    /// Transitive closure of `priority`, and a collection of warnings for
    /// rules that reference productions the grammar doesn't have. Called
    /// once by `Grammar::freeze`.
    fn finalize(&mut self, prod_count: usize) {
        let known: HashSet<ProdId> = (0..prod_count).collect();
        for (p, lowers) in &self.priority {
            if !known.contains(p) || lowers.iter().any(|l| !known.contains(l)) {
                self.warnings.push(format!(
                    "priority rule referencing unknown production {p} is inactive"
                ));
            }
        }

        // Floyd–Warshall-ish closure over a possibly sparse graph: fixed
        // point iteration is simpler to follow here than a topo-sort, and
        // the priority DAG is tiny in practice.
        let mut closure = self.priority.clone();
        let mut changed = true;
        while changed {
            changed = false;
            let snapshot = closure.clone();
            for (p, lowers) in &snapshot {
                let mut extra = Vec::new();
                for l in lowers {
                    if let Some(further) = snapshot.get(l) {
                        for f in further {
                            if !closure.get(p).map(|s| s.contains(f)).unwrap_or(false) {
                                extra.push(*f);
                            }
                        }
                    }
                }
                if !extra.is_empty() {
                    changed = true;
                    closure.entry(*p).or_default().extend(extra);
                }
            }
        }
        self.priority_closure = closure;
    }
}

/// An immutable, BNF-normalized grammar: productions grouped by left-hand
/// side, the memoized nullable set, the start symbol, and the validator
/// bundle.
#[derive(Debug, Clone)]
pub struct Grammar<T> {
    productions: Vec<Production<T>>,
    by_lhs: HashMap<String, Vec<ProdId>>,
    start: String,
    nullable: HashSet<String>,
    validator: Validator,
}

impl<T> Grammar<T> {
    /// Freeze a grammar: group productions, compute the nullable set, check
    /// structural invariants, and finalize the validator's priority closure.
    pub fn freeze(
        productions: Vec<Production<T>>,
        start: impl Into<String>,
        mut validator: Validator,
    ) -> Result<Self, GrammarError> {
        let start = start.into();
        let mut by_lhs: HashMap<String, Vec<ProdId>> = HashMap::new();
        for (id, p) in productions.iter().enumerate() {
            by_lhs.entry(p.lhs.clone()).or_default().push(id);
        }

        if !by_lhs.contains_key(&start) {
            return Err(GrammarError::NoStartProduction(start));
        }

        let mut referenced: HashSet<&str> = HashSet::new();
        for p in &productions {
            for s in &p.rhs {
                if let Symbol::NonTerminal(n) = s {
                    referenced.insert(n.as_str());
                }
            }
        }
        for n in &referenced {
            if !by_lhs.contains_key(*n) {
                return Err(GrammarError::DanglingNonTerminal((*n).to_string()));
            }
        }

        let nullable = Self::compute_nullable(&productions);
        validator.finalize(productions.len());

        for w in validator.warnings() {
            tracing::warn!("{w}");
        }

        Ok(Self {
            productions,
            by_lhs,
            start,
            nullable,
            validator,
        })
    }

    fn compute_nullable(productions: &[Production<T>]) -> HashSet<String> {
        let mut nullable: HashSet<String> = HashSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for p in productions {
                if nullable.contains(&p.lhs) {
                    continue;
                }
                let all_nullable = p.rhs.iter().all(|s| match s {
                    Symbol::NonTerminal(n) => nullable.contains(n),
                    Symbol::Terminal(_) | Symbol::Any => false,
                });
                if all_nullable {
                    nullable.insert(p.lhs.clone());
                    changed = true;
                }
            }
        }
        nullable
    }

    pub fn productions(&self) -> &[Production<T>] {
        &self.productions
    }

    pub fn production(&self, id: ProdId) -> &Production<T> {
        &self.productions[id]
    }

    pub fn prods_for(&self, lhs: &str) -> &[ProdId] {
        self.by_lhs.get(lhs).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn is_nullable(&self, lhs: &str) -> bool {
        self.nullable.contains(lhs)
    }

    pub fn nullable(&self) -> &HashSet<String> {
        &self.nullable
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

pub(crate) fn yield_matches(rule: &RejectRule, yielded: &str) -> bool {
    rule.matches(yielded)
}
