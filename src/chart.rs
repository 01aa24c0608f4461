//! The Earley recognizer: a chart of dotted items per input position, built
//! with the classic Scanner/Predictor/Completer triad plus Aycock–Horspool
//! nullable-folding so that nullable non-terminals never require a second
//! fixed-point pass over a completed set.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

use crate::grammar::{Grammar, ProdId, Symbol};

/// A dotted item's identity: which production, how far the dot has advanced,
/// and the chart position the item originated at. Two items with the same
/// key are the same item, regardless of how they were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub prod: ProdId,
    pub dot: usize,
    pub start: usize,
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(prod {}, dot {}, start {})", self.prod, self.dot, self.start)
    }
}

/// The chart built by [`Chart::recognize`]: one `HashSet<ItemKey>` per input
/// position `0..=n`.
pub struct Chart<'g, T> {
    grammar: &'g Grammar<T>,
    pub(crate) sets: Vec<HashSet<ItemKey>>,
}

impl<'g, T> Chart<'g, T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    /// Run the recognizer over `tokens`, producing a chart with `tokens.len()
    /// + 1` sets. Does not itself decide acceptance — call
    /// [`Chart::accepted`] afterwards.
    #[tracing::instrument(skip_all, fields(n = tokens.len()))]
    pub fn recognize(grammar: &'g Grammar<T>, tokens: &[T]) -> Self {
        let n = tokens.len();
        let mut sets: Vec<HashSet<ItemKey>> = (0..=n).map(|_| HashSet::new()).collect();

        // A FIFO worklist per position: items are appended as they're
        // discovered and drained in order, so an item added mid-scan of
        // position i is still processed before we move to i+1.
        let mut queue: VecDeque<(usize, ItemKey)> = VecDeque::new();

        for &prod in grammar.prods_for(grammar.start()) {
            let key = ItemKey { prod, dot: 0, start: 0 };
            if sets[0].insert(key) {
                queue.push_back((0, key));
            }
        }

        while let Some((pos, key)) = queue.pop_front() {
            let production = grammar.production(key.prod);
            let is_complete = key.dot >= production.rhs.len();

            if is_complete {
                // Completer: advance every item in sets[key.start] waiting on
                // this non-terminal. key.start < pos is always true here,
                // except for the epsilon case, which `seed_nullable` already
                // folds into the predictor below, so sets[key.start] is
                // always fully populated by the time we reach it.
                let waiting: Vec<ItemKey> = sets[key.start]
                    .iter()
                    .filter(|w| {
                        let wp = grammar.production(w.prod);
                        w.dot < wp.rhs.len()
                            && matches!(&wp.rhs[w.dot], Symbol::NonTerminal(n) if n == &production.lhs)
                    })
                    .copied()
                    .collect();
                for w in waiting {
                    let advanced = ItemKey { prod: w.prod, dot: w.dot + 1, start: w.start };
                    if sets[pos].insert(advanced) {
                        queue.push_back((pos, advanced));
                    }
                }
                continue;
            }

            match &production.rhs[key.dot] {
                Symbol::NonTerminal(name) => {
                    // Predictor, with magical completion: if the predicted
                    // non-terminal is nullable, also advance past it
                    // immediately, without waiting for an actual completed
                    // item to show up (Aycock & Horspool 2002).
                    for &p in grammar.prods_for(name) {
                        let predicted = ItemKey { prod: p, dot: 0, start: pos };
                        if sets[pos].insert(predicted) {
                            queue.push_back((pos, predicted));
                        }
                    }
                    if grammar.is_nullable(name) {
                        let advanced = ItemKey { prod: key.prod, dot: key.dot + 1, start: key.start };
                        if sets[pos].insert(advanced) {
                            queue.push_back((pos, advanced));
                        }
                    }
                }
                Symbol::Terminal(t) => {
                    if let Some(tok) = tokens.get(pos) {
                        if tok == t {
                            let advanced = ItemKey { prod: key.prod, dot: key.dot + 1, start: key.start };
                            if sets[pos + 1].insert(advanced) {
                                queue.push_back((pos + 1, advanced));
                            }
                        }
                    }
                }
                Symbol::Any => {
                    if pos < n {
                        let advanced = ItemKey { prod: key.prod, dot: key.dot + 1, start: key.start };
                        if sets[pos + 1].insert(advanced) {
                            queue.push_back((pos + 1, advanced));
                        }
                    }
                }
            }
        }

        Chart { grammar, sets }
    }

    /// True iff some production of the start symbol was completed across the
    /// whole input.
    pub fn accepted(&self) -> bool {
        let n = self.sets.len() - 1;
        let start = self.grammar.start();
        self.sets[n].iter().any(|item| {
            let p = self.grammar.production(item.prod);
            item.start == 0 && item.dot == p.rhs.len() && p.lhs == start
        })
    }

    pub fn grammar(&self) -> &'g Grammar<T> {
        self.grammar
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Every completed item `(prod, start, end)` ending exactly at `end`,
    /// i.e. the candidates a forest builder needs when closing out position
    /// `end`. Used by [`crate::forest`].
    pub fn completed_ending_at(&self, end: usize) -> Vec<ItemKey> {
        self.sets[end]
            .iter()
            .filter(|item| item.dot >= self.grammar.production(item.prod).rhs.len())
            .copied()
            .collect()
    }

    /// Debug rendering: every item set, one item per line.
    pub fn render(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for (i, set) in self.sets.iter().enumerate() {
            let _ = writeln!(out, "=== {i} ===");
            let mut items: Vec<_> = set.iter().collect();
            items.sort_by_key(|k| (k.prod, k.dot, k.start));
            for item in items {
                let p = self.grammar.production(item.prod);
                let _ = writeln!(out, "  {} [{}]", p, item);
            }
        }
        out
    }
}
