//! Furthest-progress diagnostics: when recognition fails, report the
//! rightmost position reached and the productions that were waiting on a
//! token there, rather than just "no".

use std::fmt;

use crate::chart::Chart;
use crate::grammar::Symbol;

/// One production that had advanced to some point at the furthest-progress
/// position, paired with what it still expected next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHint {
    pub lhs: String,
    pub expected: String,
    pub start: usize,
}

impl fmt::Display for RuleHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while parsing `{}` (from {}), expected {}", self.lhs, self.start, self.expected)
    }
}

/// Raised by [`crate::Parser::parse`] when the input is not in the language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse failed at position {pos}{}", found.as_ref().map(|f| format!(", found {f}")).unwrap_or_else(|| " (end of input)".to_string()))]
pub struct ParseFailure {
    pub pos: usize,
    pub found: Option<String>,
    pub hints: Vec<RuleHint>,
}

impl ParseFailure {
    /// Walk the chart to find the furthest position reached, and collect
    /// hints from every item stalled there.
    pub(crate) fn from_chart<T>(chart: &Chart<'_, T>, tokens_debug: &[String]) -> Self
    where
        T: Eq + std::hash::Hash + Clone + fmt::Debug,
    {
        let grammar = chart.grammar();
        let furthest = chart
            .sets
            .iter()
            .enumerate()
            .rev()
            .find(|(_, set)| !set.is_empty())
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut hints = Vec::new();
        for item in &chart.sets[furthest] {
            let p = grammar.production(item.prod);
            if item.dot < p.rhs.len() {
                let expected = match &p.rhs[item.dot] {
                    Symbol::Terminal(t) => format!("{t:?}"),
                    Symbol::NonTerminal(n) => format!("`{n}`"),
                    Symbol::Any => "any token".to_string(),
                };
                hints.push(RuleHint { lhs: p.lhs.clone(), expected, start: item.start });
            }
        }
        hints.sort_by(|a, b| (a.lhs.clone(), a.start).cmp(&(b.lhs.clone(), b.start)));
        hints.dedup();

        let found = tokens_debug.get(furthest).cloned();
        ParseFailure { pos: furthest, found, hints }
    }
}
