//! A small BNF-like text format for writing character grammars directly,
//! built as a handful of small `chumsky` combinators composed into one
//! top-level parser.
//!
//! ```text
//! Sum -> Sum '+' Product | Product ;
//! Product -> Product '*' Digit | Digit ;
//! Digit -> '0' | '1' | '2' | '3' | '4' | '5' | '6' | '7' | '8' | '9' ;
//! ```
//!
//! The first rule's left-hand side becomes the grammar's start symbol. A
//! quoted multi-character literal (`"ab"`) expands into one terminal symbol
//! per character, so the core recognizer never needs to know about
//! multi-character terminals. `.` stands for the wildcard symbol.

use chumsky::prelude::*;
use thiserror::Error;

use crate::grammar::{Grammar, GrammarError, Production, Symbol, Validator};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SurfaceSymbol {
    Terminal(String),
    NonTerminal(String),
    Any,
}

#[derive(Debug, Clone)]
struct SurfaceRule {
    lhs: String,
    alternatives: Vec<Vec<SurfaceSymbol>>,
}

/// Errors raised while reading grammar text, wrapping either a syntax
/// problem in the text itself or a structural problem in the grammar it
/// describes.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("syntax error in grammar text: {0}")]
    Syntax(String),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

fn ident<'a>() -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> {
    text::ident().to_slice().map(|s: &str| s.to_string())
}

fn quoted_literal<'a>() -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> {
    let escape = just('\\').ignore_then(any());
    let dq = just('"')
        .ignore_then(escape.or(none_of('"')).repeated().collect::<String>())
        .then_ignore(just('"'));
    let sq = just('\'')
        .ignore_then(escape.or(none_of('\'')).repeated().collect::<String>())
        .then_ignore(just('\''));
    dq.or(sq)
}

fn symbol<'a>() -> impl Parser<'a, &'a str, SurfaceSymbol, extra::Err<Rich<'a, char>>> {
    let any_wildcard = just('.').to(SurfaceSymbol::Any);
    let terminal = quoted_literal().map(SurfaceSymbol::Terminal);
    let nonterminal = ident().map(SurfaceSymbol::NonTerminal);
    any_wildcard.or(terminal).or(nonterminal)
}

fn rule<'a>() -> impl Parser<'a, &'a str, SurfaceRule, extra::Err<Rich<'a, char>>> {
    let ws = text::whitespace();
    let sequence = symbol()
        .separated_by(text::whitespace().at_least(1))
        .allow_leading()
        .collect::<Vec<_>>();
    let alternatives = sequence
        .separated_by(ws.clone().then(just('|')).then(ws.clone()))
        .at_least(1)
        .collect::<Vec<_>>();

    ident()
        .then_ignore(ws.clone())
        .then_ignore(just("->").or(just("::=")))
        .then_ignore(ws)
        .then(alternatives)
        .then_ignore(text::whitespace())
        .then_ignore(just(';'))
        .map(|(lhs, alternatives)| SurfaceRule { lhs, alternatives })
}

fn grammar_text<'a>() -> impl Parser<'a, &'a str, Vec<SurfaceRule>, extra::Err<Rich<'a, char>>> {
    text::whitespace()
        .ignore_then(rule().padded())
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
}

/// Parse `text` into a [`Grammar<char>`]. The first rule's left-hand side is
/// taken as the start symbol; rules attach no disambiguation behavior — use
/// [`Grammar::freeze`] directly (with a [`Validator`]) when rules are
/// needed, passing in the same productions this function would build.
pub fn parse_grammar(text: &str) -> Result<Grammar<char>, SurfaceError> {
    let rules = grammar_text()
        .parse(text)
        .into_result()
        .map_err(|errs| SurfaceError::Syntax(render_errors(text, &errs)))?;

    let start = rules[0].lhs.clone();
    let mut productions = Vec::new();
    for r in rules {
        for alt in r.alternatives {
            let mut rhs = Vec::new();
            for sym in alt {
                match sym {
                    SurfaceSymbol::Terminal(text) => {
                        if text.is_empty() {
                            return Err(GrammarError::EmptyTerminalLiteral(r.lhs.clone()).into());
                        }
                        rhs.extend(text.chars().map(Symbol::Terminal));
                    }
                    SurfaceSymbol::NonTerminal(name) => rhs.push(Symbol::NonTerminal(name)),
                    SurfaceSymbol::Any => rhs.push(Symbol::Any),
                }
            }
            productions.push(Production { lhs: r.lhs.clone(), rhs });
        }
    }

    Ok(Grammar::freeze(productions, start, Validator::new())?)
}

fn render_errors(src: &str, errs: &[Rich<'_, char>]) -> String {
    errs.iter()
        .map(|e| format!("{e} at {:?} in {:?}", e.span(), &src[e.span().into_range()]))
        .collect::<Vec<_>>()
        .join("; ")
}
