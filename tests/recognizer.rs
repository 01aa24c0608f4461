//! End-to-end scenarios exercising the whole pipeline — recognize, build,
//! disambiguate, enumerate, annotate — against whole grammars rather than
//! unit-testing `Chart` in isolation.

use regex::Regex;
use std::collections::HashSet;

use thicket::grammar::{Direction, FollowKey, Grammar, Production, Symbol, Validator};
use thicket::{build_parser, GrammarError};

fn prod(lhs: &str, rhs: Vec<Symbol<char>>) -> Production<char> {
    Production { lhs: lhs.to_string(), rhs }
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

#[test]
fn right_recursive_grammar_yields_exactly_one_fully_nested_tree() {
    // S -> 'a' S | 'b'
    let prods = vec![
        prod("S", vec![Symbol::Terminal('a'), Symbol::NonTerminal("S".into())]),
        prod("S", vec![Symbol::Terminal('b')]),
    ];
    let grammar = Grammar::freeze(prods, "S", Validator::new()).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("aaaab");
    assert!(parser.recognize(&tokens));

    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 1);
    let tree = forest.trees().next().unwrap();
    assert_eq!(tree.to_string(), "(S a (S a (S a (S a (S b)))))");
}

#[test]
fn dense_ambiguity_without_rules_yields_the_catalan_number_of_trees() {
    // S -> S S | 'a' over "aaaa": C_3 = 5 distinct binary-tree shapes.
    let prods = vec![
        prod("S", vec![Symbol::NonTerminal("S".into()), Symbol::NonTerminal("S".into())]),
        prod("S", vec![Symbol::Terminal('a')]),
    ];
    let grammar = Grammar::freeze(prods, "S", Validator::new()).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("aaaa");
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 5);

    let trees: Vec<_> = forest.trees().collect();
    assert_eq!(trees.len(), 5);
    let unique: HashSet<_> = trees.into_iter().collect();
    assert_eq!(unique.len(), 5, "every enumerated tree must be distinct");
}

#[test]
fn left_associativity_collapses_dense_ambiguity_to_the_left_nested_tree() {
    let prods = vec![
        prod("S", vec![Symbol::NonTerminal("S".into()), Symbol::NonTerminal("S".into())]),
        prod("S", vec![Symbol::Terminal('a')]),
    ];
    let v = Validator::new().associativity(0, Direction::Left);
    let grammar = Grammar::freeze(prods, "S", v).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("aaaa");
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 1);
    let tree = forest.trees().next().unwrap();
    assert_eq!(tree.to_string(), "(S (S (S (S a) (S a)) (S a)) (S a))");
}

#[test]
fn right_associativity_collapses_dense_ambiguity_to_the_right_nested_tree() {
    let prods = vec![
        prod("S", vec![Symbol::NonTerminal("S".into()), Symbol::NonTerminal("S".into())]),
        prod("S", vec![Symbol::Terminal('a')]),
    ];
    let v = Validator::new().associativity(0, Direction::Right);
    let grammar = Grammar::freeze(prods, "S", v).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("aaaa");
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 1);
    let tree = forest.trees().next().unwrap();
    assert_eq!(tree.to_string(), "(S (S a) (S (S a) (S (S a) (S a))))");
}

#[test]
fn none_associativity_on_a_self_nesting_operator_yields_zero_trees() {
    // S -> S '+' S | 'a', None-assoc on S->S+S, over "a+a+a": every split
    // nests S->S+S on one side or the other (the other side is a bare
    // 'a'), so None rejects every top-level alternative and no tree
    // survives at all.
    let prods = vec![
        prod(
            "S",
            vec![
                Symbol::NonTerminal("S".into()),
                Symbol::Terminal('+'),
                Symbol::NonTerminal("S".into()),
            ],
        ),
        prod("S", vec![Symbol::Terminal('a')]),
    ];
    let v = Validator::new().associativity(0, Direction::None);
    let grammar = Grammar::freeze(prods, "S", v).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("a+a+a");
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 0);
}

#[test]
fn kleene_star_over_a_single_terminal_recognizes_every_length() {
    // A -> 'a' A | (epsilon)
    let prods = vec![
        prod("A", vec![Symbol::Terminal('a'), Symbol::NonTerminal("A".into())]),
        prod("A", vec![]),
    ];
    let grammar = Grammar::freeze(prods, "A", Validator::new()).unwrap();
    let parser = build_parser(grammar);

    for input in ["", "a", "aaaaa"] {
        let tokens = chars(input);
        assert!(parser.recognize(&tokens), "{input:?} should recognize");
        let forest = parser.parse(&tokens);
        assert_eq!(forest.count(), 1, "{input:?} should have exactly one tree");
    }
}

#[test]
fn wildcard_matches_any_single_token_and_survives_to_the_forest() {
    // S -> · 'b'
    let prods = vec![prod("S", vec![Symbol::Any, Symbol::Terminal('b')])];
    let grammar = Grammar::freeze(prods, "S", Validator::new()).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("xb");
    assert!(parser.recognize(&tokens));
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 1);
}

#[test]
fn calculator_precedence_and_associativity_yields_a_unique_tree() {
    // E -> E+E (0) | E-E (1) | E*E (2) | E/E (3) | E^E (4) | N (5)
    // N -> '1'..'5' (6..10)
    let e = |c: char| {
        prod(
            "E",
            vec![Symbol::NonTerminal("E".into()), Symbol::Terminal(c), Symbol::NonTerminal("E".into())],
        )
    };
    let prods = vec![
        e('+'),
        e('-'),
        e('*'),
        e('/'),
        e('^'),
        prod("E", vec![Symbol::NonTerminal("N".into())]),
        prod("N", vec![Symbol::Terminal('1')]),
        prod("N", vec![Symbol::Terminal('2')]),
        prod("N", vec![Symbol::Terminal('3')]),
        prod("N", vec![Symbol::Terminal('4')]),
        prod("N", vec![Symbol::Terminal('5')]),
    ];

    let v = Validator::new()
        .priority(4, 2)
        .priority(4, 3)
        .priority(2, 0)
        .priority(2, 1)
        .priority(3, 0)
        .priority(3, 1)
        .assoc_group(Direction::Left, [0, 1])
        .assoc_group(Direction::Left, [2, 3])
        .associativity(4, Direction::Right);

    let grammar = Grammar::freeze(prods, "E", v).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("1-2*3^4+5");
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 1, "expected a unique parse, got {}", forest.count());

    let tree = forest.trees().next().unwrap();
    assert_eq!(
        tree.to_string(),
        "(E (E (E (N 1)) - (E (E (N 2)) * (E (E (N 3)) ^ (E (N 4))))) + (E (N 5)))"
    );
}

#[test]
fn reject_rules_prune_matching_yields_but_spare_the_rest() {
    // ID -> CHAR ID | CHAR ; CHAR -> 'a' | 'b' | 'c'
    let prods = vec![
        prod("ID", vec![Symbol::NonTerminal("CHAR".into()), Symbol::NonTerminal("ID".into())]),
        prod("ID", vec![Symbol::NonTerminal("CHAR".into())]),
        prod("CHAR", vec![Symbol::Terminal('a')]),
        prod("CHAR", vec![Symbol::Terminal('b')]),
        prod("CHAR", vec![Symbol::Terminal('c')]),
    ];
    // "cc+" (two or more consecutive `c`s) rather than "c+" so a lone `c`
    // inside a longer identifier is never itself rejected.
    let v = Validator::new()
        .reject_literal("ID", "aaa")
        .reject_regex("ID", Regex::new("cc+").unwrap());
    let grammar = Grammar::freeze(prods, "ID", v).unwrap();
    let parser = build_parser(grammar);

    for rejected in ["aaa", "cc", "ccc"] {
        let tokens = chars(rejected);
        assert!(parser.recognize(&tokens));
        let forest = parser.parse(&tokens);
        assert_eq!(forest.count(), 0, "{rejected:?} should be rejected");
    }

    for spared in ["c", "abc"] {
        let tokens = chars(spared);
        let forest = parser.parse(&tokens);
        assert_eq!(forest.count(), 1, "{spared:?} should survive rejection");
    }
}

#[test]
fn follow_restriction_rejects_a_derivation_followed_by_a_forbidden_pattern() {
    // KEYWORD -> "if" ; KEYWORD may not be immediately followed by a letter
    // (so "if" matches but "ifx" does not use the KEYWORD production).
    let prods = vec![
        prod(
            "S",
            vec![Symbol::NonTerminal("KEYWORD".into()), Symbol::NonTerminal("TAIL".into())],
        ),
        prod("KEYWORD", vec![Symbol::Terminal('i'), Symbol::Terminal('f')]),
        prod("TAIL", vec![Symbol::Terminal('x')]),
        prod("TAIL", vec![]),
    ];
    let v = Validator::new().follow_restriction(
        FollowKey::NonTerminal("KEYWORD".into()),
        Regex::new("[^a-zA-Z]|$").unwrap(),
    );
    let grammar = Grammar::freeze(prods, "S", v).unwrap();
    let parser = build_parser(grammar);

    let forest = parser.parse(&chars("if"));
    assert_eq!(forest.count(), 1);

    let forest = parser.parse(&chars("ifx"));
    assert_eq!(forest.count(), 0);
}

#[test]
fn prefer_closes_the_dangling_else_with_the_nearest_if() {
    // Stmt -> "if" Stmt | "if" Stmt "else" Stmt | "x"
    // Classic dangling-else: "iixex" is ambiguous at the outer span between
    // treating it as a bare if-then whose body is itself a full
    // if-then-else (the `else` binds to the nearer, inner `if`), and
    // treating it as an if-then-else whose own body is a bare if-then (the
    // `else` binds to the farther, outer `if`). Preferring the bare
    // if-then production at that shared span forces the first reading.
    let if_then = prod("Stmt", vec![Symbol::Terminal('i'), Symbol::NonTerminal("Stmt".into())]);
    let if_then_else = prod(
        "Stmt",
        vec![
            Symbol::Terminal('i'),
            Symbol::NonTerminal("Stmt".into()),
            Symbol::Terminal('e'),
            Symbol::NonTerminal("Stmt".into()),
        ],
    );
    let atom = prod("Stmt", vec![Symbol::Terminal('x')]);
    let prods = vec![if_then, if_then_else, atom];

    let v = Validator::new().prefer("Stmt", [0]);
    let grammar = Grammar::freeze(prods, "Stmt", v).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("iixex");
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 1);
    let tree = forest.trees().next().unwrap();
    // The else binds to the inner if: i (i x e x), not (i x) e x.
    assert_eq!(tree.to_string(), "(Stmt i (Stmt i (Stmt x) e (Stmt x)))");
}

#[test]
fn disambiguation_is_idempotent() {
    use thicket::disambiguate::disambiguate;

    let prods = vec![
        prod("S", vec![Symbol::NonTerminal("S".into()), Symbol::NonTerminal("S".into())]),
        prod("S", vec![Symbol::Terminal('a')]),
    ];
    let v = Validator::new().associativity(0, Direction::Left);
    let grammar = Grammar::freeze(prods, "S", v).unwrap();
    let tokens = chars("aaaa");

    let chart = thicket::chart::Chart::recognize(&grammar, &tokens);
    let forest = thicket::forest::Forest::build(&chart, &tokens);
    let once = disambiguate(&forest, &tokens);
    let twice = disambiguate(&once, &tokens);

    assert_eq!(once.node_count(), twice.node_count());
    assert_eq!(
        thicket::enumerate::count(&once, once.roots()[0]),
        thicket::enumerate::count(&twice, twice.roots()[0])
    );
}

#[test]
fn count_matches_full_enumeration_length_across_several_grammars() {
    let cases: Vec<(Vec<Production<char>>, &str, &str)> = vec![
        (
            vec![
                prod("S", vec![Symbol::NonTerminal("S".into()), Symbol::NonTerminal("S".into())]),
                prod("S", vec![Symbol::Terminal('a')]),
            ],
            "S",
            "aaaa",
        ),
        (
            vec![prod("S", vec![Symbol::Terminal('a'), Symbol::Terminal('b')])],
            "S",
            "ab",
        ),
        (
            vec![
                prod("S", vec![Symbol::NonTerminal("A".into()), Symbol::NonTerminal("B".into())]),
                prod("A", vec![Symbol::NonTerminal("A".into()), Symbol::NonTerminal("A".into())]),
                prod("A", vec![Symbol::Terminal('a')]),
                prod("B", vec![Symbol::NonTerminal("B".into()), Symbol::NonTerminal("B".into())]),
                prod("B", vec![Symbol::Terminal('b')]),
            ],
            "S",
            "aaabbb",
        ),
    ];

    for (prods, start, input) in cases {
        let grammar = Grammar::freeze(prods, start, Validator::new()).unwrap();
        let parser = build_parser(grammar);
        let tokens = chars(input);
        let forest = parser.parse(&tokens);
        let counted = forest.count();
        let enumerated = forest.trees().count() as u128;
        assert_eq!(counted, enumerated, "mismatch for input {input:?}");
    }
}

#[test]
fn grammar_errors_are_reported_distinctly() {
    let no_start = Grammar::freeze(
        vec![prod("A", vec![Symbol::Terminal('a')])],
        "S",
        Validator::new(),
    )
    .unwrap_err();
    assert!(matches!(no_start, GrammarError::NoStartProduction(ref s) if s == "S"));

    let dangling = Grammar::freeze(
        vec![prod("S", vec![Symbol::NonTerminal("Missing".into())])],
        "S",
        Validator::new(),
    )
    .unwrap_err();
    assert!(matches!(dangling, GrammarError::DanglingNonTerminal(ref s) if s == "Missing"));
}

#[test]
fn try_parse_reports_furthest_progress_diagnostics_on_failure() {
    let prods = vec![prod("S", vec![Symbol::Terminal('a'), Symbol::Terminal('b'), Symbol::Terminal('c')])];
    let grammar = Grammar::freeze(prods, "S", Validator::new()).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("ax");
    let failure = parser.try_parse(&tokens).unwrap_err();
    assert_eq!(failure.pos, 1);
    assert!(failure.hints.iter().any(|h| h.lhs == "S"));
}

#[test]
fn unrecognized_input_yields_an_empty_forest_rather_than_an_error() {
    let prods = vec![prod("S", vec![Symbol::Terminal('a')])];
    let grammar = Grammar::freeze(prods, "S", Validator::new()).unwrap();
    let parser = build_parser(grammar);
    let tokens = chars("b");
    assert!(!parser.recognize(&tokens));
    let forest = parser.parse(&tokens);
    assert_eq!(forest.count(), 0);
    assert_eq!(forest.trees().count(), 0);
}
