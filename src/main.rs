//! A minimal demo binary: read a surface-text grammar (see
//! [`thicket::surface`]) from a file, then recognize/parse one line of input
//! per line of stdin against it, printing whether each line parses and how
//! many distinct trees survived. Not part of the core contract — a
//! convenience for poking at a grammar interactively.

use std::env;
use std::fs;
use std::io::{self, BufRead};

use colored::*;
use thicket::surface;
use thicket::{build_parser, tokenizer};

const DEMO_GRAMMAR: &str = r#"
Sum -> Sum '+' Product ;
Sum -> Product ;
Product -> Product '*' Digit ;
Product -> Digit ;
Digit -> '0' ; Digit -> '1' ; Digit -> '2' ; Digit -> '3' ; Digit -> '4' ;
Digit -> '5' ; Digit -> '6' ; Digit -> '7' ; Digit -> '8' ; Digit -> '9' ;
"#;

fn main() {
    let grammar_text = match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|e| {
            eprintln!("could not read {path}: {e}");
            std::process::exit(1);
        }),
        None => {
            println!("{}", "no grammar file given, using the built-in demo grammar:".dimmed());
            println!("{}", DEMO_GRAMMAR.trim());
            DEMO_GRAMMAR.to_string()
        }
    };

    let grammar = match surface::parse_grammar(&grammar_text) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{} {e}", "grammar error:".red().bold());
            std::process::exit(1);
        }
    };

    println!("start symbol: {}", grammar.start().cyan().bold());
    let parser = build_parser(grammar);

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        // the demo grammar is single-character terminals; fold any grapheme
        // cluster or folded int/float/string token back to its first `char`
        // so it still lines up against single-char productions.
        let tokens: Vec<char> = tokenizer::tokenize(&line)
            .into_iter()
            .map(|s| match s.token {
                tokenizer::CharToken::Char(s)
                | tokenizer::CharToken::Int(s)
                | tokenizer::CharToken::Float(s)
                | tokenizer::CharToken::Str(s) => s.chars().next().unwrap_or('\0'),
            })
            .collect();

        match parser.try_parse(&tokens) {
            Ok(forest) => {
                let count = forest.count();
                println!(
                    "{} {} — {} tree(s)",
                    "accepted:".green().bold(),
                    line,
                    count
                );
                if let Some(tree) = forest.trees().next() {
                    println!("  {tree}");
                }
            }
            Err(failure) => {
                println!("{} {} — {failure}", "rejected:".red().bold(), line);
            }
        }
    }
}
