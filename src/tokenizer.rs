//! The ambient token type used by the demo binary and most tests: a thin,
//! allocation-free lexer over `&str` that recognizes characters, integers,
//! floats and quoted strings. The core engine in [`crate::chart`] never
//! requires this type — it is generic over any `T: Eq + Hash + Clone`.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

/// A lexical token over borrowed input text. `Char` holds a single Unicode
/// *grapheme cluster* rather than a `char`, so a combining-mark sequence
/// (e.g. `"e\u{301}"`) tokenizes as one user-perceived character instead of
/// splitting into a base letter and a separately-dotted mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharToken<'inp> {
    Char(&'inp str),
    Int(&'inp str),
    Float(&'inp str),
    Str(&'inp str),
}

impl<'inp> fmt::Display for CharToken<'inp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharToken::Char(s) | CharToken::Int(s) | CharToken::Float(s) | CharToken::Str(s) => {
                write!(f, "{s}")
            }
        }
    }
}

/// A token plus the byte span in the source text it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned<'inp> {
    pub token: CharToken<'inp>,
    pub start: usize,
    pub end: usize,
}

/// Tokenize `input` into characters, with runs of ASCII digits (optionally
/// with one `.`) folded into a single `Int`/`Float` token and `"..."`
/// delimited runs folded into a single `Str` token.
pub fn tokenize(input: &str) -> Vec<Spanned<'_>> {
    let mut out = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c == '"' {
            chars.next();
            let mut end = start + 1;
            while let Some(&(i, ch)) = chars.peek() {
                chars.next();
                end = i + ch.len_utf8();
                if ch == '"' {
                    break;
                }
            }
            out.push(Spanned {
                token: CharToken::Str(&input[start..end]),
                start,
                end,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = start;
            let mut saw_dot = false;
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_ascii_digit() {
                    chars.next();
                    end = i + ch.len_utf8();
                } else if ch == '.' && !saw_dot {
                    saw_dot = true;
                    chars.next();
                    end = i + ch.len_utf8();
                } else {
                    break;
                }
            }
            let text = &input[start..end];
            let token = if saw_dot {
                CharToken::Float(text)
            } else {
                CharToken::Int(text)
            };
            out.push(Spanned { token, start, end });
            continue;
        }

        let grapheme = input[start..].graphemes(true).next().unwrap_or(&input[start..start]);
        let end = start + grapheme.len();
        while let Some(&(i, _)) = chars.peek() {
            if i >= end {
                break;
            }
            chars.next();
        }
        out.push(Spanned {
            token: CharToken::Char(grapheme),
            start,
            end,
        });
    }

    out
}
