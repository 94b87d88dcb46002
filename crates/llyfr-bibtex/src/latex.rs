//! LaTeX character decoding
//!
//! Decodes the accent commands and special symbols that appear in BibTeX
//! titles and names to Unicode, then drops what is left of the markup
//! (unknown control words, case-protecting braces, math shifts).

use std::collections::HashMap;

use lazy_static::lazy_static;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Accent commands written with a symbol, e.g. `\"o`
    static ref SYMBOL_ACCENTS: HashMap<char, char> = HashMap::from([
        ('"', '\u{308}'),
        ('\'', '\u{301}'),
        ('`', '\u{300}'),
        ('^', '\u{302}'),
        ('~', '\u{303}'),
        ('=', '\u{304}'),
        ('.', '\u{307}'),
    ]);

    /// Accent commands written with a letter, e.g. `\c{c}`
    static ref LETTER_ACCENTS: HashMap<&'static str, char> = HashMap::from([
        ("c", '\u{327}'),
        ("v", '\u{30C}'),
        ("u", '\u{306}'),
        ("H", '\u{30B}'),
        ("k", '\u{328}'),
        ("r", '\u{30A}'),
        ("d", '\u{323}'),
        ("b", '\u{331}'),
    ]);

    static ref SYMBOLS: HashMap<&'static str, &'static str> = HashMap::from([
        ("ss", "ß"),
        ("o", "ø"),
        ("O", "Ø"),
        ("ae", "æ"),
        ("AE", "Æ"),
        ("oe", "œ"),
        ("OE", "Œ"),
        ("aa", "å"),
        ("AA", "Å"),
        ("l", "ł"),
        ("L", "Ł"),
        ("i", "ı"),
        ("j", "ȷ"),
    ]);
}

/// Decode LaTeX markup in a field value to plain Unicode text.
///
/// Whitespace runs (including line breaks inside a field) collapse to a
/// single space and the result is trimmed.
pub fn decode_latex(input: &str) -> String {
    let decoded = decode_chars(&input.chars().collect::<Vec<_>>());
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_chars(chars: &[char]) -> String {
    let mut out = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        pos += 1;
        match c {
            '\\' => pos = decode_command(chars, pos, &mut out),
            '{' | '}' | '$' => {}
            '~' => out.push(' '),
            _ => out.push(c),
        }
    }

    out
}

/// Decode the command whose name starts at `pos`; returns the position after it
fn decode_command(chars: &[char], pos: usize, out: &mut String) -> usize {
    let Some(&c) = chars.get(pos) else {
        return pos;
    };

    if let Some(&mark) = SYMBOL_ACCENTS.get(&c) {
        let (base, next) = accent_argument(chars, pos + 1);
        push_accented(out, &base, mark);
        return next;
    }

    if !c.is_ascii_alphabetic() {
        // Escaped character such as \& or \%
        out.push(c);
        return pos + 1;
    }

    let end = chars[pos..]
        .iter()
        .position(|ch| !ch.is_ascii_alphabetic())
        .map_or(chars.len(), |len| pos + len);
    let word: String = chars[pos..end].iter().collect();

    if let Some(&mark) = LETTER_ACCENTS.get(word.as_str()) {
        let (base, next) = accent_argument(chars, end);
        push_accented(out, &base, mark);
        return next;
    }

    if let Some(symbol) = SYMBOLS.get(word.as_str()) {
        out.push_str(symbol);
    }
    // Other control words (\emph, \textit, journal macros) are dropped
    end
}

/// Read the argument of an accent command: `{x}`, `{\i}` or a bare `x`
fn accent_argument(chars: &[char], pos: usize) -> (String, usize) {
    let mut pos = pos;
    while chars.get(pos).is_some_and(|c| *c == ' ') {
        pos += 1;
    }

    match chars.get(pos) {
        Some('{') => {
            let mut depth = 0usize;
            let mut end = pos;
            while end < chars.len() {
                match chars[end] {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                end += 1;
            }
            let inner = decode_chars(&chars[pos + 1..end.min(chars.len())]);
            (inner, (end + 1).min(chars.len()))
        }
        Some('\\') => {
            let mut inner = String::new();
            let next = decode_command(chars, pos + 1, &mut inner);
            (inner, next)
        }
        Some(&c) => (c.to_string(), pos + 1),
        None => (String::new(), pos),
    }
}

fn push_accented(out: &mut String, base: &str, mark: char) {
    let mut chars = base.chars();
    let Some(first) = chars.next() else {
        return;
    };
    // Accents go on a dotted i
    let first = match first {
        'ı' => 'i',
        'ȷ' => 'j',
        other => other,
    };
    out.extend([first, mark].iter().collect::<String>().nfc());
    out.extend(chars);
}
