//! Author name extraction
//!
//! Splits a BibTeX `author` value into individual names and gives each a
//! display form.

use crate::latex::decode_latex;

/// One author as written in the `author` field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonName {
    /// Full display name: a braced literal (`{NASA Collaboration}`) or a name
    /// written in `First Last` order
    pub full: Option<String>,
    pub last: Option<String>,
    pub first: Option<String>,
}

impl PersonName {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if is_wholly_braced(raw) {
            return Self {
                full: non_empty(decode_latex(raw)),
                ..Default::default()
            };
        }

        if let Some(comma) = top_level_comma(raw) {
            return Self {
                full: None,
                last: non_empty(decode_latex(&raw[..comma])),
                first: non_empty(decode_latex(&raw[comma + 1..])),
            };
        }

        let full = decode_latex(raw);
        let last = full.split_whitespace().last().map(str::to_string);
        Self {
            full: non_empty(full),
            last,
            first: None,
        }
    }

    /// Full name if known, else the last name, else an empty string
    pub fn display(&self) -> &str {
        self.full
            .as_deref()
            .or(self.last.as_deref())
            .unwrap_or("")
    }
}

/// Split an `author` value on `and` at brace depth 0.
pub fn split_authors(field: &str) -> Vec<PersonName> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut words = field.split_whitespace().peekable();

    while let Some(word) = words.next() {
        if depth == 0 && word.eq_ignore_ascii_case("and") {
            push_name(&mut names, &current);
            current.clear();
            continue;
        }
        for c in word.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        current.push_str(word);
        if words.peek().is_some() {
            current.push(' ');
        }
    }
    push_name(&mut names, &current);

    names
}

fn push_name(names: &mut Vec<PersonName>, raw: &str) {
    if !raw.trim().is_empty() {
        names.push(PersonName::parse(raw));
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn is_wholly_braced(raw: &str) -> bool {
    if !raw.starts_with('{') || !raw.ends_with('}') {
        return false;
    }
    let mut depth = 0usize;
    for (pos, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return pos == raw.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn top_level_comma(raw: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(pos),
            _ => {}
        }
    }
    None
}
