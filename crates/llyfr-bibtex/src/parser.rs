//! BibTeX tokenizer implementation using nom
//!
//! This tokenizer handles the subset of BibTeX found in hand-maintained
//! bibliographies:
//! - @comment, @preamble and @string blocks (skipped)
//! - `%` line comments and free text between records
//! - Braced and quoted field values, nested braces
//! - Concatenation of value parts with #
//!
//! A record that opens but cannot be tokenized fails the whole parse. Partial
//! results are never returned.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    IResult,
};

use crate::entry::BibTeXEntry;

/// Error type for tokenizer failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unbalanced braces in record starting at line {line}")]
    UnbalancedBraces { line: u32 },
    #[error("Invalid syntax in record starting at line {line}: {message}")]
    InvalidSyntax { line: u32, message: String },
    #[error("No valid BibTeX entries found")]
    NoEntries,
}

/// Tokenize a whole bibliography into its records, in source order.
pub fn parse(input: &str) -> Result<Vec<BibTeXEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut remaining = input;

    loop {
        remaining = skip_whitespace_and_comments(remaining);
        if remaining.is_empty() {
            break;
        }

        if !remaining.starts_with('@') {
            // Free text: advance to the next `@` or the next line
            let next = remaining
                .find(|c| c == '@' || c == '\n')
                .unwrap_or(remaining.len());
            remaining = &remaining[next..];
            continue;
        }

        if !opens_block(remaining) {
            // A stray `@`, e.g. an address in a note
            remaining = &remaining[1..];
            continue;
        }

        let line = line_number(input, remaining);
        match parse_at_block(remaining) {
            Ok((rest, block)) => {
                if let AtBlock::Entry(mut entry) = block {
                    entry.raw_bibtex = remaining[..remaining.len() - rest.len()].to_string();
                    entry.line = line;
                    entries.push(entry);
                }
                remaining = rest;
            }
            Err(_) => return Err(classify_failure(remaining, line)),
        }
    }

    Ok(entries)
}

/// Tokenize `input` and return its first record.
pub fn parse_first_record(input: &str) -> Result<BibTeXEntry, ParseError> {
    parse(input)?
        .into_iter()
        .next()
        .ok_or(ParseError::NoEntries)
}

/// Result of parsing an @ block
enum AtBlock {
    Entry(BibTeXEntry),
    Skipped,
}

fn skip_whitespace_and_comments(input: &str) -> &str {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.starts_with('%') {
            rest = match trimmed.find('\n') {
                Some(pos) => &trimmed[pos + 1..],
                None => "",
            };
        } else {
            return trimmed;
        }
    }
}

fn line_number(input: &str, remaining: &str) -> u32 {
    let offset = input.len() - remaining.len();
    input[..offset].matches('\n').count() as u32 + 1
}

fn is_type_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_field_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-:.+".contains(c)
}

fn is_bare_value_char(c: char) -> bool {
    c.is_alphanumeric() || "_-.:/+".contains(c)
}

/// Whether `input` (starting at `@`) is `@type{` or `@type(`
fn opens_block(input: &str) -> bool {
    let rest = input[1..].trim_start();
    let type_len = rest.find(|c: char| !is_type_char(c)).unwrap_or(rest.len());
    type_len > 0
        && rest[type_len..]
            .trim_start()
            .starts_with(|c: char| c == '{' || c == '(')
}

fn classify_failure(block: &str, line: u32) -> ParseError {
    let Some(open) = block.find(|c: char| c == '{' || c == '(') else {
        return ParseError::InvalidSyntax {
            line,
            message: "missing opening delimiter".to_string(),
        };
    };
    let body = &block[open..];
    let close = if body.starts_with('{') { '}' } else { ')' };
    match balanced_end(body, close) {
        None => ParseError::UnbalancedBraces { line },
        Some(_) => ParseError::InvalidSyntax {
            line,
            message: "could not tokenize record fields".to_string(),
        },
    }
}

fn syntax_error(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
}

/// Byte offset just past the delimiter closing the one `input` starts with
fn balanced_end(input: &str, close: char) -> Option<usize> {
    let open = input.chars().next()?;
    let mut depth = 0usize;
    let mut escaped = false;

    for (pos, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(pos + c.len_utf8());
            }
        }
    }

    None
}

/// Parse an @ block (entry, string, preamble, or comment)
fn parse_at_block(input: &str) -> IResult<&str, AtBlock> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, entry_type) = take_while1(is_type_char)(rest)?;
    let (rest, _) = multispace0(rest)?;

    match entry_type.to_ascii_lowercase().as_str() {
        "comment" | "string" | "preamble" => {
            map(alt((braced_block, parenthesised_block)), |_| AtBlock::Skipped)(rest)
        }
        _ => {
            let (rest, entry) = parse_entry_body(rest, entry_type)?;
            Ok((rest, AtBlock::Entry(entry)))
        }
    }
}

/// Parse `{key, field = value, ...}` (or the parenthesised form)
fn parse_entry_body<'a>(input: &'a str, entry_type: &str) -> IResult<&'a str, BibTeXEntry> {
    let (rest, open) = alt((char('{'), char('(')))(input)?;
    let close = if open == '{' { '}' } else { ')' };
    let (rest, _) = multispace0(rest)?;

    let (rest, cite_key) =
        take_while(|c: char| !c.is_whitespace() && c != ',' && c != close)(rest)?;
    let (rest, _) = multispace0(rest)?;
    let rest = rest.strip_prefix(',').unwrap_or(rest);

    let (rest, fields) = parse_fields(rest, close)?;

    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(close)(rest)?;

    let mut entry = BibTeXEntry::new(cite_key, entry_type);
    for (key, value) in fields {
        entry.add_field(key, value);
    }

    Ok((rest, entry))
}

fn parse_fields(input: &str, close: char) -> IResult<&str, Vec<(String, String)>> {
    let mut fields = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        if rest.is_empty() || rest.starts_with(close) {
            return Ok((rest, fields));
        }

        let (rest, field) = parse_single_field(rest)?;
        fields.push(field);

        // Separating commas; repeated or trailing ones are tolerated
        remaining = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }
}

/// Parse a single field (key = value)
fn parse_single_field(input: &str) -> IResult<&str, (String, String)> {
    let (rest, key) = take_while1(is_field_key_char)(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, value) = parse_field_value(rest)?;

    Ok((rest, (key.to_string(), value)))
}

/// Parse a field value: braced, quoted or bare parts joined by `#`
fn parse_field_value(input: &str) -> IResult<&str, String> {
    let mut value = String::new();
    let mut remaining = input;

    loop {
        let (rest, part) = alt((
            map(braced_block, |block: &str| block[1..block.len() - 1].to_string()),
            parse_quoted_value,
            map(take_while1(is_bare_value_char), str::to_string),
        ))(remaining)?;
        value.push_str(&part);

        let (rest, _) = multispace0(rest)?;
        match rest.strip_prefix('#') {
            Some(next) => {
                let (next, _) = multispace0(next)?;
                remaining = next;
            }
            None => return Ok((rest, value)),
        }
    }
}

/// A `{...}` block including its delimiters
fn braced_block(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(syntax_error(input));
    }
    match balanced_end(input, '}') {
        Some(end) => Ok((&input[end..], &input[..end])),
        None => Err(syntax_error(input)),
    }
}

fn parenthesised_block(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('(') {
        return Err(syntax_error(input));
    }
    match balanced_end(input, ')') {
        Some(end) => Ok((&input[end..], &input[..end])),
        None => Err(syntax_error(input)),
    }
}

/// Parse a quoted value "content"; quotes inside braces do not terminate it
fn parse_quoted_value(input: &str) -> IResult<&str, String> {
    let Some(body) = input.strip_prefix('"') else {
        return Err(syntax_error(input));
    };

    let mut depth = 0usize;
    let mut escaped = false;
    for (pos, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '"' if depth == 0 => return Ok((&body[pos + 1..], body[..pos].to_string())),
            _ => {}
        }
    }

    Err(syntax_error(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_entry() {
        let input = r#"
@article{Smith2024,
    author = {John Smith},
    title = {A Great Paper},
    year = {2024},
    journal = {Nature},
}
"#;
        let entries = parse(input).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.cite_key, "Smith2024");
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.author(), Some("John Smith"));
        assert_eq!(entry.title(), Some("A Great Paper"));
        assert_eq!(entry.year(), Some("2024"));
        assert_eq!(entry.line, 2);
    }

    #[test]
    fn test_raw_text_is_exact_source_slice() {
        let record = "@Article{x, title={Weak Turbulence},\n  year = 2020 }";
        let input = format!("% header\n\n{record}\n\ntrailing notes\n");
        let entries = parse(&input).unwrap();
        assert_eq!(entries[0].raw_bibtex, record);
    }

    #[test]
    fn test_parse_quoted_values() {
        let input = r#"@article{Test2024, author = "Jane Doe", title = "Testing \"Quotes\" {and "braces"}"}"#;
        let entries = parse(input).unwrap();
        assert_eq!(entries[0].author(), Some("Jane Doe"));
        assert_eq!(
            entries[0].title(),
            Some(r#"Testing \"Quotes\" {and "braces"}"#)
        );
    }

    #[test]
    fn test_parse_quoted_multibyte() {
        let entries = parse(r#"@misc{k, title = "Über Ångström"}"#).unwrap();
        assert_eq!(entries[0].title(), Some("Über Ångström"));
    }

    #[test]
    fn test_parse_nested_braces() {
        let input = "@article{Test2024, title = {A {B}ook about {LaTeX}},}";
        let entries = parse(input).unwrap();
        assert_eq!(entries[0].title(), Some("A {B}ook about {LaTeX}"));
    }

    #[test]
    fn test_skips_string_preamble_and_comment_blocks() {
        let input = r#"
@string{nature = "Nature"}
@preamble{"\newcommand{\noop}[1]{}"}
@comment{ignored @article{not, a = {record}} }
@article{Test2024, journal = nature}
"#;
        let entries = parse(input).unwrap();
        assert_eq!(entries.len(), 1);
        // String macros are not expanded
        assert_eq!(entries[0].journal(), Some("nature"));
    }

    #[test]
    fn test_concatenation() {
        let entries = parse(r#"@misc{k, note = "Part one, " # {part two}}"#).unwrap();
        assert_eq!(entries[0].get_field("note"), Some("Part one, part two"));
    }

    #[test]
    fn test_parenthesised_record() {
        let entries = parse("@book(Knuth, title = {TAOCP}, year = 1968)").unwrap();
        assert_eq!(entries[0].cite_key, "Knuth");
        assert_eq!(entries[0].year(), Some("1968"));
    }

    #[test]
    fn test_record_without_fields() {
        let entries = parse("@misc{lonely}").unwrap();
        assert_eq!(entries[0].cite_key, "lonely");
        assert!(entries[0].fields.is_empty());
    }

    #[test]
    fn test_stray_at_sign_in_free_text() {
        let input = "Mail me@example.org for corrections.\n@misc{k, title = {T}}";
        let entries = parse(input).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_percent_comment_hides_record() {
        let input = "% @article{broken, title = {\n@misc{k, title = {T}}";
        assert_eq!(parse(input).unwrap().len(), 1);
    }

    #[test]
    fn test_unbalanced_braces_fail_whole_file() {
        let input = "@misc{ok, title = {Fine}}\n\n@article{bad, title = {Open\n";
        assert_eq!(
            parse(input),
            Err(ParseError::UnbalancedBraces { line: 3 })
        );
    }

    #[test]
    fn test_invalid_field_syntax() {
        let input = "@article{bad, title {missing equals}}";
        assert!(matches!(
            parse(input),
            Err(ParseError::InvalidSyntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_first_record() {
        let entry = parse_first_record("@a{one}\n@b{two}").unwrap();
        assert_eq!(entry.cite_key, "one");
        assert_eq!(parse_first_record("no records here"), Err(ParseError::NoEntries));
    }
}
