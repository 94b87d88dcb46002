//! `file` field injection
//!
//! Edits the source text of a single record so that it references an attached
//! document, leaving every other byte of the record alone. The result is a
//! fixed point: injecting the same filename again changes nothing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A `file =` assignment at the start of a field, up to its value
    static ref FILE_ASSIGNMENT: Regex = Regex::new(r"(?i)^\s*(file)[ \t]*=[ \t]*").unwrap();
}

const FILE_FIELD_INDENT: &str = "         ";

/// The canonical `file` field line for `filename`, without a trailing comma
pub fn file_field_line(filename: &str) -> String {
    format!("{FILE_FIELD_INDENT}{}", file_field(filename))
}

fn file_field(filename: &str) -> String {
    format!("file = {{:{filename}:PDF}}")
}

/// A `file` assignment found at a field boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Assignment {
    /// Start of the `file` keyword
    keyword: usize,
    /// Start of the value
    value: usize,
}

/// Insert or replace the `file` field of a record.
///
/// Existing assignments are rewritten in place, keeping a trailing comma
/// whenever the record continues after the field. One that sits on its own
/// line becomes the canonical line; one that shares a line with other fields
/// is rewritten where it stands. Without one, a new field is added before the
/// record's last closing brace. Text with no closing brace at all gets the
/// field appended on a new line.
pub fn inject_file_field(record: &str, filename: &str) -> String {
    let assignments = file_assignments(record);
    if assignments.is_empty() {
        insert_file_field(record, filename)
    } else {
        replace_file_fields(record, &assignments, filename)
    }
}

/// Byte offsets where a field may start: just inside a record's opening
/// delimiter, and after every comma or newline at field level, plus the
/// start of the text
fn field_starts(record: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let mut depth = 0usize;
    let mut closer = '}';
    let mut quoted = false;

    for (pos, c) in record.char_indices() {
        match c {
            '{' | '(' if depth == 0 => {
                depth = 1;
                closer = if c == '{' { '}' } else { ')' };
                starts.push(pos + 1);
            }
            '\n' if depth == 0 => starts.push(pos + 1),
            _ if depth == 0 => {}
            '{' => depth += 1,
            '}' => depth -= 1,
            ')' if depth == 1 && closer == ')' && !quoted => depth = 0,
            '"' if depth == 1 => quoted = !quoted,
            ',' if depth == 1 && !quoted => starts.push(pos + 1),
            '\n' if depth == 1 && !quoted => starts.push(pos + 1),
            _ => {}
        }
        if depth == 0 {
            quoted = false;
        }
    }

    starts
}

fn file_assignments(record: &str) -> Vec<Assignment> {
    let mut assignments: Vec<Assignment> = field_starts(record)
        .into_iter()
        .filter_map(|start| {
            let caps = FILE_ASSIGNMENT.captures(&record[start..])?;
            Some(Assignment {
                keyword: start + caps.get(1)?.start(),
                value: start + caps.get(0)?.end(),
            })
        })
        .collect();
    // `,` followed by a newline yields two starts for one field
    assignments.dedup();
    assignments
}

fn insert_file_field(record: &str, filename: &str) -> String {
    let line = file_field_line(filename);
    let trimmed = record.trim_end();

    let Some(last_brace) = trimmed.rfind('}') else {
        return format!("{trimmed}\n{line}\n");
    };

    let mut head = trimmed[..last_brace].trim_end().to_string();
    if !head.ends_with(',') {
        head.push(',');
    }
    format!("{head}\n{line}\n{}", &trimmed[last_brace..])
}

fn replace_file_fields(record: &str, assignments: &[Assignment], filename: &str) -> String {
    let line = file_field_line(filename);
    let inline = file_field(filename);
    let mut out = String::with_capacity(record.len() + line.len());
    let mut copied_to = 0;

    for assignment in assignments {
        if assignment.keyword < copied_to {
            // Inside the value of an assignment already replaced
            continue;
        }

        let mut end = value_end(record, assignment.value);
        end += leading_blanks(&record[end..]);
        let had_comma = record[end..].starts_with(',');
        if had_comma {
            end += 1;
        }
        let continues = !closes_record(&record[end..]);

        match own_line_start(record, assignment.keyword) {
            Some(line_start) if line_start >= copied_to => {
                out.push_str(&record[copied_to..line_start]);
                out.push_str(&line);
            }
            _ => {
                out.push_str(&record[copied_to..assignment.keyword]);
                out.push_str(&inline);
            }
        }
        if had_comma || continues {
            out.push(',');
        }
        copied_to = end;
    }

    out.push_str(&record[copied_to..]);
    out
}

/// Start of the line holding `pos`, if only blanks precede `pos` on it
fn own_line_start(text: &str, pos: usize) -> Option<usize> {
    let line_start = text[..pos].rfind('\n')? + 1;
    text[line_start..pos]
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(line_start)
}

/// Byte length of leading spaces and tabs
fn leading_blanks(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}

/// Whether only the record's closing delimiter (or nothing) follows
fn closes_record(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with('}') || rest.starts_with(')')
}

/// Byte offset just past the value that starts at or after `start`
fn value_end(text: &str, start: usize) -> usize {
    let rest = &text[start..];
    let trimmed = rest.trim_start();
    let offset = rest.len() - trimmed.len();

    let len = match trimmed.chars().next() {
        Some('{') => delimited_len(trimmed, '}'),
        Some('(') => delimited_len(trimmed, ')'),
        Some('"') => quoted_len(trimmed),
        // A bare value never continues on the next line
        _ => {
            return start
                + rest
                    .find(|c: char| c == ',' || c == '\n' || c == '}')
                    .unwrap_or(rest.len());
        }
    };

    start + offset + len
}

/// Length of a balanced `{...}` or `(...)` value; an unterminated one runs
/// to the end of its first line
fn delimited_len(value: &str, close: char) -> usize {
    let mut chars = value.char_indices();
    let Some((_, open)) = chars.next() else {
        return 0;
    };

    let mut depth = 1usize;
    for (pos, c) in chars {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return pos + c.len_utf8();
            }
        }
    }

    line_len(value)
}

fn quoted_len(value: &str) -> usize {
    let mut escaped = false;
    for (pos, c) in value.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return pos + 1;
        }
    }

    line_len(value)
}

fn line_len(value: &str) -> usize {
    value.find('\n').unwrap_or(value.len())
}
