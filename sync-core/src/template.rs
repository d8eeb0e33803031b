//! SQL template inspection.
//!
//! The server ships parameterized INSERT/UPDATE templates with every pull
//! page. Rows arrive as open JSON objects, so the client recovers the
//! column order of each template and binds row values positionally.
//!
//! Every function here is best effort: an unrecognized template yields an
//! empty result, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

static INSERT_COLUMNS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\binto\s+[^(]+\(([^)]+)\)\s*values").unwrap());
static UPDATE_SET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bset\s+(.+?)\s+where\b").unwrap());
static ASSIGNMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\s=,]+)\s*=\s*\?").unwrap());
static UPDATE_WHERE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bwhere\s+([^\s=]+)\s*=\s*\?").unwrap());

/// Table-level clauses that can appear in a column list.
const TABLE_CONSTRAINTS: &[&str] = &["CONSTRAINT", "PRIMARY", "UNIQUE", "CHECK", "FOREIGN"];

/// Columns recovered from an UPDATE template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateColumns {
    /// Columns of the SET clause, in placeholder order
    pub set_columns: Vec<String>,
    /// The single key column of the WHERE clause
    pub where_column: Option<String>,
}

/// Strip `[]`, backtick and double-quote decoration from an identifier.
pub fn clean_identifier(value: &str) -> String {
    value
        .trim()
        .trim_start_matches(['[', '`', '"'])
        .trim_end_matches([']', '`', '"'])
        .to_string()
}

/// Ordered column list of `... INTO <table> (<cols>) VALUES ...`.
///
/// Returns an empty list if the template does not have that shape.
pub fn insert_columns(template: &str) -> Vec<String> {
    let Some(captures) = INSERT_COLUMNS_RE.captures(template) else {
        return Vec::new();
    };

    captures[1]
        .split(',')
        .map(clean_identifier)
        .filter(|c| !c.is_empty())
        .collect()
}

/// SET columns and WHERE key of `... SET a=?, b=? WHERE key=? ...`.
///
/// Only the first `key = ?` of the WHERE clause is recovered.
pub fn update_columns(template: &str) -> UpdateColumns {
    let set_columns = UPDATE_SET_RE
        .captures(template)
        .map(|captures| {
            ASSIGNMENT_RE
                .captures_iter(&captures[1])
                .map(|assignment| clean_identifier(&assignment[1]))
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let where_column = UPDATE_WHERE_RE
        .captures(template)
        .map(|captures| clean_identifier(&captures[1]))
        .filter(|c| !c.is_empty());

    UpdateColumns {
        set_columns,
        where_column,
    }
}

/// Column identifiers declared by a `CREATE TABLE` statement.
///
/// Type names, column constraints and table-level constraint clauses are
/// skipped. Used to discover the writable surface of a synced table.
pub fn schema_columns(create_sql: &str) -> Vec<String> {
    let Some(body) = column_list(create_sql) else {
        return Vec::new();
    };

    split_top_level(body)
        .into_iter()
        .filter_map(|definition| {
            let name = leading_identifier(definition.trim())?;
            let quoted = name.starts_with(['[', '`', '"']);
            if !quoted && TABLE_CONSTRAINTS.contains(&name.to_ascii_uppercase().as_str()) {
                return None;
            }
            let cleaned = clean_identifier(name);
            (!cleaned.is_empty()).then_some(cleaned)
        })
        .collect()
}

/// Text between the first `(` and its matching `)`.
fn column_list(sql: &str) -> Option<&str> {
    let open = sql.find('(')?;
    let mut depth = 0usize;
    for (offset, ch) in sql[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&sql[open + 1..open + offset]);
                }
            }
            _ => {}
        }
    }
    // Unbalanced: take everything after the opening paren
    Some(&sql[open + 1..])
}

/// Split on commas that are not nested inside parentheses or quotes.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in body.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '[' => quote = Some(']'),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    parts.push(&body[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&body[start..]);
    parts
}

/// First identifier of a column definition, quotes included.
fn leading_identifier(definition: &str) -> Option<&str> {
    let first = definition.chars().next()?;
    let closing = match first {
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    };

    match closing {
        Some(close) => {
            let end = definition[1..].find(close).map(|i| i + 2)?;
            Some(&definition[..end])
        }
        None => {
            let end = definition
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(definition.len());
            (end > 0).then(|| &definition[..end])
        }
    }
}
