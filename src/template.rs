//! SQL template handling: placeholder location and literal substitution.
//!
//! The only statement format the crate owns is the placeholder syntax: a
//! colon followed by one or more word characters (`[A-Za-z0-9_]+`), names
//! case-sensitive and unique within a statement. Locating placeholders walks
//! the SQL with a small state machine so markers inside string literals,
//! quoted identifiers, and comments are left alone; nothing else about the
//! SQL is parsed or validated.

use crate::error::SqlConduitError;

#[derive(Clone)]
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backtick,
    LineComment,
    BlockComment(u32),
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn scan_word(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && is_word_byte(bytes[idx]) {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|word| (idx, word))
    }
}

/// True when the first keyword outside comments is `INSERT` or `REPLACE`.
///
/// Only a leading keyword is recognized; a `WITH`-prefixed insert reads as
/// `WITH` here, and rowid capture for it falls back to watching the driver
/// value move.
fn leading_keyword_inserts(sql: &str) -> bool {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            match after.find('\n') {
                Some(eol) => rest = &after[eol + 1..],
                None => return false,
            }
        } else if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(close) => rest = &after[close + 2..],
                None => return false,
            }
        } else {
            break;
        }
    }
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    rest[..end].eq_ignore_ascii_case("insert") || rest[..end].eq_ignore_ascii_case("replace")
}

/// Walk `sql` and call `visit(name, start, end)` for every placeholder in
/// statement order, where `start..end` spans `:name` in the input bytes.
fn walk_placeholders<E>(
    sql: &str,
    mut visit: impl FnMut(&str, usize, usize) -> Result<(), E>,
) -> Result<(), E> {
    let bytes = sql.as_bytes();
    let mut state = ScanState::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            ScanState::Normal => match b {
                b'\'' => state = ScanState::SingleQuoted,
                b'"' => state = ScanState::DoubleQuoted,
                b'`' => state = ScanState::Backtick,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => state = ScanState::LineComment,
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = ScanState::BlockComment(1);
                    idx += 1;
                }
                b':' => {
                    if bytes.get(idx + 1) == Some(&b':') {
                        // `::type` cast, not a placeholder
                        idx += 1;
                    } else if let Some((end, name)) = scan_word(bytes, idx + 1) {
                        visit(name, idx, end)?;
                        idx = end - 1;
                    }
                }
                _ => {}
            },
            ScanState::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::Backtick => {
                if b == b'`' {
                    state = ScanState::Normal;
                }
            }
            ScanState::LineComment => {
                if b == b'\n' {
                    state = ScanState::Normal;
                }
            }
            ScanState::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = ScanState::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        ScanState::Normal
                    } else {
                        ScanState::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }
    Ok(())
}

/// An immutable, trimmed SQL statement plus the ordered named placeholders
/// found in it.
///
/// Derived once at construction; the placeholder count is the invariant all
/// parameter validation checks against.
#[derive(Debug, Clone)]
pub struct SqlTemplate {
    sql: String,
    placeholders: Vec<String>,
    inserts: bool,
}

impl SqlTemplate {
    /// Parse a template, trimming surrounding whitespace and collecting its
    /// placeholders in statement order.
    ///
    /// # Errors
    ///
    /// Returns `SqlConduitError::Config` if the trimmed SQL is empty or a
    /// placeholder name repeats.
    pub fn parse(sql: &str) -> Result<Self, SqlConduitError> {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Err(SqlConduitError::Config("SQL template is empty".into()));
        }

        let mut placeholders: Vec<String> = Vec::new();
        walk_placeholders(trimmed, |name, _, _| {
            if placeholders.iter().any(|p| p == name) {
                return Err(SqlConduitError::Config(format!(
                    "duplicate placeholder :{name}; placeholder names must be unique within a statement"
                )));
            }
            placeholders.push(name.to_string());
            Ok(())
        })?;

        Ok(Self {
            sql: trimmed.to_string(),
            placeholders,
            inserts: leading_keyword_inserts(trimmed),
        })
    }

    /// The trimmed SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in statement order.
    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }

    /// Whether the statement's leading keyword is `INSERT` or `REPLACE`.
    pub(crate) fn inserts(&self) -> bool {
        self.inserts
    }

    /// Rewrite the template with every `:name` replaced by the string
    /// `replace` yields for it. Used by the literal-substitution batch
    /// strategy; the replacement must already be a valid SQL literal.
    pub(crate) fn substitute(
        &self,
        mut replace: impl FnMut(&str) -> Result<String, SqlConduitError>,
    ) -> Result<String, SqlConduitError> {
        let mut out = String::with_capacity(self.sql.len());
        let mut last = 0usize;
        walk_placeholders(&self.sql, |name, start, end| {
            out.push_str(&self.sql[last..start]);
            out.push_str(&replace(name)?);
            last = end;
            Ok(())
        })?;
        out.push_str(&self.sql[last..]);
        Ok(out)
    }
}
