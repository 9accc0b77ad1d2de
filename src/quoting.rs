//! SQL literal rendering for driver values.
//!
//! Used by the literal-substitution batch strategy and the session's
//! `quote_value` helper. Escaping follows SQLite rules: single quotes double
//! inside text literals, blobs render as `X'..'` hex literals.

use std::fmt::Write;

use rusqlite::types::Value;

/// Render a driver value as a standalone SQL literal.
pub(crate) fn quote_driver_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => {
            if f.is_finite() {
                f.to_string()
            } else {
                // SQLite has no literal form for NaN/Inf; they store as NULL.
                "NULL".to_string()
            }
        }
        Value::Text(s) => quote_text(s),
        Value::Blob(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for b in bytes {
                let _ = write!(out, "{b:02X}");
            }
            out.push('\'');
            out
        }
    }
}

fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}
