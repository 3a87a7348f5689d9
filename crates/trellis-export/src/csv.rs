//! CSV encoding
//!
//! Comma-separated, `\n` row separator, RFC 4180 quoting: fields
//! containing a comma, quote, or newline are wrapped in double quotes
//! with embedded quotes doubled. Output starts with a UTF-8 byte-order
//! marker so spreadsheet software decodes multibyte headers correctly.

use serde_json::Value;

/// UTF-8 byte-order marker prefixed to every export
pub const CSV_BOM: &str = "\u{feff}";

/// Ordered column descriptor: record key plus header label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Encode rows into a CSV blob
///
/// Missing keys render as empty fields; numbers render without spurious
/// decimals.
pub fn to_csv(rows: &[Value], columns: &[Column]) -> String {
    let header = columns
        .iter()
        .map(|c| escape(&c.label))
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header);

    for row in rows {
        let line = columns
            .iter()
            .map(|c| escape(&field_text(row.get(&c.key))))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    format!("{}{}", CSV_BOM, lines.join("\n"))
}

/// Render a single field value as text
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        // Nested structures are not tabular; fall back to JSON text.
        Some(other) => other.to_string(),
    }
}

/// Quote a field if it contains a comma, quote, or newline
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
