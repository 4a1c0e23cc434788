//! CSV download payload.
//!
//! One column for the input and one per stage; row `i` holds line `i` of
//! each text.  Shorter columns are padded with empty cells.

use std::borrow::Cow;

use crate::pipeline::StageOutput;

/// Build the UTF-8 CSV offered for download.
pub fn build_csv(input_text: &str, outputs: &[StageOutput]) -> Vec<u8> {
    let mut header = vec!["input"];
    header.extend(outputs.iter().map(|s| s.name.as_str()));

    let mut columns: Vec<Vec<&str>> = vec![input_text.split('\n').collect()];
    columns.extend(outputs.iter().map(|s| s.text.split('\n').collect()));

    let n_rows = columns.iter().map(Vec::len).max().unwrap_or(0);

    let mut csv = String::new();
    push_row(&mut csv, header.iter().copied());
    for row in 0..n_rows {
        push_row(
            &mut csv,
            columns.iter().map(|col| col.get(row).copied().unwrap_or("")),
        );
    }

    csv.into_bytes()
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let fields: Vec<Cow<'a, str>> = fields.map(escape_field).collect();
    out.push_str(&fields.join(","));
    out.push('\n');
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
