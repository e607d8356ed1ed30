use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "success": true, "message": message });
            if let (Some(Value::Object(extra)), Some(obj)) = (data, response.as_object_mut()) {
                obj.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print an API payload: pretty JSON, or a table/record in text mode
pub fn output_data(output_format: &OutputFormat, data: &Value, columns: &[&str]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => match data {
            Value::Array(rows) if rows.is_empty() => println!("No results"),
            Value::Array(rows) => print_table(rows, columns),
            Value::Object(_) => print_record(data),
            other => println!("{}", other),
        },
    }
    Ok(())
}

fn print_table(rows: &[Value], columns: &[&str]) {
    let widths: Vec<usize> = columns
        .iter()
        .map(|col| {
            rows.iter()
                .map(|row| cell(row, col).chars().count())
                .chain(std::iter::once(col.len()))
                .max()
                .unwrap_or(col.len())
                .min(40)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("{:<w$}", col.to_uppercase(), w = w))
        .collect();
    println!("{}", header.join("  "));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$}", truncate(&cell(row, col), *w), w = w))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn print_record(record: &Value) {
    if let Some(obj) = record.as_object() {
        let width = obj.keys().map(|k| k.len()).max().unwrap_or(0);
        for (key, value) in obj {
            println!("{:<width$}  {}", key, display(value), width = width);
        }
    }
}

fn cell(row: &Value, column: &str) -> String {
    row.get(column).map(display).unwrap_or_default()
}

/// Plain text for a JSON value: strings unquoted, arrays comma-joined
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        Value::Object(obj) => obj
            .get("nome")
            .map(display)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_flattens_values() {
        assert_eq!(display(&json!("pje")), "pje");
        assert_eq!(display(&json!(null)), "");
        assert_eq!(display(&json!(["ia", "lgpd"])), "ia, lgpd");
        assert_eq!(display(&json!([{ "nome": "Comissão A" }, { "nome": "Comissão B" }])), "Comissão A, Comissão B");
        assert_eq!(display(&json!(0.5)), "0.5");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("comissão", 10), "comissão");
        assert_eq!(truncate("comissão de direito", 8), "comissã…");
    }
}
