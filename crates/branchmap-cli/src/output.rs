use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

/// Everything a command prints to stdout.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub command: &'static str,
    pub generated_at: String,
    pub warnings: Vec<String>,
    pub data: Value,
}

impl Envelope {
    pub fn new(command: &'static str, result: CommandResult) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            command,
            generated_at: now.format(&Rfc3339).unwrap_or_else(|_| now.to_string()),
            warnings: result.warnings,
            data: result.data,
        }
    }
}

pub fn render(envelope: &Envelope, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)),
    }

    Ok(())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::from("-"),
        other => other.to_string(),
    }
}

fn push_value(out: &mut String, indent: usize, key: &str, value: &Value) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) => {
            out.push_str(&format!("{pad}{key}:\n"));
            for (name, inner) in map {
                push_value(out, indent + 2, name, inner);
            }
        }
        Value::Array(items) if items.iter().any(|item| item.is_object() || item.is_array()) => {
            out.push_str(&format!("{pad}{key}:\n"));
            for (i, item) in items.iter().enumerate() {
                push_value(out, indent + 2, &format!("[{i}]"), item);
            }
        }
        Value::Array(items) => {
            let joined = items.iter().map(scalar).collect::<Vec<_>>().join(", ");
            out.push_str(&format!("{pad}{key}: {joined}\n"));
        }
        other => out.push_str(&format!("{pad}{key}: {}\n", scalar(other))),
    }
}

fn render_table(envelope: &Envelope) -> String {
    let mut out = format!(
        "command     : {}\ngenerated_at: {}\n",
        envelope.command, envelope.generated_at
    );

    if !envelope.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &envelope.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    push_value(&mut out, 0, "data", &envelope.data);
    out
}
