use serde_json::{Map, Value};

use crate::cli::OutputFormat;

pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    emit(output_format, true, message, data)
}

/// Reports a failure; the caller still decides the exit status
pub fn output_error(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    emit(output_format, false, message, data)
}

fn emit(output_format: OutputFormat, success: bool, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut body = Map::new();
            body.insert("success".to_string(), Value::Bool(success));
            let key = if success { "message" } else { "error" };
            body.insert(key.to_string(), Value::String(message.to_string()));
            // Object payloads are flattened into the top level
            match data {
                Some(Value::Object(extra)) => body.extend(extra),
                Some(other) => {
                    body.insert("data".to_string(), other);
                }
                None => {}
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(body))?);
        }
        OutputFormat::Text if success => println!("✓ {}", message),
        OutputFormat::Text => eprintln!("✗ {}", message),
    }
    Ok(())
}
