//! Output Formatting
//!
//! Utilities for formatting CLI output in various formats.

use crate::commands::OutputFormat;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use vortex_api::HealthResponse;
use vortex_core::TOLA;
use vortex_engine::MaintenanceReport;

/// Format and print data based on output format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table | OutputFormat::Plain => print_json(data),
    }
}

/// Print as JSON
pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

/// Print the `data` member of a `{success, data}` envelope; JSON output
/// keeps the envelope
pub fn print_data(response: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(response),
        OutputFormat::Table => print_json(response.get("data").unwrap_or(response)),
        OutputFormat::Plain => print_plain(response.get("data").unwrap_or(response), ""),
    }
}

/// `key: value` lines, nested objects indented
fn print_plain(value: &Value, indent: &str) {
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{indent}{key}:");
                        print_plain(item, &format!("{indent}  "));
                    }
                    scalar => println!("{indent}{key}: {}", scalar_text(scalar)),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{indent}-");
                        print_plain(item, &format!("{indent}  "));
                    }
                    scalar => println!("{indent}- {}", scalar_text(scalar)),
                }
            }
        }
        scalar => println!("{indent}{}", scalar_text(scalar)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print the keyed health check
pub fn print_health(response: &Value, format: OutputFormat) {
    let health = response
        .get("data")
        .cloned()
        .and_then(|data| serde_json::from_value::<HealthResponse>(data).ok());

    match (format, health) {
        (OutputFormat::Table | OutputFormat::Plain, Some(health)) => {
            println!("VORTEX Service Health");
            println!("=====================");
            println!("Status:   {}", colorize_status(&health.status));
            println!("Service:  {}", health.service);
            println!("Version:  {}", health.version);
            println!("Uptime:   {}s", health.uptime_secs);
            println!("Requests: {}", health.total_requests);
            println!();
            println!("Components:");
            for component in &health.components {
                print!("  - {}: {}", component.name, colorize_status(&component.status));
                if let Some(msg) = &component.message {
                    print!(" ({})", msg);
                }
                println!();
            }
        }
        _ => print_json(response),
    }
}

pub fn print_balance(user: u64, balance: Decimal, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "user_id": user,
            "balance": balance.to_string(),
            "currency": TOLA,
        })),
        OutputFormat::Table => {
            println!("User:    {}", user);
            println!("Balance: {} {}", balance, TOLA);
        }
        OutputFormat::Plain => println!("{} {}", balance, TOLA),
    }
}

pub fn print_maintenance(report: &MaintenanceReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("Maintenance finished");
            println!("  Cache rows purged:      {}", report.cache_purged);
            println!("  Analytics rows deleted: {}", report.analytics_deleted);
        }
    }
}

/// Colorize status for terminal output
fn colorize_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => format!("\x1b[32m{}\x1b[0m", status),
        "degraded" => format!("\x1b[33m{}\x1b[0m", status),
        "unhealthy" => format!("\x1b[31m{}\x1b[0m", status),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_status() {
        assert!(colorize_status("healthy").contains("32m"));
        assert!(colorize_status("degraded").contains("33m"));
        assert!(colorize_status("unhealthy").contains("31m"));
        assert_eq!(colorize_status("unknown"), "unknown");
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&Value::String("a".into())), "a");
        assert_eq!(scalar_text(&serde_json::json!(1.5)), "1.5");
        assert_eq!(scalar_text(&Value::Null), "null");
    }
}
