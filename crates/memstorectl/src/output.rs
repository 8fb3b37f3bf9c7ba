use anyhow::{Context, Result};
use comfy_table::Table;
use jpx_core::Runtime;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Global JMESPath runtime with extended functions
static JMESPATH_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the JMESPath runtime with extended functions
pub fn get_jmespath_runtime() -> &'static Runtime {
    JMESPATH_RUNTIME.get_or_init(|| Runtime::builder().with_all_extensions().build())
}

/// Normalize backtick literals in JMESPath expressions.
///
/// JMESPath allows "elided quotes" in backtick literals, so `` `ready` `` is
/// the same as `` `"ready"` ``. The runtime wants valid JSON between the
/// backticks, so bare words are quoted here.
///
/// Examples:
/// - `` `ready` `` -> `` `"ready"` ``
/// - `` `true` `` -> `` `true` ``
/// - `` `3` `` -> `` `3` ``
fn normalize_backtick_literals(query: &str) -> String {
    static BACKTICK_RE: OnceLock<Regex> = OnceLock::new();
    let re = BACKTICK_RE.get_or_init(|| {
        Regex::new(r"`([^`\\]*(?:\\.[^`\\]*)*)`").expect("backtick pattern is valid")
    });

    re.replace_all(query, |caps: &regex::Captures| {
        let content = &caps[1];
        let trimmed = content.trim();

        if serde_json::from_str::<Value>(trimmed).is_ok() {
            format!("`{}`", content)
        } else {
            let escaped = trimmed.replace('\\', "\\\\").replace('"', "\\\"");
            format!("`\"{}\"`", escaped)
        }
    })
    .into_owned()
}

/// Compile a JMESPath expression using the extended runtime.
pub fn compile_jmespath(
    query: &str,
) -> Result<jpx_core::Expression<'static>, jpx_core::JmespathError> {
    let normalized = normalize_backtick_literals(query);
    get_jmespath_runtime().compile(&normalized)
}

/// Apply an optional JMESPath query to a JSON value
pub fn apply_query(value: Value, query: Option<&str>) -> Result<Value> {
    match query {
        Some(query_str) => {
            let expr = compile_jmespath(query_str)
                .with_context(|| format!("Invalid JMESPath expression: {}", query_str))?;
            expr.search(&value).context("JMESPath query failed")
        }
        None => Ok(value),
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

pub fn print_output<T: Serialize>(
    data: T,
    format: OutputFormat,
    query: Option<&str>,
) -> Result<()> {
    let json_value = apply_query(serde_json::to_value(data)?, query)?;
    println!("{}", render(&json_value, format)?);
    Ok(())
}

/// Render a value in the given format without printing it
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Table => render_table(value),
    })
}

fn render_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_backtick_unquoted_string() {
        assert_eq!(
            normalize_backtick_literals(r#"[?status==`ready`]"#),
            r#"[?status==`"ready"`]"#
        );
    }

    #[test]
    fn test_normalize_backtick_already_quoted() {
        assert_eq!(
            normalize_backtick_literals(r#"[?status==`"ready"`]"#),
            r#"[?status==`"ready"`]"#
        );
    }

    #[test]
    fn test_normalize_backtick_json_literals_untouched() {
        assert_eq!(
            normalize_backtick_literals(r#"[?cluster_size==`3`]"#),
            r#"[?cluster_size==`3`]"#
        );
        assert_eq!(
            normalize_backtick_literals(r#"[?tls_enabled==`true`]"#),
            r#"[?tls_enabled==`true`]"#
        );
        assert_eq!(
            normalize_backtick_literals(r#"`{"key": "value"}`"#),
            r#"`{"key": "value"}`"#
        );
    }

    #[test]
    fn test_normalize_multiple_backticks() {
        assert_eq!(
            normalize_backtick_literals(r#"[?status==`ready` && zone==`fr-par-1`]"#),
            r#"[?status==`"ready"` && zone==`"fr-par-1"`]"#
        );
    }

    #[test]
    fn test_apply_query_filters_clusters() {
        let data = json!([
            {"id": "a", "status": "ready"},
            {"id": "b", "status": "provisioning"},
            {"id": "c", "status": "ready"}
        ]);

        let result = apply_query(data, Some("[?status==`ready`].id")).unwrap();
        assert_eq!(result, json!(["a", "c"]));
    }

    #[test]
    fn test_apply_query_none_is_identity() {
        let data = json!({"id": "a"});
        assert_eq!(apply_query(data.clone(), None).unwrap(), data);
    }

    #[test]
    fn test_invalid_query_is_error() {
        let err = apply_query(json!({}), Some("[?status==")).unwrap_err();
        assert!(err.to_string().contains("Invalid JMESPath expression"));
    }

    #[test]
    fn test_render_formats() {
        let value = json!({"id": "a", "size": 3});

        let json_out = render(&value, OutputFormat::Json).unwrap();
        assert!(json_out.contains("\"size\": 3"));

        let yaml_out = render(&value, OutputFormat::Yaml).unwrap();
        assert!(yaml_out.contains("size: 3"));

        let table_out = render(&value, OutputFormat::Table).unwrap();
        assert!(table_out.contains("Key"));
        assert!(table_out.contains("size"));
    }

    #[test]
    fn test_render_table_array_of_objects() {
        let value = json!([
            {"id": "a", "endpoints": [1, 2]},
            {"id": "b", "endpoints": []}
        ]);
        let out = render(&value, OutputFormat::Table).unwrap();
        assert!(out.contains("[2 items]"));
        assert!(out.contains("[0 items]"));
    }

    #[test]
    fn test_format_value_scalars() {
        assert_eq!(format_value(&Value::Null), "null");
        assert_eq!(format_value(&json!("fr-par-1")), "fr-par-1");
        assert_eq!(format_value(&json!({"a": 1, "b": 2})), "{2 fields}");
    }
}
