use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// Print a success message; in JSON mode `data`'s fields are merged into the object
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".to_string(), Value::Bool(true));
            response.insert("message".to_string(), Value::String(message.to_string()));
            if let Some(Value::Object(fields)) = data {
                response.extend(fields);
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print an API payload: raw JSON, or through `render` for text mode
pub fn output_data<F>(output_format: &OutputFormat, data: &Value, render: F) -> anyhow::Result<()>
where
    F: FnOnce(&Value),
{
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => render(data),
    }
    Ok(())
}

pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Text-mode footer for a paged result
pub fn print_page_footer(page: &Value) {
    println!(
        "Page {} (size {}), {} total",
        page["page"].as_u64().unwrap_or(1),
        page["pageSize"].as_u64().unwrap_or(0),
        page["totalCount"].as_i64().unwrap_or(0)
    );
}

/// String field or "" for text tables
pub fn text(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// "server" -> "Server"
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Switch the current item after checking it exists
pub fn switch_current_item<F, G>(
    item_name: &str,
    item_type: &str,
    check_exists: F,
    update_current: G,
    output_format: &OutputFormat,
) -> anyhow::Result<()>
where
    F: Fn(&str) -> anyhow::Result<bool>,
    G: Fn(&str) -> anyhow::Result<()>,
{
    if !check_exists(item_name)? {
        return Err(anyhow::anyhow!("{} '{}' not found", capitalize(item_type), item_name));
    }

    update_current(item_name)?;

    output_success(
        output_format,
        &format!("Switched to {} '{}'", item_type, item_name),
        Some(json!({ format!("current_{}", item_type): item_name })),
    )
}

/// Remove an item and clear it from the current selection if it was selected
pub fn delete_item_with_current_check<F, G, H>(
    item_name: &str,
    item_type: &str,
    check_exists: F,
    remove_item: G,
    clear_if_current: H,
    output_format: &OutputFormat,
) -> anyhow::Result<()>
where
    F: Fn(&str) -> anyhow::Result<bool>,
    G: Fn(&str) -> anyhow::Result<()>,
    H: Fn(&str) -> anyhow::Result<()>,
{
    if !check_exists(item_name)? {
        return Err(anyhow::anyhow!("{} '{}' not found", capitalize(item_type), item_name));
    }

    remove_item(item_name)?;
    clear_if_current(item_name)?;

    output_success(
        output_format,
        &format!("{} '{}' deleted successfully", capitalize(item_type), item_name),
        None,
    )
}
