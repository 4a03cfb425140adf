use clap::Subcommand;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::api::form::{CreateCategoryRequest, CreateFormRequest, CreateResponseRequest};
use crate::cli::client::ApiClient;
use crate::cli::config::read_document;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum FormCommands {
    #[command(about = "List forms (admin)")]
    List {
        #[arg(long, help = "Case-insensitive name search")]
        search: Option<String>,
        #[arg(long, help = "Only forms in this category")]
        category_id: Option<i32>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },

    #[command(about = "Show a form with its sections, fields and options")]
    Show {
        #[arg(help = "Form id")]
        id: i32,
    },

    #[command(about = "Create a form from a JSON or YAML file (admin)")]
    Create {
        #[arg(long, help = "Path to the form document")]
        file: PathBuf,
    },

    #[command(about = "List categories (admin)")]
    Categories,

    #[command(about = "Create a category (admin)")]
    CreateCategory {
        #[arg(help = "Category name")]
        name: String,
    },

    #[command(about = "List field types (admin)")]
    FieldTypes,

    #[command(about = "Submit a response from a JSON or YAML file")]
    Submit {
        #[arg(help = "Form id")]
        id: i32,
        #[arg(long, help = "Path to the response document")]
        file: PathBuf,
    },
}

pub async fn handle(cmd: FormCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated()?;

    match cmd {
        FormCommands::List {
            search,
            category_id,
            page,
            page_size,
        } => {
            let mut query = vec![("page", page.to_string()), ("pageSize", page_size.to_string())];
            if let Some(search) = search {
                query.push(("search", search));
            }
            if let Some(category_id) = category_id {
                query.push(("categoryId", category_id.to_string()));
            }

            let data = client.get("/api/form/forms", &query).await?;
            if data["items"].as_array().map_or(true, |items| items.is_empty()) {
                return output_empty_collection(&output_format, "forms", "No forms found");
            }

            output_data(&output_format, &data, |page| {
                println!("{:<6} {:<40} {:<25} {}", "ID", "NAME", "CATEGORY", "SECTIONS");
                println!("{}", "-".repeat(80));
                for form in page["items"].as_array().into_iter().flatten() {
                    println!(
                        "{:<6} {:<40} {:<25} {}",
                        text(form, "id"),
                        text(form, "name"),
                        text(form, "category"),
                        text(form, "sections")
                    );
                }
                print_page_footer(page);
            })
        }
        FormCommands::Show { id } => {
            let data = client.get(&format!("/api/form/{}", id), &[]).await?;
            output_data(&output_format, &data, print_form)
        }
        FormCommands::Create { file } => {
            let request: CreateFormRequest = read_document(&file)?;
            let data = client.post("/api/form/forms", &request).await?;
            output_success(
                &output_format,
                &format!("Form '{}' created with id {}", text(&data, "name"), text(&data, "id")),
                Some(json!({ "form": data })),
            )
        }
        FormCommands::Categories => {
            let data = client.get("/api/form/categories", &[]).await?;
            if data.as_array().map_or(true, |c| c.is_empty()) {
                return output_empty_collection(&output_format, "categories", "No categories defined");
            }
            output_data(&output_format, &data, |categories| {
                println!("{:<6} {:<40} {}", "ID", "NAME", "FORMS");
                println!("{}", "-".repeat(55));
                for category in categories.as_array().into_iter().flatten() {
                    println!(
                        "{:<6} {:<40} {}",
                        text(category, "id"),
                        text(category, "name"),
                        text(category, "formsCount")
                    );
                }
            })
        }
        FormCommands::CreateCategory { name } => {
            let data = client.post("/api/form/create-category", &CreateCategoryRequest { name }).await?;
            output_success(
                &output_format,
                &format!("Category '{}' created with id {}", text(&data, "name"), text(&data, "id")),
                Some(json!({ "category": data })),
            )
        }
        FormCommands::FieldTypes => {
            let data = client.get("/api/form/form-field-types", &[]).await?;
            output_data(&output_format, &data, |types| {
                for field_type in types.as_array().into_iter().flatten() {
                    println!("{:<4} {}", text(field_type, "id"), text(field_type, "name"));
                }
            })
        }
        FormCommands::Submit { id, file } => {
            let request: CreateResponseRequest = read_document(&file)?;
            let data = client.post(&format!("/api/form/{}/responses", id), &request).await?;
            output_success(
                &output_format,
                &format!("Response {} recorded for form {}", text(&data, "id"), id),
                Some(json!({ "response": data })),
            )
        }
    }
}

fn print_form(form: &Value) {
    println!("Form {}: {}", text(form, "id"), text(form, "name"));
    println!("Category: {} ({})", text(form, "categoryName"), text(form, "categoryId"));
    for section in form["sections"].as_array().into_iter().flatten() {
        println!();
        println!("[{}] {}", text(section, "id"), text(section, "name"));
        for field in section["fields"].as_array().into_iter().flatten() {
            println!(
                "  {:<6} {:<35} {}",
                text(field, "id"),
                text(field, "name"),
                text(field, "formFieldTypeName")
            );
            for option in field["options"].as_array().into_iter().flatten() {
                println!("         - {} ({})", text(option, "name"), text(option, "id"));
            }
        }
    }
}
