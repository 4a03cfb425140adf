use clap::Subcommand;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users (admin)")]
    List {
        #[arg(long, help = "Matches email, names and izaro code")]
        search: Option<String>,
        #[arg(long, help = "Only users holding this role")]
        role: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },

    #[command(about = "Show one user (admin)")]
    Show {
        #[arg(help = "User id")]
        id: Uuid,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated()?;

    match cmd {
        UserCommands::List {
            search,
            role,
            page,
            page_size,
        } => {
            let mut query = vec![("page", page.to_string()), ("pageSize", page_size.to_string())];
            if let Some(search) = search {
                query.push(("search", search));
            }
            if let Some(role) = role {
                query.push(("role", role));
            }

            let data = client.get("/api/admin/users", &query).await?;
            if data["items"].as_array().map_or(true, |items| items.is_empty()) {
                return output_empty_collection(&output_format, "users", "No users found");
            }

            output_data(&output_format, &data, |page| {
                println!("{:<36} {:<30} {:<25} {:<10} {}", "ID", "EMAIL", "NAME", "IZARO", "ROLES");
                println!("{}", "-".repeat(115));
                for user in page["items"].as_array().into_iter().flatten() {
                    println!(
                        "{:<36} {:<30} {:<25} {:<10} {}",
                        text(user, "id"),
                        text(user, "email"),
                        format!("{} {}", text(user, "firstName"), text(user, "lastName")),
                        text(user, "izaroCode"),
                        roles_text(user)
                    );
                }
                print_page_footer(page);
            })
        }
        UserCommands::Show { id } => {
            let data = client.get(&format!("/api/admin/users/{}", id), &[]).await?;
            output_data(&output_format, &data, |user| {
                println!("{} {} <{}>", text(user, "firstName"), text(user, "lastName"), text(user, "email"));
                println!("Id: {}", text(user, "id"));
                println!("Izaro code: {}", text(user, "izaroCode"));
                println!("Roles: {}", roles_text(user));
            })
        }
    }
}

fn roles_text(user: &serde_json::Value) -> String {
    user["roles"]
        .as_array()
        .map(|roles| roles.iter().filter_map(|r| r.as_str()).collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}
