use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Register remote server")]
    Add {
        #[arg(help = "Server URL, e.g. http://localhost:5000")]
        url: String,
        #[arg(help = "Server name (defaults to the URL host)")]
        name: Option<String>,
        #[arg(long, default_value = "", help = "Free-form description")]
        description: String,
    },

    #[command(about = "List all servers with last known health status")]
    List,

    #[command(about = "Switch to server (persistent selection)")]
    Use {
        #[arg(help = "Server name to switch to")]
        name: String,
    },

    #[command(about = "Remove server from registry")]
    Delete {
        #[arg(help = "Server name to delete")]
        name: String,
    },

    #[command(about = "Check server health from the /health endpoint (defaults to current server)")]
    Health {
        #[arg(help = "Server name")]
        name: Option<String>,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Add { url, name, description } => {
            let info = ServerInfo::new(&url, description)?;
            let name = name.unwrap_or_else(|| info.default_name());

            let mut config = load_server_config()?;
            if config.servers.contains_key(&name) {
                return Err(anyhow::anyhow!("Server '{}' already exists", name));
            }
            let server_url = info.url.clone();
            config.servers.insert(name.clone(), info);
            save_server_config(&config)?;

            // First server added becomes current
            let mut env_config = load_environment_config()?;
            if env_config.current_server.is_none() {
                env_config.current_server = Some(name.clone());
                save_environment_config(&env_config)?;
            }

            output_success(
                &output_format,
                &format!("Server '{}' added ({})", name, server_url),
                Some(json!({ "server": name, "url": server_url })),
            )
        }
        ServerCommands::List => {
            let config = load_server_config()?;
            let env_config = load_environment_config()?;

            if config.servers.is_empty() {
                return output_empty_collection(&output_format, "servers", "No servers configured");
            }

            let mut names: Vec<&String> = config.servers.keys().collect();
            names.sort();

            match output_format {
                OutputFormat::Json => {
                    let servers: Vec<_> = names
                        .iter()
                        .map(|name| {
                            let info = &config.servers[*name];
                            json!({
                                "name": name,
                                "url": info.url,
                                "description": info.description,
                                "status": info.status,
                                "last_ping": info.last_ping,
                                "current": env_config.current_server.as_ref() == Some(*name)
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "servers": servers }))?);
                }
                OutputFormat::Text => {
                    println!("{:<15} {:<35} {:<8} {}", "NAME", "URL", "STATUS", "DESCRIPTION");
                    println!("{}", "-".repeat(80));
                    for name in names {
                        let info = &config.servers[name];
                        let marker = if env_config.current_server.as_ref() == Some(name) { "*" } else { " " };
                        let status = match info.status {
                            ServerStatus::Up => "up",
                            ServerStatus::Down => "down",
                            ServerStatus::Unknown => "unknown",
                        };
                        println!("{}{:<14} {:<35} {:<8} {}", marker, name, info.url, status, info.description);
                    }
                }
            }
            Ok(())
        }
        ServerCommands::Use { name } => switch_current_item(
            &name,
            "server",
            |name| Ok(load_server_config()?.servers.contains_key(name)),
            |name| {
                let mut env_config = load_environment_config()?;
                env_config.current_server = Some(name.to_string());
                save_environment_config(&env_config)
            },
            &output_format,
        ),
        ServerCommands::Delete { name } => delete_item_with_current_check(
            &name,
            "server",
            |name| Ok(load_server_config()?.servers.contains_key(name)),
            |name| {
                let mut config = load_server_config()?;
                config.servers.remove(name);
                save_server_config(&config)
            },
            |name| {
                let mut env_config = load_environment_config()?;
                env_config.sessions.remove(name);
                if env_config.current_server.as_deref() == Some(name) {
                    env_config.current_server = None;
                }
                save_environment_config(&env_config)
            },
            &output_format,
        ),
        ServerCommands::Health { name } => {
            let target = match name {
                Some(name) => name,
                None => current_server()?.0,
            };

            let mut config = load_server_config()?;
            let info = config
                .servers
                .get_mut(&target)
                .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", target))?;

            let status = ping_server(info).await;
            info.update_ping(status);
            let url = info.url.clone();
            save_server_config(&config)?;

            match status {
                ServerStatus::Up => output_success(
                    &output_format,
                    &format!("Server '{}' is healthy", target),
                    Some(json!({ "server": target, "url": url, "status": status })),
                ),
                _ => Err(anyhow::anyhow!("Server '{}' ({}) is unavailable", target, url)),
            }
        }
    }
}
