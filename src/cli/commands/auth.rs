use clap::Subcommand;
use serde_json::json;

use crate::api::auth::LoginRequest;
use crate::cli::client::ApiClient;
use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the current server and store the token")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, env = "ZERO_PASSWORD", hide_env_values = true, help = "Password (or set ZERO_PASSWORD)")]
        password: String,
    },

    #[command(about = "Forget the stored token for the current server")]
    Logout,

    #[command(about = "Show stored session for the current server")]
    Status,

    #[command(about = "Show current user information from the server")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let (server_name, _) = current_server()?;
            let client = ApiClient::anonymous()?;
            let data = client.post("/api/auth/login", &LoginRequest { email: email.clone(), password }).await?;

            let token = data["token"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Login response did not include a token"))?
                .to_string();
            let expires_at = serde_json::from_value(data["expiresAtUtc"].clone())
                .map_err(|e| anyhow::anyhow!("Login response has an invalid expiry: {}", e))?;

            let mut env_config = load_environment_config()?;
            env_config.sessions.insert(
                server_name.clone(),
                SessionInfo {
                    email: email.clone(),
                    token,
                    expires_at,
                },
            );
            save_environment_config(&env_config)?;

            output_success(
                &output_format,
                &format!("Logged in to '{}' as {}", server_name, email),
                Some(json!({ "server": server_name, "email": email, "expiresAtUtc": expires_at })),
            )
        }
        AuthCommands::Logout => {
            let (server_name, _) = current_server()?;
            let mut env_config = load_environment_config()?;
            if env_config.sessions.remove(&server_name).is_none() {
                return Err(anyhow::anyhow!("Not logged in to '{}'", server_name));
            }
            save_environment_config(&env_config)?;
            output_success(&output_format, &format!("Logged out of '{}'", server_name), None)
        }
        AuthCommands::Status => {
            let env_config = load_environment_config()?;
            let server = env_config.current_server.clone();
            let session = env_config.current_session();

            match output_format {
                OutputFormat::Json => {
                    let status = json!({
                        "server": server,
                        "authenticated": session.map(|s| !s.is_expired()).unwrap_or(false),
                        "email": session.map(|s| s.email.clone()),
                        "expiresAtUtc": session.map(|s| s.expires_at),
                    });
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
                OutputFormat::Text => match (server, session) {
                    (None, _) => println!("No current server set"),
                    (Some(server), None) => println!("Not logged in to '{}'", server),
                    (Some(server), Some(session)) if session.is_expired() => {
                        println!("Session for {} on '{}' expired at {}", session.email, server, session.expires_at)
                    }
                    (Some(server), Some(session)) => {
                        println!("Logged in to '{}' as {} until {}", server, session.email, session.expires_at)
                    }
                },
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let data = ApiClient::authenticated()?.get("/api/auth/me", &[]).await?;
            output_data(&output_format, &data, |me| {
                println!("{} {} <{}>", text(me, "firstName"), text(me, "lastName"), text(me, "email"));
                println!("Id: {}", text(me, "id"));
                println!("Izaro code: {}", text(me, "izaroCode"));
                let roles: Vec<String> = me["roles"]
                    .as_array()
                    .map(|r| r.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                println!("Roles: {}", roles.join(", "));
            })
        }
    }
}
