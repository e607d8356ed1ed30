use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server (clears the stored session)")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the configured server and session")]
    Show,

    #[command(about = "Health check the configured server")]
    Ping,

    #[command(about = "Show server information from the API root endpoint")]
    Info,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let server_url = normalize_server_url(&url)?;
            let mut env = load_environment_config()?;
            if env.server_url != server_url {
                env.clear_session();
            }
            env.server_url = server_url.clone();
            env.status = ServerStatus::Unknown;
            save_environment_config(&env)?;
            output_success(&output_format, &format!("Server set to {}", server_url), Some(json!({ "server_url": server_url })))
        }
        ServerCommands::Show => {
            let env = load_environment_config()?;
            let details = json!({
                "server_url": env.server_url,
                "username": env.username,
                "logged_in": env.token.is_some(),
                "status": env.status,
                "last_ping": env.last_ping,
            });
            output_data(&output_format, &details, &[])
        }
        ServerCommands::Ping => {
            let mut env = load_environment_config()?;
            let status = ping_server(&env.server_url).await;
            env.update_ping(status);
            save_environment_config(&env)?;

            let label = serde_json::to_value(status)?;
            let message = format!("{} is {}", env.server_url, display(&label));
            if status == ServerStatus::Down {
                anyhow::bail!(message);
            }
            output_success(&output_format, &message, Some(json!({ "status": label })))
        }
        ServerCommands::Info => {
            let env = load_environment_config()?;
            let info = ApiClient::new(env.server_url, None)?.get("/").await?;
            output_data(&output_format, &info, &[])
        }
    }
}
