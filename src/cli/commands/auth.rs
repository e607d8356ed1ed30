use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login and store the session token")]
    Login {
        #[arg(help = "Username (derived from the committee name)")]
        username: String,
        #[arg(long, short, help = "Password")]
        password: String,
    },

    #[command(about = "End the session and forget the stored token")]
    Logout,

    #[command(about = "Show the logged-in user")]
    Whoami,

    #[command(about = "Create the account of a committee")]
    Register {
        #[arg(help = "Committee id")]
        comissao_id: String,
        #[arg(long, help = "Full name of the person responsible")]
        nome_completo: Option<String>,
        #[arg(long, help = "Contact email, used for recovery")]
        email: Option<String>,
    },

    #[command(about = "Replace the password of the logged-in user")]
    Password {
        #[arg(help = "New password (at least 6 characters)")]
        nova_senha: String,
    },

    #[command(about = "Request a password recovery token")]
    Recover {
        #[arg(help = "Registered email")]
        email: String,
    },

    #[command(about = "Log in with a recovery token")]
    Verify {
        #[arg(help = "Recovery token")]
        token: String,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let env = load_environment_config()?;
            let sessao = ApiClient::new(env.server_url, None)?
                .post("/auth/login", &json!({ "nome_usuario": username, "senha": password }))
                .await?;
            store_session(&sessao)?;
            report_session(&output_format, "Logged in", &sessao)
        }
        AuthCommands::Logout => {
            let mut env = load_environment_config()?;
            if env.token.is_some() {
                // Server side only acknowledges; local state is what matters
                if let Err(e) = ApiClient::from_env(&env)?.delete("/api/auth/session").await {
                    tracing::debug!("Logout acknowledgement failed: {}", e);
                }
            }
            env.clear_session();
            save_environment_config(&env)?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => {
            let usuario = ApiClient::authenticated()?.get("/api/auth/whoami").await?;
            output_data(&output_format, &usuario, &[])
        }
        AuthCommands::Register { comissao_id, nome_completo, email } => {
            let env = load_environment_config()?;
            let cadastro = ApiClient::new(env.server_url, None)?
                .post(
                    "/auth/register",
                    &json!({ "comissao_id": comissao_id, "nome_completo": nome_completo, "email": email }),
                )
                .await?;
            let message = cadastro["message"].as_str().unwrap_or("User registered").to_string();
            output_success(&output_format, &message, Some(json!({ "nome_usuario": cadastro["nome_usuario"] })))
        }
        AuthCommands::Password { nova_senha } => {
            let sessao = ApiClient::authenticated()?
                .put("/api/auth/password", &json!({ "nova_senha": nova_senha }))
                .await?;
            store_session(&sessao)?;
            output_success(&output_format, "Password changed", None)
        }
        AuthCommands::Recover { email } => {
            let env = load_environment_config()?;
            let result = ApiClient::new(env.server_url, None)?
                .post("/auth/recover", &json!({ "email": email }))
                .await?;
            let message = result["message"].as_str().unwrap_or("Recovery requested").to_string();
            output_success(&output_format, &message, Some(result))
        }
        AuthCommands::Verify { token } => {
            let env = load_environment_config()?;
            let sessao = ApiClient::new(env.server_url, None)?
                .post("/auth/recover/verify", &json!({ "token": token }))
                .await?;
            store_session(&sessao)?;
            report_session(&output_format, "Recovery token accepted", &sessao)
        }
    }
}

fn store_session(sessao: &Value) -> anyhow::Result<()> {
    let token = sessao["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Server response carried no token"))?;
    let username = sessao["usuario"]["nome_usuario"].as_str().unwrap_or_default();

    let mut env = load_environment_config()?;
    env.set_session(token.to_string(), username.to_string());
    save_environment_config(&env)
}

fn report_session(output_format: &OutputFormat, message: &str, sessao: &Value) -> anyhow::Result<()> {
    let must_change = sessao["require_password_change"].as_bool().unwrap_or(false);
    output_success(
        output_format,
        message,
        Some(json!({
            "nome_usuario": sessao["usuario"]["nome_usuario"],
            "require_password_change": must_change,
        })),
    )?;
    if must_change && matches!(output_format, OutputFormat::Text) {
        println!("! Set a new password with `comissoes auth password <nova_senha>`");
    }
    Ok(())
}
