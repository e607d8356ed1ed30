pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "comissoes")]
#[command(about = "Command-line client for the OAB Comissões API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Target server selection and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Login, registration and password management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Committees")]
    Comissoes {
        #[command(subcommand)]
        cmd: commands::comissoes::ComissaoCommands,
    },

    #[command(about = "Projects, their committees and tags")]
    Projetos {
        #[command(subcommand)]
        cmd: commands::projetos::ProjetoCommands,
    },

    #[command(about = "Committee members")]
    Membros {
        #[command(subcommand)]
        cmd: commands::membros::MembroCommands,
    },

    #[command(about = "Search projects and committees")]
    Buscar {
        #[arg(help = "Search term")]
        termo: String,
    },

    #[command(about = "Integration suggestions catalogue")]
    Sugestoes {
        #[command(subcommand)]
        cmd: commands::sugestoes::SugestaoCommands,
    },

    #[command(about = "Turn a project idea into a structured proposal")]
    Ideia {
        #[arg(help = "Free-text description of the idea")]
        ideia: String,
    },

    #[command(about = "Direct database bootstrap (uses DATABASE_URL)")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Comissoes { cmd } => commands::comissoes::handle(cmd, output_format).await,
        Commands::Projetos { cmd } => commands::projetos::handle(cmd, output_format).await,
        Commands::Membros { cmd } => commands::membros::handle(cmd, output_format).await,
        Commands::Buscar { termo } => commands::buscar::handle(termo, output_format).await,
        Commands::Sugestoes { cmd } => commands::sugestoes::handle(cmd, output_format).await,
        Commands::Ideia { ideia } => commands::ideia::handle(ideia, output_format).await,
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from(["comissoes", "--json", "projetos", "list", "--status", "em_andamento"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Projetos { .. }));

        let cli = Cli::try_parse_from(["comissoes", "buscar", "pje"]).unwrap();
        assert!(matches!(cli.command, Commands::Buscar { ref termo } if termo == "pje"));
    }
}
