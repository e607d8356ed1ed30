use clap::Subcommand;
use serde_json::{Map, Value};

use super::comissoes::insert_some;
use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum MembroCommands {
    #[command(about = "List members, optionally of one committee")]
    List {
        #[arg(long, help = "Committee id")]
        comissao: Option<String>,
    },

    #[command(about = "Add a member to a committee")]
    Add {
        #[arg(help = "Committee id")]
        comissao_id: String,
        #[arg(help = "Member name")]
        nome: String,
        #[arg(long)]
        cargo: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        telefone: Option<String>,
        #[arg(long, help = "OAB registration number")]
        inscricao_oab: Option<String>,
    },
}

pub async fn handle(cmd: MembroCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated()?;

    match cmd {
        MembroCommands::List { comissao } => {
            let query: Vec<(&str, String)> = comissao.into_iter().map(|id| ("comissao_id", id)).collect();
            let rows = client.get_query("/api/membros", &query).await?;
            output_data(&output_format, &rows, &["comissao_nome", "membro_nome", "cargo", "email"])
        }
        MembroCommands::Add { comissao_id, nome, cargo, email, telefone, inscricao_oab } => {
            let mut body = Map::new();
            body.insert("comissao_id".to_string(), Value::from(comissao_id));
            body.insert("nome".to_string(), Value::from(nome));
            insert_some(&mut body, "cargo", cargo);
            insert_some(&mut body, "email", email);
            insert_some(&mut body, "telefone", telefone);
            insert_some(&mut body, "inscricao_oab", inscricao_oab);
            let membro = client.post("/api/membros", &Value::Object(body)).await?;
            output_data(&output_format, &membro, &[])
        }
    }
}
