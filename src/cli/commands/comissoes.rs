use clap::{Args, Subcommand};
use serde_json::{Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

const COLUMNS: &[&str] = &["id", "nome", "area_atuacao", "ativa"];

#[derive(Subcommand)]
pub enum ComissaoCommands {
    #[command(about = "List committees")]
    List {
        #[arg(long, help = "Only active committees")]
        ativas: bool,
    },

    #[command(about = "Show one committee")]
    Show {
        id: String,
    },

    #[command(about = "Create a committee")]
    Create {
        #[arg(help = "Committee name")]
        nome: String,
        #[command(flatten)]
        fields: ComissaoFields,
    },

    #[command(about = "Update fields of a committee")]
    Update {
        id: String,
        #[arg(long)]
        nome: Option<String>,
        #[command(flatten)]
        fields: ComissaoFields,
        #[arg(long, help = "Mark active or inactive")]
        ativa: Option<bool>,
    },

    #[command(about = "Committees sharing projects with this one")]
    Similares {
        id: String,
    },
}

#[derive(Args)]
pub struct ComissaoFields {
    #[arg(long)]
    pub descricao: Option<String>,
    #[arg(long, help = "Comma-separated areas")]
    pub area_atuacao: Option<String>,
    #[arg(long)]
    pub contato_responsavel: Option<String>,
}

impl ComissaoFields {
    fn into_body(self, body: &mut Map<String, Value>) {
        insert_some(body, "descricao", self.descricao);
        insert_some(body, "area_atuacao", self.area_atuacao);
        insert_some(body, "contato_responsavel", self.contato_responsavel);
    }
}

pub(crate) fn insert_some<T: Into<Value>>(body: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value.into());
    }
}

pub async fn handle(cmd: ComissaoCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated()?;

    match cmd {
        ComissaoCommands::List { ativas } => {
            let path = if ativas { "/api/comissoes?ativa=true" } else { "/api/comissoes" };
            let rows = client.get(path).await?;
            output_data(&output_format, &rows, COLUMNS)
        }
        ComissaoCommands::Show { id } => {
            let comissao = client.get(&format!("/api/comissoes/{}", id)).await?;
            output_data(&output_format, &comissao, COLUMNS)
        }
        ComissaoCommands::Create { nome, fields } => {
            let mut body = Map::new();
            body.insert("nome".to_string(), Value::from(nome));
            fields.into_body(&mut body);
            let comissao = client.post("/api/comissoes", &Value::Object(body)).await?;
            output_data(&output_format, &comissao, COLUMNS)
        }
        ComissaoCommands::Update { id, nome, fields, ativa } => {
            let mut body = Map::new();
            insert_some(&mut body, "nome", nome);
            insert_some(&mut body, "ativa", ativa);
            fields.into_body(&mut body);
            if body.is_empty() {
                anyhow::bail!("Nothing to update");
            }
            let comissao = client.patch(&format!("/api/comissoes/{}", id), &Value::Object(body)).await?;
            output_data(&output_format, &comissao, COLUMNS)
        }
        ComissaoCommands::Similares { id } => {
            let rows = client.get(&format!("/api/comissoes/{}/similares", id)).await?;
            output_data(
                &output_format,
                &rows,
                &["comissao_similar_id", "comissao_similar_nome", "projetos_similares", "areas_comuns"],
            )
        }
    }
}
