use clap::Subcommand;
use serde_json::{Map, Value};

use super::comissoes::insert_some;
use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::types::split_list;

const COLUMNS: &[&str] = &["id", "nome", "tipo", "nivel_complexidade", "area_aplicacao"];

#[derive(Subcommand)]
pub enum SugestaoCommands {
    #[command(about = "List active suggestions")]
    List {
        #[arg(long, help = "api | software | servico | outra")]
        tipo: Option<String>,
        #[arg(long, help = "baixa | media | alta")]
        complexidade: Option<String>,
        #[arg(long, help = "Substring of the application area")]
        area: Option<String>,
        #[arg(long, help = "Substring of name or description")]
        search: Option<String>,
        #[arg(long, help = "Column to order by")]
        order_by: Option<String>,
        #[arg(long, help = "Ascending order")]
        asc: bool,
    },

    #[command(about = "Show one suggestion")]
    Show {
        id: String,
    },

    #[command(about = "Suggestions compatible with any of the given systems")]
    Compatibilidade {
        #[arg(help = "Comma-separated systems, e.g. pje,sei")]
        sistemas: String,
    },

    #[command(about = "Suggestions carrying any of the given tags")]
    Tags {
        #[arg(help = "Comma-separated tags")]
        tags: String,
    },

    #[command(about = "Counts by type and complexity")]
    Stats,

    #[command(about = "Register a suggestion")]
    Create {
        nome: String,
        #[arg(long)]
        descricao: String,
        #[arg(long)]
        tipo: String,
        #[arg(long)]
        area_aplicacao: String,
        #[arg(long, help = "baixa | media | alta (default media)")]
        complexidade: Option<String>,
        #[arg(long)]
        beneficios: Option<String>,
        #[arg(long)]
        url_documentacao: Option<String>,
        #[arg(long, help = "Comma-separated compatible systems")]
        compativel_com: Option<String>,
        #[arg(long, help = "Comma-separated tags")]
        tags: Option<String>,
    },

    #[command(about = "Deactivate a suggestion")]
    Deactivate {
        id: String,
    },
}

pub async fn handle(cmd: SugestaoCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated()?;

    match cmd {
        SugestaoCommands::List { tipo, complexidade, area, search, order_by, asc } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            let optional = [
                ("tipo", tipo),
                ("nivel_complexidade", complexidade),
                ("area_aplicacao", area),
                ("search", search),
                ("order_by", order_by),
            ];
            for (key, value) in optional {
                if let Some(value) = value {
                    query.push((key, value));
                }
            }
            if asc {
                query.push(("ascending", "true".to_string()));
            }
            let rows = client.get_query("/api/sugestoes", &query).await?;
            output_data(&output_format, &rows, COLUMNS)
        }
        SugestaoCommands::Show { id } => {
            let sugestao = client.get(&format!("/api/sugestoes/{}", id)).await?;
            output_data(&output_format, &sugestao, COLUMNS)
        }
        SugestaoCommands::Compatibilidade { sistemas } => {
            let rows = client
                .get_query("/api/sugestoes/compatibilidade", &[("sistemas", sistemas)])
                .await?;
            output_data(&output_format, &rows, COLUMNS)
        }
        SugestaoCommands::Tags { tags } => {
            let rows = client.get_query("/api/sugestoes/tags", &[("tags", tags)]).await?;
            output_data(&output_format, &rows, COLUMNS)
        }
        SugestaoCommands::Stats => {
            let stats = client.get("/api/sugestoes/estatisticas").await?;
            output_data(&output_format, &stats, &[])
        }
        SugestaoCommands::Create {
            nome,
            descricao,
            tipo,
            area_aplicacao,
            complexidade,
            beneficios,
            url_documentacao,
            compativel_com,
            tags,
        } => {
            let mut body = Map::new();
            body.insert("nome".to_string(), Value::from(nome));
            body.insert("descricao".to_string(), Value::from(descricao));
            body.insert("tipo".to_string(), Value::from(tipo));
            body.insert("area_aplicacao".to_string(), Value::from(area_aplicacao));
            insert_some(&mut body, "nivel_complexidade", complexidade);
            insert_some(&mut body, "beneficios", beneficios);
            insert_some(&mut body, "url_documentacao", url_documentacao);
            insert_some(&mut body, "compativel_com", compativel_com.as_deref().map(split_list));
            insert_some(&mut body, "tags", tags.as_deref().map(split_list));
            let sugestao = client.post("/api/sugestoes", &Value::Object(body)).await?;
            output_data(&output_format, &sugestao, COLUMNS)
        }
        SugestaoCommands::Deactivate { id } => {
            client.delete(&format!("/api/sugestoes/{}", id)).await?;
            output_success(&output_format, &format!("Suggestion {} deactivated", id), None)
        }
    }
}
