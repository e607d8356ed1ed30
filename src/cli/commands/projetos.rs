use clap::Subcommand;
use serde_json::{json, Map, Value};

use super::comissoes::insert_some;
use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

const COLUMNS: &[&str] = &["id", "nome", "status", "comissoes"];

#[derive(Subcommand)]
pub enum ProjetoCommands {
    #[command(about = "List projects with their committees")]
    List {
        #[arg(long, help = "planejamento | em_andamento | concluido | cancelado")]
        status: Option<String>,
        #[arg(long, help = "Only projects of this committee")]
        comissao: Option<String>,
    },

    #[command(about = "Show a project with committees and tags")]
    Show {
        id: String,
    },

    #[command(about = "Create a project, link committees and add tags")]
    Create {
        #[arg(help = "Project name")]
        nome: String,
        #[arg(long, default_value = "planejamento")]
        status: String,
        #[arg(long = "comissao", required = true, help = "Committee as ID or ID:papel (lider, participante, consultivo); repeatable")]
        comissoes: Vec<String>,
        #[arg(long = "tag", help = "Repeatable")]
        tags: Vec<String>,
        #[arg(long)]
        descricao: Option<String>,
        #[arg(long)]
        objetivos: Option<String>,
        #[arg(long)]
        resultados_esperados: Option<String>,
        #[arg(long)]
        publico_alvo: Option<String>,
        #[arg(long, help = "YYYY-MM-DD")]
        data_inicio: Option<String>,
        #[arg(long, help = "YYYY-MM-DD")]
        data_fim_prevista: Option<String>,
    },

    #[command(about = "Update project fields")]
    Update {
        id: String,
        #[arg(long)]
        nome: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        descricao: Option<String>,
        #[arg(long, help = "YYYY-MM-DD")]
        data_fim_real: Option<String>,
    },

    #[command(about = "Delete a project with its links and tags")]
    Delete {
        id: String,
    },

    #[command(about = "Projects sharing committees with this one")]
    Integracoes {
        id: String,
    },

    #[command(about = "Totals by status and newest projects")]
    Stats,
}

/// `ID` or `ID:papel` into a committee link entry
pub fn parse_vinculo(raw: &str) -> Value {
    match raw.split_once(':') {
        Some((id, papel)) if !papel.trim().is_empty() => {
            json!({ "comissao_id": id.trim(), "papel_comissao": papel.trim() })
        }
        Some((id, _)) => json!({ "comissao_id": id.trim() }),
        None => json!({ "comissao_id": raw.trim() }),
    }
}

pub async fn handle(cmd: ProjetoCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated()?;

    match cmd {
        ProjetoCommands::List { status, comissao } => {
            let mut query = Vec::new();
            if let Some(status) = status {
                query.push(("status", status));
            }
            if let Some(comissao) = comissao {
                query.push(("comissao_id", comissao));
            }
            let rows = client.get_query("/api/projetos", &query).await?;
            output_data(&output_format, &rows, COLUMNS)
        }
        ProjetoCommands::Show { id } => {
            let projeto = client.get(&format!("/api/projetos/{}", id)).await?;
            output_data(&output_format, &projeto, COLUMNS)
        }
        ProjetoCommands::Create {
            nome,
            status,
            comissoes,
            tags,
            descricao,
            objetivos,
            resultados_esperados,
            publico_alvo,
            data_inicio,
            data_fim_prevista,
        } => {
            let mut body = Map::new();
            body.insert("nome".to_string(), Value::from(nome));
            body.insert("status".to_string(), Value::from(status));
            body.insert("comissoes".to_string(), comissoes.iter().map(|c| parse_vinculo(c)).collect());
            body.insert("tags".to_string(), Value::from(tags));
            insert_some(&mut body, "descricao", descricao);
            insert_some(&mut body, "objetivos", objetivos);
            insert_some(&mut body, "resultados_esperados", resultados_esperados);
            insert_some(&mut body, "publico_alvo", publico_alvo);
            insert_some(&mut body, "data_inicio", data_inicio);
            insert_some(&mut body, "data_fim_prevista", data_fim_prevista);

            let criado = client.post("/api/projetos", &Value::Object(body)).await?;
            report_creation(&output_format, &criado)
        }
        ProjetoCommands::Update { id, nome, status, descricao, data_fim_real } => {
            let mut body = Map::new();
            insert_some(&mut body, "nome", nome);
            insert_some(&mut body, "status", status);
            insert_some(&mut body, "descricao", descricao);
            insert_some(&mut body, "data_fim_real", data_fim_real);
            if body.is_empty() {
                anyhow::bail!("Nothing to update");
            }
            let projeto = client.patch(&format!("/api/projetos/{}", id), &Value::Object(body)).await?;
            output_data(&output_format, &projeto, COLUMNS)
        }
        ProjetoCommands::Delete { id } => {
            client.delete(&format!("/api/projetos/{}", id)).await?;
            output_success(&output_format, &format!("Project {} deleted", id), None)
        }
        ProjetoCommands::Integracoes { id } => {
            let rows = client.get(&format!("/api/projetos/{}/integracoes", id)).await?;
            output_data(
                &output_format,
                &rows,
                &["projeto_similar_id", "projeto_similar_nome", "comissoes_comuns", "pontuacao_similaridade"],
            )
        }
        ProjetoCommands::Stats => {
            let stats = client.get("/api/projetos/estatisticas").await?;
            output_data(&output_format, &stats, &[])
        }
    }
}

fn report_creation(output_format: &OutputFormat, criado: &Value) -> anyhow::Result<()> {
    if let OutputFormat::Json = output_format {
        return output_data(output_format, criado, &[]);
    }

    let relatorio = &criado["relatorio"];
    println!(
        "✓ Project '{}' created ({})",
        display(&criado["projeto"]["nome"]),
        display(&criado["projeto"]["id"])
    );
    println!(
        "  committees linked: {}/{}   tags added: {}/{}",
        relatorio["comissoes_vinculadas"], relatorio["comissoes_solicitadas"],
        relatorio["tags_adicionadas"], relatorio["tags_solicitadas"]
    );
    if let Some(falhas) = relatorio["falhas"].as_array() {
        for falha in falhas {
            println!(
                "  ! {} '{}': {}",
                display(&falha["etapa"]),
                display(&falha["valor"]),
                display(&falha["motivo"])
            );
        }
    }
    Ok(())
}
