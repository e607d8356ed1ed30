use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

const DEFAULT_FIXTURE: &str = include_str!("../../../fixtures/comissoes.json");

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create tables, views and indexes from sql/schema.sql")]
    Init,

    #[command(about = "Insert the committee fixture, skipping names already present")]
    Seed {
        #[arg(long, help = "JSON array of {nome, descricao, area_atuacao}; defaults to the bundled list")]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureComissao {
    pub nome: String,
    pub descricao: Option<String>,
    pub area_atuacao: Option<String>,
}

pub fn parse_fixture(content: &str) -> anyhow::Result<Vec<FixtureComissao>> {
    let comissoes: Vec<FixtureComissao> = serde_json::from_str(content).context("invalid committee fixture")?;
    if let Some(blank) = comissoes.iter().position(|c| c.nome.trim().is_empty()) {
        anyhow::bail!("fixture entry {} has an empty nome", blank);
    }
    Ok(comissoes)
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = crate::config::config();
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("could not connect to DATABASE_URL")?;

    match cmd {
        DbCommands::Init => {
            DatabaseManager::apply_schema(&pool).await?;
            output_success(&output_format, "Schema applied", None)
        }
        DbCommands::Seed { file } => {
            let content = match &file {
                Some(path) => std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?,
                None => DEFAULT_FIXTURE.to_string(),
            };
            let comissoes = parse_fixture(&content)?;

            let mut inserted = 0u64;
            for comissao in &comissoes {
                let result = sqlx::query(
                    r#"
                    INSERT INTO comissoes (nome, descricao, area_atuacao)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (nome) DO NOTHING
                    "#,
                )
                .bind(comissao.nome.trim())
                .bind(&comissao.descricao)
                .bind(&comissao.area_atuacao)
                .execute(&pool)
                .await
                .with_context(|| format!("failed to insert '{}'", comissao.nome))?;
                inserted += result.rows_affected();
            }

            tracing::info!("Seeded {} of {} committees", inserted, comissoes.len());
            output_success(
                &output_format,
                &format!("{} committees inserted, {} already present", inserted, comissoes.len() as u64 - inserted),
                Some(json!({ "inserted": inserted, "total": comissoes.len() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bundled_fixture_has_unique_named_committees() {
        let comissoes = parse_fixture(DEFAULT_FIXTURE).unwrap();
        assert_eq!(comissoes.len(), 43);
        let names: HashSet<_> = comissoes.iter().map(|c| c.nome.as_str()).collect();
        assert_eq!(names.len(), comissoes.len());
        assert!(comissoes.iter().all(|c| c.area_atuacao.is_some()));
    }

    #[test]
    fn rejects_blank_names() {
        assert!(parse_fixture(r#"[{"nome": "  "}]"#).is_err());
        assert!(parse_fixture("{}").is_err());
    }
}
