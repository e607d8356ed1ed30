use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{optional_text, required, ServiceError};
use crate::database::models::Comissao;
use crate::database::DatabaseError;
use crate::types::split_list;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NovaComissao {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub area_atuacao: Option<String>,
    pub contato_responsavel: Option<String>,
    pub ativa: Option<bool>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ComissaoPatch {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub area_atuacao: Option<String>,
    pub contato_responsavel: Option<String>,
    pub ativa: Option<bool>,
}

/// Committee that shares projects with a reference committee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComissaoSimilar {
    pub comissao_similar_id: Uuid,
    pub comissao_similar_nome: String,
    pub comissao_similar_descricao: Option<String>,
    pub projetos_similares: i64,
    pub areas_comuns: Vec<String>,
}

#[derive(Debug, FromRow)]
struct SharedProjectsRow {
    id: Uuid,
    nome: String,
    descricao: Option<String>,
    area_atuacao: Option<String>,
    projetos_similares: i64,
}

pub struct ComissaoService {
    pool: PgPool,
}

impl ComissaoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, only_active: Option<bool>) -> Result<Vec<Comissao>, ServiceError> {
        let rows = sqlx::query_as::<_, Comissao>(
            "SELECT * FROM comissoes WHERE ($1::boolean IS NULL OR ativa = $1) ORDER BY nome",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<Comissao, ServiceError> {
        sqlx::query_as::<_, Comissao>("SELECT * FROM comissoes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Comissão {} não encontrada", id)))
    }

    pub async fn create(&self, input: NovaComissao) -> Result<Comissao, ServiceError> {
        let nome = required("nome", input.nome.as_deref(), "Nome da comissão é obrigatório")?;

        let comissao = sqlx::query_as::<_, Comissao>(
            r#"
            INSERT INTO comissoes (nome, descricao, area_atuacao, contato_responsavel, ativa)
            VALUES ($1, $2, $3, $4, COALESCE($5, TRUE))
            RETURNING *
            "#,
        )
        .bind(&nome)
        .bind(optional_text(input.descricao))
        .bind(optional_text(input.area_atuacao))
        .bind(optional_text(input.contato_responsavel))
        .bind(input.ativa)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Conflict(_) => ServiceError::Conflict(format!("Já existe uma comissão chamada '{}'", nome)),
            other => ServiceError::Database(other),
        })?;

        tracing::info!("Created comissao {} ({})", comissao.nome, comissao.id);
        Ok(comissao)
    }

    pub async fn update(&self, id: Uuid, patch: ComissaoPatch) -> Result<Comissao, ServiceError> {
        let nome = match patch.nome {
            Some(ref n) => Some(required("nome", Some(n), "Nome da comissão não pode ficar em branco")?),
            None => None,
        };

        sqlx::query_as::<_, Comissao>(
            r#"
            UPDATE comissoes SET
                nome = COALESCE($2, nome),
                descricao = COALESCE($3, descricao),
                area_atuacao = COALESCE($4, area_atuacao),
                contato_responsavel = COALESCE($5, contato_responsavel),
                ativa = COALESCE($6, ativa),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(patch.descricao)
        .bind(patch.area_atuacao)
        .bind(patch.contato_responsavel)
        .bind(patch.ativa)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Comissão {} não encontrada", id)))
    }

    /// Committees sharing at least one project with `id`
    pub async fn similar(&self, id: Uuid) -> Result<Vec<ComissaoSimilar>, ServiceError> {
        let reference = self.get(id).await?;

        let rows = sqlx::query_as::<_, SharedProjectsRow>(
            r#"
            SELECT c.id, c.nome, c.descricao, c.area_atuacao,
                   COUNT(DISTINCT outro.projeto_id) AS projetos_similares
            FROM projetos_comissoes base
            JOIN projetos_comissoes outro
              ON outro.projeto_id = base.projeto_id AND outro.comissao_id <> base.comissao_id
            JOIN comissoes c ON c.id = outro.comissao_id
            WHERE base.comissao_id = $1
            GROUP BY c.id, c.nome, c.descricao, c.area_atuacao
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut similares: Vec<ComissaoSimilar> = rows
            .into_iter()
            .map(|row| ComissaoSimilar {
                areas_comuns: common_areas(reference.area_atuacao.as_deref(), row.area_atuacao.as_deref()),
                comissao_similar_id: row.id,
                comissao_similar_nome: row.nome,
                comissao_similar_descricao: row.descricao,
                projetos_similares: row.projetos_similares,
            })
            .collect();

        sort_similares(&mut similares);
        Ok(similares)
    }
}

/// Areas present in both comma separated lists, compared case-insensitively,
/// in the order they appear on `reference`
pub fn common_areas(reference: Option<&str>, other: Option<&str>) -> Vec<String> {
    let other: Vec<String> = split_list(other.unwrap_or_default())
        .into_iter()
        .map(|a| a.to_lowercase())
        .collect();

    let mut common: Vec<String> = Vec::new();
    for area in split_list(reference.unwrap_or_default()) {
        let lowered = area.to_lowercase();
        if other.contains(&lowered) && !common.iter().any(|c| c.to_lowercase() == lowered) {
            common.push(area);
        }
    }
    common
}

fn sort_similares(similares: &mut [ComissaoSimilar]) {
    similares.sort_by(|a, b| {
        b.projetos_similares
            .cmp(&a.projetos_similares)
            .then_with(|| a.comissao_similar_nome.cmp(&b.comissao_similar_nome))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_areas_ignore_case_and_keep_reference_order() {
        let areas = common_areas(
            Some("Direito Digital, Tecnologia, Inovação"),
            Some("inovação,  tecnologia ,Saúde"),
        );
        assert_eq!(areas, vec!["Tecnologia".to_string(), "Inovação".to_string()]);
    }

    #[test]
    fn common_areas_handle_missing_lists() {
        assert!(common_areas(None, Some("Tecnologia")).is_empty());
        assert!(common_areas(Some("Tecnologia"), None).is_empty());
        assert!(common_areas(Some(" , "), Some(" , ")).is_empty());
    }

    #[test]
    fn similar_committees_sort_by_shared_projects_then_name() {
        let mk = |nome: &str, n: i64| ComissaoSimilar {
            comissao_similar_id: Uuid::new_v4(),
            comissao_similar_nome: nome.to_string(),
            comissao_similar_descricao: None,
            projetos_similares: n,
            areas_comuns: vec![],
        };
        let mut list = vec![mk("B", 1), mk("C", 3), mk("A", 1)];
        sort_similares(&mut list);
        let names: Vec<_> = list.iter().map(|c| c.comissao_similar_nome.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}
