use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::busca_service::escape_like;
use super::{optional_text, ServiceError};
use crate::database::models::SugestaoIntegracao;
use crate::database::{DatabaseError, Repository};
use crate::filter::FilterData;
use crate::types::{clean_list, NivelComplexidade, TipoIntegracao};

const TABLE: &str = "sugestoes_integracao";

/// Columns a listing may be ordered by
pub const ORDERABLE_COLUMNS: &[&str] = &["nome", "tipo", "area_aplicacao", "nivel_complexidade", "created_at", "updated_at"];

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SugestaoFiltro {
    pub tipo: Option<String>,
    pub nivel_complexidade: Option<String>,
    pub area_aplicacao: Option<String>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub ascending: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NovaSugestao {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub tipo: Option<String>,
    pub area_aplicacao: Option<String>,
    pub detalhes_tecnicos: Option<String>,
    pub url_documentacao: Option<String>,
    pub beneficios: Option<String>,
    pub nivel_complexidade: Option<String>,
    pub custo_estimado: Option<String>,
    pub tempo_implementacao: Option<String>,
    pub pre_requisitos: Option<String>,
    #[serde(default)]
    pub compativel_com: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SugestaoPatch {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub tipo: Option<String>,
    pub area_aplicacao: Option<String>,
    pub detalhes_tecnicos: Option<String>,
    pub url_documentacao: Option<String>,
    pub beneficios: Option<String>,
    pub nivel_complexidade: Option<String>,
    pub custo_estimado: Option<String>,
    pub tempo_implementacao: Option<String>,
    pub pre_requisitos: Option<String>,
    pub compativel_com: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub ativa: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EstatisticasSugestoes {
    pub por_tipo: BTreeMap<String, i64>,
    pub por_complexidade: BTreeMap<String, i64>,
}

/// Collects per-field validation messages before failing once
#[derive(Default)]
struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    fn require(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.0.insert(field.to_string(), message.to_string());
                None
            }
        }
    }

    fn parse<T: std::str::FromStr>(&mut self, field: &str, value: Option<&str>) -> Option<T>
    where
        T::Err: std::fmt::Display,
    {
        match value?.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.0.insert(field.to_string(), e.to_string());
                None
            }
        }
    }

    fn finish(self) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(ServiceError::Validation {
            message: "Dados da sugestão inválidos".to_string(),
            field_errors: self.0,
        })
    }
}

pub struct SugestaoService {
    pool: PgPool,
    repository: Repository<SugestaoIntegracao>,
}

impl SugestaoService {
    pub fn new(pool: PgPool, max_limit: Option<i32>) -> Self {
        let repository = Repository::new(TABLE, pool.clone()).with_max_limit(max_limit);
        Self { pool, repository }
    }

    pub async fn list(&self, filtro: &SugestaoFiltro) -> Result<Vec<SugestaoIntegracao>, ServiceError> {
        Ok(self.repository.select_any(build_list_filter(filtro)?).await?)
    }

    /// Active suggestions compatible with any of `sistemas`
    pub async fn by_compatibility(&self, sistemas: Vec<String>) -> Result<Vec<SugestaoIntegracao>, ServiceError> {
        match overlap_filter("compativel_com", sistemas) {
            Some(filter) => Ok(self.repository.select_any(filter).await?),
            None => Ok(vec![]),
        }
    }

    /// Active suggestions carrying any of `tags`
    pub async fn by_tags(&self, tags: Vec<String>) -> Result<Vec<SugestaoIntegracao>, ServiceError> {
        match overlap_filter("tags", tags) {
            Some(filter) => Ok(self.repository.select_any(filter).await?),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<SugestaoIntegracao, ServiceError> {
        self.repository.select_by_id(id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => not_found(id),
            other => other.into(),
        })
    }

    pub async fn create(&self, input: NovaSugestao) -> Result<SugestaoIntegracao, ServiceError> {
        let mut errors = FieldErrors::default();
        let nome = errors.require("nome", input.nome.as_deref(), "Nome é obrigatório");
        let descricao = errors.require("descricao", input.descricao.as_deref(), "Descrição é obrigatória");
        let area = errors.require("area_aplicacao", input.area_aplicacao.as_deref(), "Área de aplicação é obrigatória");
        let tipo = match input.tipo.as_deref() {
            None => {
                errors.0.insert("tipo".to_string(), "Tipo é obrigatório".to_string());
                None
            }
            Some(raw) => errors.parse::<TipoIntegracao>("tipo", Some(raw)),
        };
        let nivel = match optional_text(input.nivel_complexidade) {
            None => Some(NivelComplexidade::Media),
            Some(raw) => errors.parse::<NivelComplexidade>("nivel_complexidade", Some(&raw)),
        };
        errors.finish()?;

        let (Some(nome), Some(descricao), Some(area), Some(tipo), Some(nivel)) = (nome, descricao, area, tipo, nivel) else {
            return Err(ServiceError::validation("sugestao", "Dados da sugestão inválidos"));
        };

        let row = sqlx::query_as::<_, SugestaoIntegracao>(
            r#"
            INSERT INTO sugestoes_integracao
                (nome, descricao, tipo, area_aplicacao, detalhes_tecnicos, url_documentacao, beneficios,
                 nivel_complexidade, custo_estimado, tempo_implementacao, pre_requisitos, compativel_com, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(nome)
        .bind(descricao)
        .bind(tipo.as_str())
        .bind(area)
        .bind(optional_text(input.detalhes_tecnicos))
        .bind(optional_text(input.url_documentacao))
        .bind(optional_text(input.beneficios))
        .bind(nivel.as_str())
        .bind(optional_text(input.custo_estimado))
        .bind(optional_text(input.tempo_implementacao))
        .bind(optional_text(input.pre_requisitos))
        .bind(clean_list(input.compativel_com))
        .bind(clean_list(input.tags))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created sugestao de integracao {} ({})", row.nome, row.id);
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, patch: SugestaoPatch) -> Result<SugestaoIntegracao, ServiceError> {
        let mut errors = FieldErrors::default();
        let nome = patch.nome.as_deref().and_then(|v| errors.require("nome", Some(v), "Nome não pode ficar em branco"));
        let descricao = patch
            .descricao
            .as_deref()
            .and_then(|v| errors.require("descricao", Some(v), "Descrição não pode ficar em branco"));
        let area = patch
            .area_aplicacao
            .as_deref()
            .and_then(|v| errors.require("area_aplicacao", Some(v), "Área de aplicação não pode ficar em branco"));
        let tipo = errors.parse::<TipoIntegracao>("tipo", patch.tipo.as_deref());
        let nivel = errors.parse::<NivelComplexidade>("nivel_complexidade", patch.nivel_complexidade.as_deref());
        errors.finish()?;

        sqlx::query_as::<_, SugestaoIntegracao>(
            r#"
            UPDATE sugestoes_integracao SET
                nome = COALESCE($2, nome),
                descricao = COALESCE($3, descricao),
                tipo = COALESCE($4, tipo),
                area_aplicacao = COALESCE($5, area_aplicacao),
                detalhes_tecnicos = COALESCE($6, detalhes_tecnicos),
                url_documentacao = COALESCE($7, url_documentacao),
                beneficios = COALESCE($8, beneficios),
                nivel_complexidade = COALESCE($9, nivel_complexidade),
                custo_estimado = COALESCE($10, custo_estimado),
                tempo_implementacao = COALESCE($11, tempo_implementacao),
                pre_requisitos = COALESCE($12, pre_requisitos),
                compativel_com = COALESCE($13, compativel_com),
                tags = COALESCE($14, tags),
                ativa = COALESCE($15, ativa),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(descricao)
        .bind(tipo.map(|t| t.as_str()))
        .bind(area)
        .bind(patch.detalhes_tecnicos)
        .bind(patch.url_documentacao)
        .bind(patch.beneficios)
        .bind(nivel.map(|n| n.as_str()))
        .bind(patch.custo_estimado)
        .bind(patch.tempo_implementacao)
        .bind(patch.pre_requisitos)
        .bind(patch.compativel_com.map(clean_list))
        .bind(patch.tags.map(clean_list))
        .bind(patch.ativa)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Soft removal: the row stays, flagged inactive
    pub async fn deactivate(&self, id: Uuid) -> Result<SugestaoIntegracao, ServiceError> {
        let row = sqlx::query_as::<_, SugestaoIntegracao>(
            "UPDATE sugestoes_integracao SET ativa = FALSE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))?;
        tracing::info!("Deactivated sugestao de integracao {}", id);
        Ok(row)
    }

    pub async fn stats(&self) -> Result<EstatisticasSugestoes, ServiceError> {
        let (tipos, niveis) = futures::try_join!(
            sqlx::query_as::<_, (String, i64)>(
                "SELECT tipo, COUNT(*) FROM sugestoes_integracao WHERE ativa GROUP BY tipo"
            )
            .fetch_all(&self.pool),
            sqlx::query_as::<_, (String, i64)>(
                "SELECT nivel_complexidade, COUNT(*) FROM sugestoes_integracao WHERE ativa GROUP BY nivel_complexidade"
            )
            .fetch_all(&self.pool),
        )?;

        let mut por_tipo: BTreeMap<String, i64> =
            TipoIntegracao::ALL.iter().map(|t| (t.as_str().to_string(), 0)).collect();
        por_tipo.extend(tipos);
        let mut por_complexidade: BTreeMap<String, i64> =
            NivelComplexidade::ALL.iter().map(|n| (n.as_str().to_string(), 0)).collect();
        por_complexidade.extend(niveis);

        Ok(EstatisticasSugestoes { por_tipo, por_complexidade })
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Sugestão {} não encontrada", id))
}

/// Translate listing options into a filter over active suggestions
pub fn build_list_filter(filtro: &SugestaoFiltro) -> Result<FilterData, ServiceError> {
    let mut conditions = Map::new();
    conditions.insert("ativa".to_string(), json!(true));

    if let Some(tipo) = optional_text(filtro.tipo.clone()) {
        let tipo: TipoIntegracao = tipo.parse().map_err(|e: crate::types::UnknownVariant| ServiceError::validation("tipo", e.to_string()))?;
        conditions.insert("tipo".to_string(), json!(tipo.as_str()));
    }
    if let Some(nivel) = optional_text(filtro.nivel_complexidade.clone()) {
        let nivel: NivelComplexidade = nivel
            .parse()
            .map_err(|e: crate::types::UnknownVariant| ServiceError::validation("nivel_complexidade", e.to_string()))?;
        conditions.insert("nivel_complexidade".to_string(), json!(nivel.as_str()));
    }
    if let Some(area) = optional_text(filtro.area_aplicacao.clone()) {
        conditions.insert("area_aplicacao".to_string(), json!({ "$ilike": format!("%{}%", escape_like(&area)) }));
    }
    if let Some(search) = optional_text(filtro.search.clone()) {
        let pattern = format!("%{}%", escape_like(&search));
        conditions.insert(
            "$or".to_string(),
            json!([{ "nome": { "$ilike": pattern } }, { "descricao": { "$ilike": pattern } }]),
        );
    }

    let order = match optional_text(filtro.order_by.clone()) {
        Some(column) => {
            if !ORDERABLE_COLUMNS.contains(&column.as_str()) {
                return Err(ServiceError::validation(
                    "order_by",
                    format!("Não é possível ordenar por '{}'", column),
                ));
            }
            let direction = if filtro.ascending.unwrap_or(true) { "asc" } else { "desc" };
            format!("{} {}", column, direction)
        }
        None => "created_at desc".to_string(),
    };

    Ok(FilterData {
        where_clause: Some(Value::Object(conditions)),
        order: Some(json!(order)),
        ..Default::default()
    })
}

/// Filter for active rows whose array `column` shares an element with `values`.
/// `None` when no usable values remain.
pub fn overlap_filter(column: &str, values: Vec<String>) -> Option<FilterData> {
    let values = clean_list(values);
    if values.is_empty() {
        return None;
    }
    let mut conditions = Map::new();
    conditions.insert("ativa".to_string(), json!(true));
    conditions.insert(column.to_string(), json!({ "$any": values }));
    Some(FilterData {
        where_clause: Some(Value::Object(conditions)),
        order: Some(json!("nome asc")),
        ..Default::default()
    })
}
