use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{optional_text, required, ServiceError};
use crate::database::models::{Projeto, ProjetoComissaoRow};
use crate::database::DatabaseError;
use crate::types::{PapelComissao, ProjetoStatus};

/// Max rows returned by `integration_suggestions`
pub const MAX_SUGESTOES_INTEGRACAO: usize = 10;
/// Rows in the dashboard "recent projects" list
pub const PROJETOS_RECENTES: i64 = 5;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NovoProjeto {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub objetivos: Option<String>,
    pub resultados_esperados: Option<String>,
    pub publico_alvo: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim_prevista: Option<String>,
    pub status: Option<String>,
    /// Raw `VinculoComissao` objects. Kept loose so one malformed entry is
    /// reported and skipped instead of rejecting the whole request.
    #[serde(default)]
    pub comissoes: Vec<Value>,
    #[serde(default)]
    pub tags: Vec<Value>,
}

/// Requested committee association
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VinculoComissao {
    #[serde(default)]
    pub comissao_id: Value,
    pub papel_comissao: Option<String>,
}

/// Validated project columns ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct ProjetoInsert {
    pub nome: String,
    pub descricao: Option<String>,
    pub objetivos: Option<String>,
    pub resultados_esperados: Option<String>,
    pub publico_alvo: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub status: ProjetoStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Falha {
    pub etapa: &'static str,
    pub valor: String,
    pub motivo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatorioCriacao {
    pub comissoes_solicitadas: usize,
    pub comissoes_vinculadas: usize,
    pub tags_solicitadas: usize,
    pub tags_adicionadas: usize,
    pub falhas: Vec<Falha>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjetoCriado {
    pub projeto: Projeto,
    pub relatorio: RelatorioCriacao,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProjetoPatch {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub objetivos: Option<String>,
    pub resultados_esperados: Option<String>,
    pub publico_alvo: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim_prevista: Option<String>,
    pub data_fim_real: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProjetoFiltro {
    pub status: Option<String>,
    pub comissao_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComissaoResumo {
    pub id: Uuid,
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub papel: Option<String>,
}

/// A project with every committee it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjetoResumo {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub status: String,
    pub objetivos: Option<String>,
    pub publico_alvo: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub comissoes: Vec<ComissaoResumo>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComissaoDoProjeto {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub area_atuacao: Option<String>,
    pub papel: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjetoDetalhe {
    #[serde(flatten)]
    pub projeto: Projeto,
    pub comissoes: Vec<ComissaoDoProjeto>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SugestaoProjeto {
    pub projeto_similar_id: Uuid,
    pub projeto_similar_nome: String,
    pub projeto_similar_descricao: Option<String>,
    pub comissoes_comuns: i64,
    pub pontuacao_similaridade: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EstatisticasProjetos {
    pub total_projetos: i64,
    pub projetos_por_status: BTreeMap<String, i64>,
    pub projetos_recentes: Vec<Projeto>,
}

#[derive(Debug, FromRow)]
struct CandidatoRow {
    id: Uuid,
    nome: String,
    descricao: Option<String>,
    comissoes_comuns: i64,
    total_comissoes: i64,
}

/// Writes used by the multi-step project creation
#[async_trait]
pub trait ProjetoStore: Send + Sync {
    async fn insert_projeto(&self, projeto: &ProjetoInsert) -> Result<Projeto, ServiceError>;
    async fn link_comissao(&self, projeto_id: Uuid, comissao_id: Uuid, papel: PapelComissao) -> Result<(), ServiceError>;
    async fn add_tag(&self, projeto_id: Uuid, tag: &str) -> Result<(), ServiceError>;
}

pub struct PgProjetoStore {
    pool: PgPool,
}

#[async_trait]
impl ProjetoStore for PgProjetoStore {
    async fn insert_projeto(&self, projeto: &ProjetoInsert) -> Result<Projeto, ServiceError> {
        let row = sqlx::query_as::<_, Projeto>(
            r#"
            INSERT INTO projetos (nome, descricao, objetivos, resultados_esperados, publico_alvo,
                                  data_inicio, data_fim_prevista, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&projeto.nome)
        .bind(&projeto.descricao)
        .bind(&projeto.objetivos)
        .bind(&projeto.resultados_esperados)
        .bind(&projeto.publico_alvo)
        .bind(projeto.data_inicio)
        .bind(projeto.data_fim_prevista)
        .bind(projeto.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn link_comissao(&self, projeto_id: Uuid, comissao_id: Uuid, papel: PapelComissao) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO projetos_comissoes (projeto_id, comissao_id, papel_comissao) VALUES ($1, $2, $3)")
            .bind(projeto_id)
            .bind(comissao_id)
            .bind(papel.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_tag(&self, projeto_id: Uuid, tag: &str) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO tags_projetos (projeto_id, tag) VALUES ($1, $2)")
            .bind(projeto_id)
            .bind(tag)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct ProjetoService {
    pool: PgPool,
}

impl ProjetoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filtro: ProjetoFiltro) -> Result<Vec<ProjetoResumo>, ServiceError> {
        let status = filtro.status.as_deref().map(parse_status).transpose()?;

        let rows = sqlx::query_as::<_, ProjetoComissaoRow>(
            r#"
            SELECT * FROM view_projetos_comissoes
            WHERE ($1::text IS NULL OR projeto_status = $1)
              AND ($2::uuid IS NULL OR projeto_id IN (
                    SELECT projeto_id FROM projetos_comissoes WHERE comissao_id = $2))
            ORDER BY projeto_nome, comissao_nome
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(filtro.comissao_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_project_rows(rows))
    }

    pub async fn get(&self, id: Uuid) -> Result<ProjetoDetalhe, ServiceError> {
        let projeto = self.find(id).await?;

        let comissoes = sqlx::query_as::<_, ComissaoDoProjeto>(
            r#"
            SELECT c.id, c.nome, c.descricao, c.area_atuacao, pc.papel_comissao AS papel
            FROM projetos_comissoes pc
            JOIN comissoes c ON c.id = pc.comissao_id
            WHERE pc.projeto_id = $1
            ORDER BY c.nome
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_scalar::<_, String>("SELECT tag FROM tags_projetos WHERE projeto_id = $1 ORDER BY tag")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ProjetoDetalhe { projeto, comissoes, tags })
    }

    pub async fn create(&self, input: NovoProjeto) -> Result<ProjetoCriado, ServiceError> {
        let store = PgProjetoStore { pool: self.pool.clone() };
        create_with_links(&store, input).await
    }

    pub async fn update(&self, id: Uuid, patch: ProjetoPatch) -> Result<Projeto, ServiceError> {
        let nome = match patch.nome {
            Some(ref n) => Some(required("nome", Some(n), "Nome do projeto não pode ficar em branco")?),
            None => None,
        };
        let status = patch.status.as_deref().map(parse_status).transpose()?;

        sqlx::query_as::<_, Projeto>(
            r#"
            UPDATE projetos SET
                nome = COALESCE($2, nome),
                descricao = COALESCE($3, descricao),
                objetivos = COALESCE($4, objetivos),
                resultados_esperados = COALESCE($5, resultados_esperados),
                publico_alvo = COALESCE($6, publico_alvo),
                data_inicio = COALESCE($7, data_inicio),
                data_fim_prevista = COALESCE($8, data_fim_prevista),
                data_fim_real = COALESCE($9, data_fim_real),
                status = COALESCE($10, status),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(patch.descricao)
        .bind(patch.objetivos)
        .bind(patch.resultados_esperados)
        .bind(patch.publico_alvo)
        .bind(parse_date("data_inicio", patch.data_inicio)?)
        .bind(parse_date("data_fim_prevista", patch.data_fim_prevista)?)
        .bind(parse_date("data_fim_real", patch.data_fim_real)?)
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM projetos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        tracing::info!("Deleted projeto {}", id);
        Ok(())
    }

    /// Other projects sharing committees with `id`, ranked by Jaccard similarity
    pub async fn integration_suggestions(&self, id: Uuid) -> Result<Vec<SugestaoProjeto>, ServiceError> {
        self.find(id).await?;

        let proprias: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projetos_comissoes WHERE projeto_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        let candidatos = sqlx::query_as::<_, CandidatoRow>(
            r#"
            WITH alvo AS (SELECT comissao_id FROM projetos_comissoes WHERE projeto_id = $1)
            SELECT p.id, p.nome, p.descricao,
                   COUNT(*) FILTER (WHERE pc.comissao_id IN (SELECT comissao_id FROM alvo)) AS comissoes_comuns,
                   COUNT(*) AS total_comissoes
            FROM projetos p
            JOIN projetos_comissoes pc ON pc.projeto_id = p.id
            WHERE p.id <> $1
            GROUP BY p.id, p.nome, p.descricao
            HAVING COUNT(*) FILTER (WHERE pc.comissao_id IN (SELECT comissao_id FROM alvo)) > 0
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let sugestoes = candidatos
            .into_iter()
            .map(|c| SugestaoProjeto {
                pontuacao_similaridade: jaccard(c.comissoes_comuns, proprias, c.total_comissoes),
                projeto_similar_id: c.id,
                projeto_similar_nome: c.nome,
                projeto_similar_descricao: c.descricao,
                comissoes_comuns: c.comissoes_comuns,
            })
            .collect();

        Ok(rank_suggestions(sugestoes))
    }

    pub async fn stats(&self) -> Result<EstatisticasProjetos, ServiceError> {
        let (total, por_status, recentes) = futures::try_join!(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projetos").fetch_one(&self.pool),
            sqlx::query_as::<_, (String, i64)>("SELECT status, COUNT(*) FROM projetos GROUP BY status").fetch_all(&self.pool),
            sqlx::query_as::<_, Projeto>("SELECT * FROM projetos ORDER BY created_at DESC LIMIT $1")
                .bind(PROJETOS_RECENTES)
                .fetch_all(&self.pool),
        )?;

        let mut projetos_por_status: BTreeMap<String, i64> =
            ProjetoStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
        projetos_por_status.extend(por_status);

        Ok(EstatisticasProjetos { total_projetos: total, projetos_por_status, projetos_recentes: recentes })
    }

    async fn find(&self, id: Uuid) -> Result<Projeto, ServiceError> {
        sqlx::query_as::<_, Projeto>("SELECT * FROM projetos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Projeto {} não encontrado", id))
}

fn parse_status(raw: &str) -> Result<ProjetoStatus, ServiceError> {
    raw.parse::<ProjetoStatus>()
        .map_err(|e| ServiceError::validation("status", e.to_string()))
}

fn parse_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>, ServiceError> {
    match optional_text(raw) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ServiceError::validation(field, format!("Data inválida '{}' (use AAAA-MM-DD)", s))),
    }
}

/// Validate the request before anything is written
pub fn validate_new_project(input: &NovoProjeto) -> Result<ProjetoInsert, ServiceError> {
    let nome = required("nome", input.nome.as_deref(), "Nome do projeto é obrigatório")?;
    let status = match input.status.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => parse_status(s)?,
        _ => return Err(ServiceError::validation("status", "Status é obrigatório")),
    };
    if input.comissoes.is_empty() {
        return Err(ServiceError::validation("comissoes", "Selecione pelo menos uma comissão"));
    }

    Ok(ProjetoInsert {
        nome,
        descricao: optional_text(input.descricao.clone()),
        objetivos: optional_text(input.objetivos.clone()),
        resultados_esperados: optional_text(input.resultados_esperados.clone()),
        publico_alvo: optional_text(input.publico_alvo.clone()),
        data_inicio: parse_date("data_inicio", input.data_inicio.clone())?,
        data_fim_prevista: parse_date("data_fim_prevista", input.data_fim_prevista.clone())?,
        status,
    })
}

fn comissao_id_from(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s.trim()).ok())
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Insert the project, then each committee link, then each tag. A failing
/// link or tag is logged and reported but never undoes earlier writes.
pub async fn create_with_links<S: ProjetoStore + ?Sized>(
    store: &S,
    input: NovoProjeto,
) -> Result<ProjetoCriado, ServiceError> {
    let insert = validate_new_project(&input)?;
    let projeto = store.insert_projeto(&insert).await?;
    tracing::info!("Created projeto {} ({})", projeto.nome, projeto.id);

    let mut relatorio = RelatorioCriacao {
        comissoes_solicitadas: input.comissoes.len(),
        tags_solicitadas: input.tags.len(),
        ..Default::default()
    };

    for entrada in &input.comissoes {
        let vinculo = match serde_json::from_value::<VinculoComissao>(entrada.clone()) {
            Ok(vinculo) if entrada.is_object() => vinculo,
            _ => {
                tracing::error!("Skipping malformed comissao entry {} for projeto {}", entrada, projeto.id);
                relatorio.falhas.push(Falha {
                    etapa: "comissao",
                    valor: describe(entrada),
                    motivo: "Vínculo de comissão inválido".to_string(),
                });
                continue;
            }
        };
        let valor = describe(&vinculo.comissao_id);
        let Some(comissao_id) = comissao_id_from(&vinculo.comissao_id) else {
            tracing::error!("Skipping invalid comissao id '{}' for projeto {}", valor, projeto.id);
            relatorio.falhas.push(Falha { etapa: "comissao", valor, motivo: "ID de comissão inválido".to_string() });
            continue;
        };

        let papel = match optional_text(vinculo.papel_comissao.clone()) {
            None => PapelComissao::default(),
            Some(raw) => match raw.parse::<PapelComissao>() {
                Ok(papel) => papel,
                Err(e) => {
                    tracing::error!("Skipping comissao {} for projeto {}: {}", comissao_id, projeto.id, e);
                    relatorio.falhas.push(Falha { etapa: "comissao", valor, motivo: e.to_string() });
                    continue;
                }
            },
        };

        match store.link_comissao(projeto.id, comissao_id, papel).await {
            Ok(()) => relatorio.comissoes_vinculadas += 1,
            Err(e) => {
                tracing::error!("Failed to link comissao {} to projeto {}: {}", comissao_id, projeto.id, e);
                relatorio.falhas.push(Falha { etapa: "comissao", valor, motivo: motivo_vinculo(&e) });
            }
        }
    }

    if relatorio.comissoes_vinculadas == 0 && relatorio.comissoes_solicitadas > 0 {
        tracing::warn!(
            "Projeto {} was created without any comissao ({} requested)",
            projeto.id,
            relatorio.comissoes_solicitadas
        );
    }

    for tag in &input.tags {
        let Some(raw) = tag.as_str() else {
            tracing::warn!("Skipping non-text tag {} for projeto {}", tag, projeto.id);
            relatorio.falhas.push(Falha { etapa: "tag", valor: describe(tag), motivo: "Tag inválida".to_string() });
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            tracing::warn!("Skipping blank tag for projeto {}", projeto.id);
            relatorio.falhas.push(Falha { etapa: "tag", valor: raw.to_string(), motivo: "Tag em branco".to_string() });
            continue;
        }
        match store.add_tag(projeto.id, trimmed).await {
            Ok(()) => relatorio.tags_adicionadas += 1,
            Err(e) => {
                tracing::error!("Failed to add tag '{}' to projeto {}: {}", trimmed, projeto.id, e);
                relatorio.falhas.push(Falha { etapa: "tag", valor: trimmed.to_string(), motivo: motivo_tag(&e) });
            }
        }
    }

    Ok(ProjetoCriado { projeto, relatorio })
}

/// Client-facing reason for a failed committee link
fn motivo_vinculo(err: &ServiceError) -> String {
    match err {
        ServiceError::Database(DatabaseError::ForeignKey(_)) | ServiceError::NotFound(_) => {
            "Comissão não encontrada".to_string()
        }
        ServiceError::Database(DatabaseError::Conflict(_)) | ServiceError::Conflict(_) => {
            "Comissão já vinculada ao projeto".to_string()
        }
        _ => "Não foi possível vincular a comissão".to_string(),
    }
}

fn motivo_tag(err: &ServiceError) -> String {
    match err {
        ServiceError::Database(DatabaseError::Conflict(_)) | ServiceError::Conflict(_) => {
            "Tag já adicionada ao projeto".to_string()
        }
        _ => "Não foi possível adicionar a tag".to_string(),
    }
}

/// Collapse view rows into one summary per project, keeping first-seen order
pub fn group_project_rows(rows: Vec<ProjetoComissaoRow>) -> Vec<ProjetoResumo> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut projetos: Vec<ProjetoResumo> = Vec::new();

    for row in rows {
        let pos = *index.entry(row.projeto_id).or_insert_with(|| {
            projetos.push(ProjetoResumo {
                id: row.projeto_id,
                nome: row.projeto_nome.clone(),
                descricao: row.projeto_descricao.clone(),
                status: row.projeto_status.clone(),
                objetivos: row.objetivos.clone(),
                publico_alvo: row.publico_alvo.clone(),
                data_inicio: row.data_inicio,
                data_fim_prevista: row.data_fim_prevista,
                comissoes: vec![],
            });
            projetos.len() - 1
        });

        if let Some(comissao_id) = row.comissao_id {
            projetos[pos].comissoes.push(ComissaoResumo {
                id: comissao_id,
                nome: row.comissao_nome,
                descricao: row.comissao_descricao,
                papel: row.papel_comissao,
            });
        }
    }
    projetos
}

/// |A ∩ B| / |A ∪ B| given the intersection and both set sizes
pub fn jaccard(shared: i64, a: i64, b: i64) -> f64 {
    let union = a + b - shared;
    if union <= 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}

fn rank_suggestions(mut sugestoes: Vec<SugestaoProjeto>) -> Vec<SugestaoProjeto> {
    sugestoes.sort_by(|a, b| {
        b.pontuacao_similaridade
            .total_cmp(&a.pontuacao_similaridade)
            .then_with(|| b.comissoes_comuns.cmp(&a.comissoes_comuns))
            .then_with(|| a.projeto_similar_nome.cmp(&b.projeto_similar_nome))
    });
    sugestoes.truncate(MAX_SUGESTOES_INTEGRACAO);
    sugestoes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProjetoStore;
    use serde_json::json;

    fn row(projeto: Uuid, nome: &str, comissao: Option<(Uuid, &str)>) -> ProjetoComissaoRow {
        ProjetoComissaoRow {
            projeto_id: projeto,
            projeto_nome: nome.to_string(),
            projeto_descricao: None,
            projeto_status: "planejamento".to_string(),
            objetivos: None,
            publico_alvo: None,
            data_inicio: None,
            data_fim_prevista: None,
            comissao_id: comissao.map(|c| c.0),
            comissao_nome: comissao.map(|c| c.1.to_string()),
            comissao_descricao: None,
            area_atuacao: None,
            papel_comissao: comissao.map(|_| "lider".to_string()),
        }
    }

    fn novo(comissoes: Vec<Value>, tags: Vec<&str>) -> NovoProjeto {
        NovoProjeto {
            nome: Some("Portal da Transparência".to_string()),
            status: Some("planejamento".to_string()),
            comissoes: comissoes.into_iter().map(|id| json!({ "comissao_id": id })).collect(),
            tags: tags.into_iter().map(|t| json!(t)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn groups_rows_per_project_in_first_seen_order() {
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());
        let grouped = group_project_rows(vec![
            row(p1, "Alpha", Some((c1, "CAD"))),
            row(p1, "Alpha", Some((c2, "CDD"))),
            row(p2, "Beta", None),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].id, p1);
        assert_eq!(grouped[0].comissoes.len(), 2);
        assert_eq!(grouped[0].comissoes[1].nome.as_deref(), Some("CDD"));
        assert_eq!(grouped[1].id, p2);
        assert!(grouped[1].comissoes.is_empty());
    }

    #[test]
    fn jaccard_scores() {
        assert_eq!(jaccard(2, 2, 2), 1.0);
        assert_eq!(jaccard(1, 2, 3), 0.25);
        assert_eq!(jaccard(0, 0, 0), 0.0);
    }

    #[test]
    fn ranks_and_truncates_suggestions() {
        let mk = |nome: &str, comuns: i64, score: f64| SugestaoProjeto {
            projeto_similar_id: Uuid::new_v4(),
            projeto_similar_nome: nome.to_string(),
            projeto_similar_descricao: None,
            comissoes_comuns: comuns,
            pontuacao_similaridade: score,
        };
        let mut input: Vec<_> = (0..12).map(|i| mk(&format!("P{:02}", i), 1, 0.1)).collect();
        input.push(mk("Top", 2, 0.9));
        input.push(mk("Tie-more-shared", 3, 0.5));
        input.push(mk("Tie", 1, 0.5));
        let ranked = rank_suggestions(input);
        assert_eq!(ranked.len(), MAX_SUGESTOES_INTEGRACAO);
        assert_eq!(ranked[0].projeto_similar_nome, "Top");
        assert_eq!(ranked[1].projeto_similar_nome, "Tie-more-shared");
        assert_eq!(ranked[2].projeto_similar_nome, "Tie");
        assert_eq!(ranked[3].projeto_similar_nome, "P00");
    }

    #[test]
    fn validation_rejects_before_any_write() {
        let mut input = novo(vec![json!(Uuid::new_v4().to_string())], vec![]);
        input.status = Some("arquivado".into());
        assert!(matches!(validate_new_project(&input), Err(ServiceError::Validation { .. })));

        let input = novo(vec![], vec![]);
        let err = validate_new_project(&input).unwrap_err();
        match err {
            ServiceError::Validation { field_errors, .. } => assert!(field_errors.contains_key("comissoes")),
            other => panic!("unexpected {:?}", other),
        }

        let mut input = novo(vec![json!(Uuid::new_v4().to_string())], vec![]);
        input.nome = Some("   ".into());
        assert!(validate_new_project(&input).is_err());

        let mut input = novo(vec![json!(Uuid::new_v4().to_string())], vec![]);
        input.data_inicio = Some("01/02/2024".into());
        assert!(validate_new_project(&input).is_err());
    }

    #[tokio::test]
    async fn invalid_input_writes_nothing() {
        let store = FakeProjetoStore::default();
        let result = create_with_links(&store, novo(vec![], vec!["x"])).await;
        assert!(result.is_err());
        assert!(store.projetos().is_empty());
    }

    #[tokio::test]
    async fn partial_failures_are_reported_and_skipped() {
        let ok = Uuid::new_v4();
        let rejected = Uuid::new_v4();
        let store = FakeProjetoStore::default().reject_comissao(rejected).reject_tag("duplicada");

        let input = novo(
            vec![json!(ok.to_string()), json!("not-a-uuid"), json!(rejected.to_string()), json!(42)],
            vec!["lgpd", "  ", "duplicada", "ia"],
        );
        let criado = create_with_links(&store, input).await.unwrap();
        let r = &criado.relatorio;

        assert_eq!(r.comissoes_solicitadas, 4);
        assert_eq!(r.comissoes_vinculadas, 1);
        assert_eq!(r.tags_solicitadas, 4);
        assert_eq!(r.tags_adicionadas, 2);
        assert_eq!(r.falhas.len(), 5);
        assert_eq!(r.falhas[0].valor, "not-a-uuid");
        assert_eq!(r.falhas[1].motivo, "Comissão não encontrada");
        assert_eq!(r.falhas[2].valor, "42");
        assert_eq!(r.falhas[4].motivo, "Tag já adicionada ao projeto");

        assert_eq!(store.projetos().len(), 1);
        assert_eq!(store.links(), vec![(criado.projeto.id, ok, PapelComissao::Participante)]);
        assert_eq!(store.tags(), vec![(criado.projeto.id, "lgpd".to_string()), (criado.projeto.id, "ia".to_string())]);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped_not_fatal() {
        let ok = Uuid::new_v4();
        let store = FakeProjetoStore::default();
        let input: NovoProjeto = serde_json::from_value(json!({
            "nome": "Observatório",
            "status": "planejamento",
            "comissoes": [
                { "comissao_id": ok.to_string() },
                ok.to_string(),
                { "comissao_id": ok.to_string(), "papel_comissao": 3 }
            ],
            "tags": ["ia", 7, null],
        }))
        .unwrap();

        let criado = create_with_links(&store, input).await.unwrap();
        let r = &criado.relatorio;
        assert_eq!(r.comissoes_vinculadas, 1);
        assert_eq!(r.tags_adicionadas, 1);
        assert_eq!(r.falhas.len(), 4);
        assert_eq!(r.falhas[0].motivo, "Vínculo de comissão inválido");
        assert_eq!(r.falhas[0].valor, ok.to_string());
        assert_eq!(r.falhas[2], Falha { etapa: "tag", valor: "7".into(), motivo: "Tag inválida".into() });
        assert_eq!(store.tags(), vec![(criado.projeto.id, "ia".to_string())]);
    }

    #[tokio::test]
    async fn project_survives_when_no_committee_links() {
        let store = FakeProjetoStore::default();
        let criado = create_with_links(&store, novo(vec![json!("bad")], vec![])).await.unwrap();
        assert_eq!(criado.relatorio.comissoes_vinculadas, 0);
        assert_eq!(store.projetos().len(), 1);
    }

    #[tokio::test]
    async fn explicit_role_and_unknown_role() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = FakeProjetoStore::default();
        let mut input = novo(vec![], vec![]);
        input.comissoes = vec![
            json!({ "comissao_id": a.to_string(), "papel_comissao": "LIDER" }),
            json!({ "comissao_id": b.to_string(), "papel_comissao": "chefe" }),
        ];
        let criado = create_with_links(&store, input).await.unwrap();
        assert_eq!(criado.relatorio.comissoes_vinculadas, 1);
        assert_eq!(store.links()[0].2, PapelComissao::Lider);
        assert_eq!(criado.relatorio.falhas[0].etapa, "comissao");
    }

    #[tokio::test]
    async fn failed_project_insert_stops_everything() {
        let store = FakeProjetoStore::default().fail_insert();
        let result = create_with_links(&store, novo(vec![json!(Uuid::new_v4().to_string())], vec!["ia"])).await;
        assert!(result.is_err());
        assert!(store.links().is_empty());
        assert!(store.tags().is_empty());
    }
}
