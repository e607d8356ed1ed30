use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Projeto {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub objetivos: Option<String>,
    pub resultados_esperados: Option<String>,
    pub publico_alvo: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub data_fim_real: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `view_projetos_comissoes`. Committee columns are null for
/// projects without any committee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjetoComissaoRow {
    pub projeto_id: Uuid,
    pub projeto_nome: String,
    pub projeto_descricao: Option<String>,
    pub projeto_status: String,
    pub objetivos: Option<String>,
    pub publico_alvo: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub comissao_id: Option<Uuid>,
    pub comissao_nome: Option<String>,
    pub comissao_descricao: Option<String>,
    pub area_atuacao: Option<String>,
    pub papel_comissao: Option<String>,
}
