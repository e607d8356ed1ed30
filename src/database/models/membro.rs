use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membro {
    pub id: Uuid,
    pub comissao_id: Uuid,
    pub nome: String,
    pub cargo: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub inscricao_oab: Option<String>,
    pub ativo: bool,
    pub data_ingresso: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `view_membros_comissoes`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MembroComissaoRow {
    pub membro_id: Uuid,
    pub membro_nome: String,
    pub cargo: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub inscricao_oab: Option<String>,
    pub ativo: bool,
    pub data_ingresso: Option<NaiveDate>,
    pub comissao_id: Uuid,
    pub comissao_nome: String,
    pub comissao_descricao: Option<String>,
    pub area_atuacao: Option<String>,
}
