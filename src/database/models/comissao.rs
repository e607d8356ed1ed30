use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comissao {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    /// Comma separated list of practice areas
    pub area_atuacao: Option<String>,
    pub contato_responsavel: Option<String>,
    pub ativa: bool,
    pub data_criacao: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
