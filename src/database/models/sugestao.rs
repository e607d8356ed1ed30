use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SugestaoIntegracao {
    pub id: Uuid,
    pub nome: String,
    pub descricao: String,
    pub tipo: String,
    pub area_aplicacao: String,
    pub detalhes_tecnicos: Option<String>,
    pub url_documentacao: Option<String>,
    pub beneficios: Option<String>,
    pub nivel_complexidade: String,
    pub custo_estimado: Option<String>,
    pub tempo_implementacao: Option<String>,
    pub pre_requisitos: Option<String>,
    pub compativel_com: Vec<String>,
    pub tags: Vec<String>,
    pub ativa: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
