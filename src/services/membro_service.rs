use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{optional_text, required, ServiceError};
use crate::database::models::{Membro, MembroComissaoRow};
use crate::database::DatabaseError;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NovoMembro {
    pub comissao_id: Option<Uuid>,
    pub nome: Option<String>,
    pub cargo: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub inscricao_oab: Option<String>,
    pub ativo: Option<bool>,
}

pub struct MembroService {
    pool: PgPool,
}

impl MembroService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, comissao_id: Option<Uuid>) -> Result<Vec<MembroComissaoRow>, ServiceError> {
        let rows = sqlx::query_as::<_, MembroComissaoRow>(
            r#"
            SELECT * FROM view_membros_comissoes
            WHERE ($1::uuid IS NULL OR comissao_id = $1)
            ORDER BY comissao_nome, membro_nome
            "#,
        )
        .bind(comissao_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn add(&self, input: NovoMembro) -> Result<Membro, ServiceError> {
        let comissao_id = input
            .comissao_id
            .ok_or_else(|| ServiceError::validation("comissao_id", "Selecione a comissão do membro"))?;
        let nome = required("nome", input.nome.as_deref(), "Nome do membro é obrigatório")?;

        let membro = sqlx::query_as::<_, Membro>(
            r#"
            INSERT INTO membros_comissoes (comissao_id, nome, cargo, email, telefone, inscricao_oab, ativo)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, TRUE))
            RETURNING *
            "#,
        )
        .bind(comissao_id)
        .bind(&nome)
        .bind(optional_text(input.cargo))
        .bind(optional_text(input.email))
        .bind(optional_text(input.telefone))
        .bind(optional_text(input.inscricao_oab))
        .bind(input.ativo)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::ForeignKey(_) => ServiceError::NotFound(format!("Comissão {} não encontrada", comissao_id)),
            other => ServiceError::Database(other),
        })?;

        tracing::info!("Added membro {} to comissao {}", membro.id, comissao_id);
        Ok(membro)
    }
}
