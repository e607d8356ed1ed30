use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account row. Credential and recovery columns never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: Uuid,
    pub nome_usuario: String,
    pub nome_completo: Option<String>,
    pub email: Option<String>,
    pub comissao_id: Option<Uuid>,
    #[serde(skip_serializing, default)]
    pub senha_hash: String,
    #[serde(skip_serializing, default)]
    pub senha_salt: String,
    pub primeiro_acesso: bool,
    #[serde(skip_serializing, default)]
    pub token_recuperacao: Option<String>,
    #[serde(skip_serializing, default)]
    pub token_expira: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_serialize() {
        let now = Utc::now();
        let usuario = Usuario {
            id: Uuid::new_v4(),
            nome_usuario: "comissaoteste".into(),
            nome_completo: None,
            email: Some("a@b.c".into()),
            comissao_id: None,
            senha_hash: "hash".into(),
            senha_salt: "salt".into(),
            primeiro_acesso: true,
            token_recuperacao: Some("token".into()),
            token_expira: Some(now),
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&usuario).unwrap();
        for field in ["senha_hash", "senha_salt", "token_recuperacao", "token_expira"] {
            assert!(value.get(field).is_none(), "{} leaked", field);
        }
        assert_eq!(value["nome_usuario"], "comissaoteste");
    }
}
