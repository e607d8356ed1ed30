use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{optional_text, required, ServiceError};
use crate::auth::{self, Claims};
use crate::config::{AppConfig, AuthConfig};
use crate::database::models::Usuario;
use crate::database::DatabaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub nome_usuario: String,
    pub senha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CadastroRequest {
    pub comissao_id: Option<Uuid>,
    pub nome_completo: Option<String>,
    pub email: Option<String>,
}

/// Issued session: a signed token plus the public user fields
#[derive(Debug, Clone, Serialize)]
pub struct Sessao {
    pub token: String,
    pub expires_in: u64,
    pub require_password_change: bool,
    pub usuario: Usuario,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecuperacaoSolicitada {
    pub message: String,
    pub expira_em: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsuarioCadastrado {
    pub usuario: Usuario,
    pub nome_usuario: String,
    pub message: String,
}

pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    jwt_expiry_hours: u64,
    settings: AuthConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            pool,
            jwt_secret: config.security.jwt_secret.clone(),
            jwt_expiry_hours: config.security.jwt_expiry_hours,
            settings: config.auth.clone(),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Sessao, ServiceError> {
        let nome_usuario = request.nome_usuario.trim();
        let usuario = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE nome_usuario = $1")
            .bind(nome_usuario)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Login rejected: unknown user '{}'", nome_usuario);
                invalid_credentials()
            })?;

        let require_change = check_credentials(&usuario, &request.senha, &self.settings.default_password)?;
        tracing::info!("User {} logged in (password change required: {})", usuario.nome_usuario, require_change);
        self.issue_session(usuario, require_change)
    }

    pub async fn whoami(&self, user_id: Uuid) -> Result<Usuario, ServiceError> {
        self.find_by_id(user_id).await
    }

    pub async fn change_password(&self, user_id: Uuid, nova_senha: &str) -> Result<Sessao, ServiceError> {
        validate_new_password(nova_senha, self.settings.min_password_length)?;

        let salt = auth::new_salt();
        let hash = auth::hash_password(nova_senha, &salt);
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            UPDATE usuarios SET
                senha_hash = $2,
                senha_salt = $3,
                primeiro_acesso = FALSE,
                token_recuperacao = NULL,
                token_expira = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(hash)
        .bind(salt)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Usuário não encontrado".to_string()))?;

        tracing::info!("Password changed for {}", usuario.nome_usuario);
        self.issue_session(usuario, false)
    }

    pub async fn request_recovery(&self, email: &str) -> Result<RecuperacaoSolicitada, ServiceError> {
        let email = required("email", Some(email), "Informe o email cadastrado")?;
        let token = Uuid::new_v4().simple().to_string();
        let expira_em = Utc::now() + Duration::hours(self.settings.recovery_token_hours);

        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            UPDATE usuarios SET
                token_recuperacao = $2,
                token_expira = $3,
                primeiro_acesso = TRUE,
                updated_at = now()
            WHERE id = (SELECT id FROM usuarios WHERE lower(email) = lower($1) LIMIT 1)
            RETURNING *
            "#,
        )
        .bind(&email)
        .bind(&token)
        .bind(expira_em)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Email não encontrado".to_string()))?;

        tracing::info!("Recovery token issued for {} (expires {})", usuario.nome_usuario, expira_em);
        Ok(RecuperacaoSolicitada {
            message: "Um link de recuperação foi enviado para seu email".to_string(),
            expira_em,
            token: self.settings.expose_recovery_token.then_some(token),
        })
    }

    pub async fn verify_recovery_token(&self, token: &str) -> Result<Sessao, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::Unauthorized("Token inválido".to_string()));
        }

        let usuario = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE token_recuperacao = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Token inválido".to_string()))?;

        if token_expired(usuario.token_expira, Utc::now()) {
            tracing::debug!("Expired recovery token for {}", usuario.nome_usuario);
            return Err(ServiceError::Unauthorized("Token expirado".to_string()));
        }

        self.issue_session(usuario, true)
    }

    pub async fn register(&self, request: CadastroRequest) -> Result<UsuarioCadastrado, ServiceError> {
        let comissao_id = request
            .comissao_id
            .ok_or_else(|| ServiceError::validation("comissao_id", "Selecione a comissão"))?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios WHERE comissao_id = $1")
            .bind(comissao_id)
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict("Esta comissão já possui um usuário vinculado".to_string()));
        }

        let comissao_nome: String = sqlx::query_scalar("SELECT nome FROM comissoes WHERE id = $1")
            .bind(comissao_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comissão não encontrada".to_string()))?;

        let nome_usuario = auth::username_from_committee(&comissao_nome);
        if nome_usuario.is_empty() {
            return Err(ServiceError::validation(
                "comissao_id",
                "Não foi possível gerar um nome de usuário para esta comissão",
            ));
        }

        let salt = auth::new_salt();
        let hash = auth::hash_password(&self.settings.default_password, &salt);
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            INSERT INTO usuarios (nome_usuario, nome_completo, email, comissao_id, senha_hash, senha_salt, primeiro_acesso)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(&nome_usuario)
        .bind(optional_text(request.nome_completo))
        .bind(optional_text(request.email))
        .bind(comissao_id)
        .bind(hash)
        .bind(salt)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| registration_error(DatabaseError::from(e), &nome_usuario))?;

        tracing::info!("Registered user {} for comissao {}", nome_usuario, comissao_id);
        Ok(UsuarioCadastrado {
            message: format!("Usuário criado com sucesso! Nome de usuário: {}", nome_usuario),
            nome_usuario,
            usuario,
        })
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Usuario, ServiceError> {
        sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Usuário não encontrado".to_string()))
    }

    fn issue_session(&self, usuario: Usuario, require_password_change: bool) -> Result<Sessao, ServiceError> {
        let claims = Claims::new(
            usuario.id,
            usuario.nome_usuario.clone(),
            usuario.comissao_id,
            require_password_change,
            self.jwt_expiry_hours,
        );
        let token = auth::encode_token(&claims, &self.jwt_secret)?;
        Ok(Sessao {
            token,
            expires_in: self.jwt_expiry_hours * 3600,
            require_password_change,
            usuario,
        })
    }
}

/// Unique constraint on `usuarios.comissao_id`
const COMISSAO_UNICA: &str = "usuarios_comissao_id_key";

fn registration_error(err: DatabaseError, nome_usuario: &str) -> ServiceError {
    match err {
        DatabaseError::Conflict(constraint) if constraint == COMISSAO_UNICA => {
            ServiceError::Conflict("Esta comissão já possui um usuário vinculado".to_string())
        }
        DatabaseError::Conflict(_) => ServiceError::Conflict(format!("Nome de usuário '{}' já existe", nome_usuario)),
        DatabaseError::ForeignKey(_) => ServiceError::NotFound("Comissão não encontrada".to_string()),
        other => ServiceError::Database(other),
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Usuário ou senha inválidos".to_string())
}

/// Decide a login attempt. `Ok(true)` means the session must change password.
pub fn check_credentials(usuario: &Usuario, senha: &str, default_password: &str) -> Result<bool, ServiceError> {
    if usuario.primeiro_acesso {
        if senha == default_password {
            return Ok(true);
        }
        tracing::debug!("Login rejected: {} has not set a password yet", usuario.nome_usuario);
        return Err(invalid_credentials());
    }

    if auth::verify_password(senha, &usuario.senha_salt, &usuario.senha_hash) {
        Ok(false)
    } else {
        tracing::debug!("Login rejected: wrong password for {}", usuario.nome_usuario);
        Err(invalid_credentials())
    }
}

pub fn validate_new_password(senha: &str, min_length: usize) -> Result<(), ServiceError> {
    if senha.chars().count() < min_length {
        return Err(ServiceError::validation(
            "nova_senha",
            format!("A senha deve ter pelo menos {} caracteres", min_length),
        ));
    }
    Ok(())
}

/// A missing expiry counts as expired
pub fn token_expired(expira: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expira.map_or(true, |e| e < now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario(primeiro_acesso: bool, senha: &str) -> Usuario {
        let salt = auth::new_salt();
        let now = Utc::now();
        Usuario {
            id: Uuid::new_v4(),
            nome_usuario: "comissaodedireitodigital".into(),
            nome_completo: None,
            email: None,
            comissao_id: None,
            senha_hash: auth::hash_password(senha, &salt),
            senha_salt: salt,
            primeiro_acesso,
            token_recuperacao: None,
            token_expira: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_access_accepts_only_default_password() {
        let u = usuario(true, "OABGONEXT");
        assert!(check_credentials(&u, "OABGONEXT", "OABGONEXT").unwrap());
        assert!(matches!(
            check_credentials(&u, "qualquer", "OABGONEXT"),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn settled_account_checks_hash() {
        let u = usuario(false, "segredo123");
        assert!(!check_credentials(&u, "segredo123", "OABGONEXT").unwrap());
        assert!(check_credentials(&u, "OABGONEXT", "OABGONEXT").is_err());
    }

    #[test]
    fn password_minimum_length_counts_characters() {
        assert!(validate_new_password("12345", 6).is_err());
        assert!(validate_new_password("çãõéíú", 6).is_ok());
    }

    #[test]
    fn registration_conflicts_name_the_violated_rule() {
        let err = registration_error(DatabaseError::Conflict(COMISSAO_UNICA.into()), "comissaox");
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Esta comissão já possui um usuário vinculado"));

        let err = registration_error(DatabaseError::Conflict("usuarios_nome_usuario_key".into()), "comissaox");
        assert!(matches!(err, ServiceError::Conflict(ref m) if m.contains("'comissaox'")));

        let err = registration_error(DatabaseError::ForeignKey("usuarios_comissao_id_fkey".into()), "comissaox");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn recovery_tokens_expire() {
        let now = Utc::now();
        assert!(token_expired(None, now));
        assert!(token_expired(Some(now - Duration::minutes(1)), now));
        assert!(!token_expired(Some(now + Duration::hours(23)), now));
    }
}
