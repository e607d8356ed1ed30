use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::ServiceError;

/// One search hit, either a project or a committee
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BuscaResultado {
    pub tipo: String,
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub match_rank: f64,
}

// Weights: name 2.0, description 1.0, any secondary field 0.5
const SEARCH_SQL: &str = r#"
SELECT * FROM (
    SELECT 'projeto' AS tipo, p.id, p.nome, p.descricao,
        ( CASE WHEN p.nome ILIKE $1 THEN 2.0 ELSE 0 END
        + CASE WHEN COALESCE(p.descricao, '') ILIKE $1 THEN 1.0 ELSE 0 END
        + CASE WHEN COALESCE(p.objetivos, '') ILIKE $1
                 OR EXISTS (SELECT 1 FROM tags_projetos t WHERE t.projeto_id = p.id AND t.tag ILIKE $1)
               THEN 0.5 ELSE 0 END
        )::float8 AS match_rank
    FROM projetos p
    UNION ALL
    SELECT 'comissao' AS tipo, c.id, c.nome, c.descricao,
        ( CASE WHEN c.nome ILIKE $1 THEN 2.0 ELSE 0 END
        + CASE WHEN COALESCE(c.descricao, '') ILIKE $1 THEN 1.0 ELSE 0 END
        + CASE WHEN COALESCE(c.area_atuacao, '') ILIKE $1 THEN 0.5 ELSE 0 END
        )::float8 AS match_rank
    FROM comissoes c
) hits
WHERE match_rank > 0
ORDER BY match_rank DESC, nome
LIMIT $2
"#;

pub struct BuscaService {
    pool: PgPool,
    limit: i64,
}

impl BuscaService {
    pub fn new(pool: PgPool, limit: i64) -> Self {
        Self { pool, limit }
    }

    /// Case-insensitive substring search over projects and committees.
    /// A blank term returns nothing without touching the database.
    pub async fn search(&self, termo: &str) -> Result<Vec<BuscaResultado>, ServiceError> {
        let Some(pattern) = search_pattern(termo) else {
            return Ok(vec![]);
        };

        let rows = sqlx::query_as::<_, BuscaResultado>(SEARCH_SQL)
            .bind(&pattern)
            .bind(self.limit)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!("Search for '{}' returned {} hits", termo.trim(), rows.len());
        Ok(rows)
    }
}

/// `%term%` with LIKE metacharacters escaped, or `None` for a blank term
pub fn search_pattern(termo: &str) -> Option<String> {
    let termo = termo.trim();
    if termo.is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like(termo)))
}

pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_ok\\"), "100\\%\\_ok\\\\");
        assert_eq!(escape_like("direito"), "direito");
    }

    #[test]
    fn blank_terms_produce_no_pattern() {
        assert_eq!(search_pattern("   "), None);
        assert_eq!(search_pattern(""), None);
        assert_eq!(search_pattern(" lgpd ").as_deref(), Some("%lgpd%"));
    }
}
