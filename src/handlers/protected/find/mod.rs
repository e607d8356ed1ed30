// handlers/protected/find/mod.rs - Filtered reads over whitelisted tables
//
// POST /api/find/:table with a filter body `{select, where, order, limit, offset}`

pub mod find_post;

pub use find_post::find_post;

/// Tables and views the generic find may read. `usuarios` stays out.
pub const FINDABLE_TABLES: &[&str] = &[
    "comissoes",
    "projetos",
    "projetos_comissoes",
    "tags_projetos",
    "membros_comissoes",
    "sugestoes_integracao",
    "view_projetos_comissoes",
    "view_membros_comissoes",
];

pub fn is_findable(table: &str) -> bool {
    FINDABLE_TABLES.contains(&table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_table_is_never_findable() {
        assert!(is_findable("comissoes"));
        assert!(is_findable("view_membros_comissoes"));
        assert!(!is_findable("usuarios"));
        assert!(!is_findable("pg_user"));
        assert!(!is_findable("Comissoes"));
    }
}
