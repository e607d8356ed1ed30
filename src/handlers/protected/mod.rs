// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route prefix: /api/*
// Middleware: JWT validation for everything; the password-change gate for
// everything except /api/auth/*.

pub mod auth;
pub mod buscar;
pub mod comissoes;
pub mod find;
pub mod ideia;
pub mod membros;
pub mod projetos;
pub mod sugestoes;
