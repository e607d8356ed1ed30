pub mod auth;
pub mod buscar;
pub mod comissoes;
pub mod db;
pub mod ideia;
pub mod membros;
pub mod projetos;
pub mod server;
pub mod sugestoes;
