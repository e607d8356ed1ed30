// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and account bootstrap. No /api prefix.

pub mod auth;
