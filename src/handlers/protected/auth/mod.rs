// handlers/protected/auth/mod.rs - Session management for authenticated users
//
// These stay reachable while a password change is pending.

pub mod session;

pub use session::{change_password, logout, whoami};
