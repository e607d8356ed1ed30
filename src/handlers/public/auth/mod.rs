// handlers/public/auth/mod.rs - Public authentication handlers
//
// POST /auth/login            - credentials to session token
// POST /auth/register         - one account per committee
// POST /auth/recover          - issue recovery token
// POST /auth/recover/verify   - trade recovery token for a session

pub mod login;
pub mod recover;
pub mod register;

pub use login::login;
pub use recover::{request_recovery, verify_recovery};
pub use register::register;
