// handlers/protected/mod.rs - Protected handlers (session token required)
pub mod applications;
