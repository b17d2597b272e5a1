// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Job listing/posting, application writes, and token acquisition.
pub mod applications;
pub mod auth;
pub mod jobs;
pub mod root;
