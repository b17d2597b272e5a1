// handlers/mod.rs - two handler tiers
//
// Public (no token) and Protected (valid `token` cookie, checked by the
// `AuthUser` extractor each protected handler takes).
pub mod protected;
pub mod public;
