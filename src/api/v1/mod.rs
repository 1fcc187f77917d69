/*
 * Responsibility
 * - v1 の公開ポイント (routes() / metadata() の re-export など)
 */
pub mod handlers;
mod routes;

pub use routes::{metadata, routes};
