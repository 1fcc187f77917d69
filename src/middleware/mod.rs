/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 */
pub mod auth;
pub mod body;
pub mod body_parser;
pub mod cors;
pub mod http;

pub use body_parser::ParsedBody;
