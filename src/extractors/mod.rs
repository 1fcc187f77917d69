/*!
 * Session / user extractors
 *
 * Responsibility:
 * - guard が request extensions に載せた session を handler に渡す
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - RequestSession, RequestUser (extensions に入る値)
 * - CurrentUser, Session (handler 引数)
 */

mod core;
mod types;

pub use core::{CurrentUser, Session};
pub use types::{RequestSession, RequestUser};
