/*
 * Responsibility
 * - guard が request extensions に insert する値の型
 *
 * Notes
 * - session が無くても必ず insert される (None)。public route でも読める
 */
use crate::types::{User, UserSession};

/// Session resolved by the guard for this request.
#[derive(Debug, Clone, Default)]
pub struct RequestSession(pub Option<UserSession>);

/// `session.user`, or `None` when no session was found.
#[derive(Debug, Clone, Default)]
pub struct RequestUser(pub Option<User>);
