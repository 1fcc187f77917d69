/*
 * Responsibility
 * - guard (session 検証 + public route 判定)
 * - route metadata (public marker の side-table)
 * - bridge (auth routes を engine に渡す。provider ごとの strategy)
 */
pub mod bridge;
pub mod guard;
pub mod metadata;

pub use bridge::{ExpressStrategy, FastifyStrategy, RoutingStrategy, strategy_for};
pub use guard::AuthGuard;
pub use metadata::RouteMetadata;
