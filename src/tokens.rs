/*
 * Responsibility
 * - Provider container と route metadata で使う識別子
 * - ロジックは置かない
 */

/// Engine handle registered by `AuthModule::exports`.
pub const BETTER_AUTH_INSTANCE_TOKEN: &str = "BETTER_AUTH_INSTANCE";

/// Adapter options registered by `AuthModule::exports`.
pub const AUTH_MODULE_OPTIONS_TOKEN: &str = "AUTH_MODULE_OPTIONS";

/// Route metadata key set by `RouteMetadata::public_handler` / `public_controller`.
pub const IS_PUBLIC_KEY: &str = "IS_PUBLIC";

/// Base path used when the engine does not configure one.
pub const DEFAULT_BASE_PATH: &str = "/auth";
