//! Environment variable constants used throughout the application.
//!
//! Centralized definition of all `HOOKWARDEN_*` environment variables to ensure
//! consistency and avoid hardcoded strings.

/// Configuration file path override (CLI arg default env)
pub const HOOKWARDEN_CONFIG: &str = "HOOKWARDEN_CONFIG";

/// Set in every hook process: the event that fired (e.g. `BeforeTool`)
pub const HOOKWARDEN_HOOK_EVENT: &str = "HOOKWARDEN_HOOK_EVENT";

/// Set in every hook process: the tool name of the pending call
pub const HOOKWARDEN_TOOL_NAME: &str = "HOOKWARDEN_TOOL_NAME";

/// Set in hook processes when the runtime has a project directory configured
pub const HOOKWARDEN_PROJECT_DIR: &str = "HOOKWARDEN_PROJECT_DIR";
