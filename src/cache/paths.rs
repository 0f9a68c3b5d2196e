// Cache path and key utilities.
// Locates the persisted cache index and builds lookup keys for cached API results.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "ghactivity")
}

/// Get the base cache directory (~/.cache/ghactivity on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the cache index file.
pub fn cache_index_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("cache.json"))
}

/// Path to the persisted user configuration.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
}

/// Cache key for a user's profile.
pub fn user_key(identity: &str) -> String {
    format!("user-{}", normalize_identity(identity))
}

/// Prefix shared by every cached events page of a user.
///
/// Logins may contain hyphens but never a slash, so the slash keeps one
/// user's prefix from matching another login that starts the same way.
pub fn events_prefix(identity: &str) -> String {
    format!("events-{}/", normalize_identity(identity))
}

/// Cache key for one page of a user's public events.
pub fn events_page_key(identity: &str, page: u32, page_size: u32) -> String {
    format!("{}p{}-n{}", events_prefix(identity), page, page_size)
}

/// GitHub logins are case-insensitive, so keys are too.
fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}
