//! API key lookup.
//!
//! Keys are taken from, in order: an explicit value (usually a CLI flag), an
//! environment variable, then key files relative to the home directory.

use crate::error::MediaGenError;
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Where to look for one provider's API key.
#[derive(Debug, Clone, Copy)]
pub struct KeySource {
    pub provider: &'static str,
    pub env_var: &'static str,
    /// Paths relative to the user's home directory.
    pub key_files: &'static [&'static str],
    pub hint: &'static str,
}

pub const STABILITY_KEY: KeySource = KeySource {
    provider: "Stability",
    env_var: "STABILITY_API_KEY",
    key_files: &[".config/stabilityai/api_key", ".stabilityai.key"],
    hint: "Provide via --api-key, env STABILITY_API_KEY, or ~/.config/stabilityai/api_key",
};

pub const HEYGEN_KEY: KeySource = KeySource {
    provider: "HeyGen",
    env_var: "HEYGEN_API_KEY",
    key_files: &[],
    hint: "Provide via --heygen-api-key or env HEYGEN_API_KEY",
};

/// Resolves the API key described by `source`.
///
/// # Errors
///
/// `MediaGenError::MissingApiKey` when every location is empty or absent.
pub fn resolve_api_key(explicit: Option<&str>, source: &KeySource) -> Result<String, MediaGenError> {
    resolve_api_key_in(explicit, source, dirs::home_dir().as_deref())
}

fn resolve_api_key_in(
    explicit: Option<&str>,
    source: &KeySource,
    home: Option<&Path>,
) -> Result<String, MediaGenError> {
    if let Some(key) = non_empty(explicit) {
        return Ok(key);
    }
    if let Some(key) = non_empty(env::var(source.env_var).ok().as_deref()) {
        debug!(var = source.env_var, "API key taken from environment");
        return Ok(key);
    }
    if let Some(home) = home {
        for relative in source.key_files {
            let path = home.join(relative);
            // Unreadable files are skipped like missing ones.
            if let Some(key) = non_empty(fs::read_to_string(&path).ok().as_deref()) {
                debug!(path = %path.display(), "API key taken from file");
                return Ok(key);
            }
        }
    }
    Err(MediaGenError::MissingApiKey {
        provider: source.provider,
        hint: source.hint,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
