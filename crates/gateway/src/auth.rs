//! Process-wide auth token: generated once, persisted, never rotated.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::path::Path;
use tracing::info;

const TOKEN_FILE: &str = "auth_token.txt";
const TOKEN_BYTES: usize = 32;

/// Where the token lives inside the config directory.
pub fn token_path(config_dir: &Path) -> std::path::PathBuf {
    config_dir.join(TOKEN_FILE)
}

/// The bearer token every protected route and realtime connection must present.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// Load the persisted token, or generate and persist a fresh one.
    ///
    /// Failure here is fatal to startup: a gateway without a token
    /// cannot authorize anything.
    pub fn load_or_generate(config_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(config_dir)
            .with_context(|| format!("failed to create config dir {}", config_dir.display()))?;

        let path = token_path(config_dir);
        if let Ok(existing) = std::fs::read_to_string(&path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(Self(existing.to_string()));
            }
        }

        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        std::fs::write(&path, &token)
            .with_context(|| format!("failed to persist auth token to {}", path.display()))?;
        info!("generated new auth token at {}", path.display());

        Ok(Self(token))
    }

    /// Wrap an already known token value.
    pub fn from_raw(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token value, for display at startup.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Compare a presented credential against the token in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keep the secret out of logs.
        f.write_str("AuthToken(..)")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let generated = AuthToken::load_or_generate(dir.path()).unwrap();
        assert!(!generated.expose().is_empty());

        let reloaded = AuthToken::load_or_generate(dir.path()).unwrap();
        assert_eq!(generated.expose(), reloaded.expose());
    }

    #[test]
    fn test_blank_token_file_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_FILE), "  \n").unwrap();

        let token = AuthToken::load_or_generate(dir.path()).unwrap();
        assert!(!token.expose().is_empty());
    }

    #[test]
    fn test_matches() {
        let token = AuthToken::from_raw("secret-token");
        assert!(token.matches("secret-token"));
        assert!(!token.matches("secret-tokem"));
        assert!(!token.matches("secret"));
        assert!(!token.matches(""));
    }

    #[test]
    fn test_debug_does_not_leak() {
        let token = AuthToken::from_raw("secret-token");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
