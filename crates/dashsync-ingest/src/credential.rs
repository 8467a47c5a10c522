//! Bearer credentials for platform APIs
//!
//! Tokens are supplied by the caller (usually through the environment) and
//! are never refreshed here. `Debug` output is redacted so reports and logs
//! can include a `Credentials` value safely.

use crate::sources::SourceKind;
use std::collections::HashMap;

/// An opaque, non-blank bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for absent or blank tokens, which count as missing
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
    }

    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        Self::from_raw(Some(&token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Credentials keyed by source
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    tokens: HashMap<SourceKind, Credential>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `DASHSYNC_<SOURCE>_TOKEN` for every known source
    pub fn from_env() -> Self {
        let mut credentials = Self::new();
        for kind in SourceKind::ALL {
            let raw = std::env::var(kind.credential_env_var()).ok();
            if let Some(credential) = Credential::from_raw(raw.as_deref()) {
                credentials.insert(kind, credential);
            }
        }
        credentials
    }

    pub fn insert(&mut self, kind: SourceKind, credential: Credential) {
        self.tokens.insert(kind, credential);
    }

    pub fn with(mut self, kind: SourceKind, token: &str) -> Self {
        if let Some(credential) = Credential::new(token) {
            self.insert(kind, credential);
        }
        self
    }

    pub fn get(&self, kind: SourceKind) -> Option<&Credential> {
        self.tokens.get(&kind)
    }

    pub fn contains(&self, kind: SourceKind) -> bool {
        self.tokens.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tokens_are_missing() {
        assert!(Credential::from_raw(None).is_none());
        assert!(Credential::from_raw(Some("")).is_none());
        assert!(Credential::from_raw(Some("   ")).is_none());
        assert_eq!(
            Credential::from_raw(Some(" tok ")).map(|c| c.expose().to_string()),
            Some("tok".to_string())
        );
    }

    #[test]
    fn test_debug_is_redacted() {
        let credentials = Credentials::new().with(SourceKind::ThreeCx, "super-secret");
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_bearer_header() {
        let credential = Credential::new("abc").map(|c| c.bearer());
        assert_eq!(credential.as_deref(), Some("Bearer abc"));
    }
}
