//! Named processing modes of the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Requested mode name is not one the pipeline knows. No fallback is applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported processing mode: {0:?} (expected one of: inventory, standardize, syntmine, fingerprint)")]
pub struct UnsupportedMode(pub String);

/// Output artifact selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Raw inventory plus comment corpus, no rewriting.
    Inventory,
    /// Variables and parameters renamed to `variable_<i>`, everything else kept.
    Standardize,
    /// Comments and literals stripped, identifiers masked or removed, whitespace dropped.
    Syntmine,
    /// 64-bit digest of the masked syntax-mining form.
    Fingerprint,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Inventory,
        Mode::Standardize,
        Mode::Syntmine,
        Mode::Fingerprint,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Inventory => "inventory",
            Mode::Standardize => "standardize",
            Mode::Syntmine => "syntmine",
            Mode::Fingerprint => "fingerprint",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = UnsupportedMode;

    /// Exact, case-sensitive match on the mode name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnsupportedMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_modes() {
        for mode in Mode::ALL {
            assert_eq!(mode.name().parse::<Mode>(), Ok(mode));
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = "tokenize".parse::<Mode>().unwrap_err();
        assert_eq!(err, UnsupportedMode("tokenize".into()));
        assert!(err.to_string().contains("tokenize"));
    }

    #[test]
    fn test_mode_names_are_case_sensitive() {
        assert!("Standardize".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }
}
