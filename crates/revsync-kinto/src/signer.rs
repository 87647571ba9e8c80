use std::fmt;

use serde::{Deserialize, Serialize};

/// Review state of a collection managed by the Kinto signer plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignerStatus {
    WorkInProgress,
    ToReview,
    ToSign,
    Signed,
    ToRollback,
    ToResign,
    /// Any state this client does not drive itself (e.g. `to-refresh`).
    #[serde(other)]
    Unknown,
}

impl SignerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerStatus::WorkInProgress => "work-in-progress",
            SignerStatus::ToReview => "to-review",
            SignerStatus::ToSign => "to-sign",
            SignerStatus::Signed => "signed",
            SignerStatus::ToRollback => "to-rollback",
            SignerStatus::ToResign => "to-resign",
            SignerStatus::Unknown => "unknown",
        }
    }

    pub fn in_review(&self) -> bool {
        matches!(self, SignerStatus::ToReview)
    }
}

impl fmt::Display for SignerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_display() {
        for status in [
            SignerStatus::WorkInProgress,
            SignerStatus::ToReview,
            SignerStatus::ToSign,
            SignerStatus::Signed,
            SignerStatus::ToRollback,
            SignerStatus::ToResign,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
            let back: SignerStatus = serde_json::from_value(json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn unrecognised_states_are_tolerated() {
        let status: SignerStatus = serde_json::from_str("\"to-refresh\"").unwrap();
        assert_eq!(status, SignerStatus::Unknown);
        assert!(!status.in_review());
        assert!(SignerStatus::ToReview.in_review());
    }
}
