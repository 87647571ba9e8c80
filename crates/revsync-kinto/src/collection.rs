use serde::{Deserialize, Serialize};

/// A bucket/collection pair addressing one Kinto collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub bucket: String,
    pub id: String,
}

impl Collection {
    pub fn new(bucket: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            id: id.into(),
        }
    }

    /// Target for collection metadata and signer transitions.
    pub fn path(&self) -> String {
        format!("/buckets/{}/collections/{}", self.bucket, self.id)
    }

    pub fn records_path(&self) -> String {
        format!("{}/records", self.path())
    }

    pub fn record_path(&self, record_id: &str) -> String {
        format!("{}/{}", self.records_path(), record_id)
    }
}

/// Acknowledgement returned when a record is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Deleted {
    #[serde(default)]
    pub deleted: bool,
    pub id: String,
    #[serde(default)]
    pub last_modified: u64,
}

/// The `{"data": ..., "permissions": ...}` wrapper Kinto uses for both
/// requests and responses.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<serde_json::Value>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            permissions: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionMetadata {
    #[serde(default)]
    pub status: Option<crate::SignerStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusPatch {
    pub status: crate::SignerStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_nest_under_the_bucket() {
        let collection = Collection::new("security-state", "onecrl");
        assert_eq!(collection.path(), "/buckets/security-state/collections/onecrl");
        assert_eq!(
            collection.record_path("abc"),
            "/buckets/security-state/collections/onecrl/records/abc"
        );
    }

    #[test]
    fn envelope_omits_absent_permissions() {
        let json = serde_json::to_value(Envelope::new(serde_json::json!({"a": 1}))).unwrap();
        assert_eq!(json, serde_json::json!({"data": {"a": 1}}));
    }
}
