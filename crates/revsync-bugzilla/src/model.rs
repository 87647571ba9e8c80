//! Request and response bodies for the endpoints this client drives.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize, Serializer};

/// `POST /bug`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BugCreate {
    pub product: String,
    pub component: String,
    pub summary: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub severity: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct BugCreated {
    pub id: u64,
}

/// `POST /bug/{id}/attachment`. The payload is base64 encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentCreate {
    pub ids: Vec<u64>,
    #[serde(serialize_with = "as_base64")]
    pub data: Vec<u8>,
    pub file_name: String,
    pub summary: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_private: bool,
}

impl AttachmentCreate {
    pub fn text(
        bug: u64,
        file_name: impl Into<String>,
        summary: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            ids: vec![bug],
            data: data.into(),
            file_name: file_name.into(),
            summary: summary.into(),
            content_type: "text/plain".to_string(),
            comment: String::new(),
            is_private: false,
        }
    }
}

fn as_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct AttachmentCreated {
    #[serde(default)]
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
}

/// `PUT /bug/{id}`. Only the fields set are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BugUpdate {
    #[serde(skip)]
    pub id: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl BugUpdate {
    pub fn comment(id: u64, body: impl Into<String>) -> Self {
        Self {
            id,
            ids: vec![id],
            comment: Some(Comment { body: body.into() }),
            ..Self::default()
        }
    }

    /// Close as `RESOLVED`/`INVALID`, explaining why in a comment.
    pub fn invalidate(id: u64, body: impl Into<String>) -> Self {
        Self {
            status: Some("RESOLVED".to_string()),
            resolution: Some("INVALID".to_string()),
            ..Self::comment(id, body)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BugChange {
    #[serde(default)]
    pub added: String,
    #[serde(default)]
    pub removed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BugUpdated {
    pub id: u64,
    #[serde(default)]
    pub last_change_time: String,
    #[serde(default)]
    pub changes: std::collections::BTreeMap<String, BugChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct UpdateResponse {
    #[serde(default)]
    pub bugs: Vec<BugUpdated>,
}

/// The subset of a bug's fields this tool reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Bug {
    pub id: u64,
    pub summary: String,
    pub status: String,
    pub resolution: String,
    pub product: String,
    pub component: String,
    pub creator: String,
    pub creation_time: String,
    pub last_change_time: String,
    pub is_open: bool,
    pub cc: Vec<String>,
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BugList {
    #[serde(default)]
    pub bugs: Vec<Bug>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VersionResponse {
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attachment_data_is_base64() {
        let attachment = AttachmentCreate::text(7, "BugData.txt", "pairs", "issuer: x");
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(
            json,
            json!({
                "ids": [7],
                "data": "aXNzdWVyOiB4",
                "file_name": "BugData.txt",
                "summary": "pairs",
                "content_type": "text/plain",
            })
        );
    }

    #[test]
    fn invalidate_sets_status_resolution_and_comment() {
        let update = BugUpdate::invalidate(42, "closing");
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "ids": [42],
                "comment": {"body": "closing"},
                "status": "RESOLVED",
                "resolution": "INVALID",
            })
        );
    }

    #[test]
    fn create_omits_empty_optional_fields() {
        let create = BugCreate {
            product: "Toolkit".into(),
            component: "Blocklist Policy Requests".into(),
            summary: "s".into(),
            version: "unspecified".into(),
            kind: "enhancement".into(),
            ..BugCreate::default()
        };
        assert_eq!(
            serde_json::to_value(&create).unwrap(),
            json!({
                "product": "Toolkit",
                "component": "Blocklist Policy Requests",
                "summary": "s",
                "version": "unspecified",
                "type": "enhancement",
            })
        );
    }
}
