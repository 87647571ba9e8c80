use std::sync::Arc;

use revsync_ccadb::{Certificate, CertificateError};
use revsync_identity::{
    Capability, Identity, IdentityError, IdentityKind, Record, b64_decode, b64_encode,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One OneCRL entry as stored in Kinto.
///
/// Entries are keyed either by issuer + serial or, for the rarer blocks by
/// key, by subject + public key hash. Names are base64 DER, the serial and
/// hash base64 (padding varies between entries).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneCrlRecord {
    /// The report row this entry was proposed from, if any.
    #[serde(skip)]
    pub source: Option<Arc<Certificate>>,
    #[serde(default)]
    pub schema: u64,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "issuerName", default, skip_serializing_if = "String::is_empty")]
    pub issuer_name: String,
    #[serde(rename = "serialNumber", default, skip_serializing_if = "String::is_empty")]
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(rename = "pubKeyHash", default, skip_serializing_if = "String::is_empty")]
    pub pub_key_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Details {
    pub bug: String,
    pub who: String,
    pub why: String,
    pub name: String,
    pub created: String,
}

impl OneCrlRecord {
    /// Propose a new, disabled issuer/serial entry for a report row.
    pub fn from_ccadb(certificate: Arc<Certificate>) -> Result<Self, CertificateError> {
        let (issuer, serial) = certificate.raw_issuer_serial()?;
        Ok(Self {
            source: Some(certificate),
            issuer_name: b64_encode(&issuer),
            serial_number: b64_encode(&serial),
            ..Self::default()
        })
    }

    /// Store and report renderings of the same entry, side by side.
    pub fn to_comparison(&self) -> Result<Comparison, IdentityError> {
        let source = self.source.as_deref();
        match self.capability() {
            Capability::SubjectKeyHash => {
                let hash = hex::encode_upper(b64_decode(&self.pub_key_hash)?);
                Ok(Comparison::SubjectKeyHash {
                    subject: Side::new(
                        &self.subject,
                        source.map(|c| c.subject_common_name.as_str()),
                    ),
                    key_hash: Side::new(&self.pub_key_hash, Some(hash.as_str())),
                })
            }
            _ => Ok(Comparison::IssuerSerial {
                issuer: Side::new(
                    &self.issuer_name,
                    source.map(|c| c.issuer_common_name.as_str()),
                ),
                serial: Side::new(
                    &self.serial_number,
                    source.map(|c| c.serial_number.as_str()),
                ),
            }),
        }
    }

    fn describe(&self) -> &str {
        self.id.as_deref().unwrap_or("<unsaved>")
    }
}

impl Record for OneCrlRecord {
    fn capability(&self) -> Capability {
        if !self.subject.is_empty() && !self.pub_key_hash.is_empty() {
            Capability::SubjectKeyHash
        } else {
            Capability::IssuerSerial
        }
    }

    fn issuer_serial(&self) -> Option<Identity> {
        if self.capability() != Capability::IssuerSerial {
            return None;
        }
        if self.issuer_name.is_empty() || self.serial_number.is_empty() {
            warn!(
                record = self.describe(),
                "OneCRL entry has neither issuer/serial nor subject/key hash"
            );
            return None;
        }
        Identity::from_encoded(
            IdentityKind::IssuerSerial,
            &self.issuer_name,
            &self.serial_number,
        )
        .map_err(|error| {
            warn!(record = self.describe(), %error, "failed to decode OneCRL issuer/serial");
        })
        .ok()
    }

    fn subject_key_hash(&self) -> Option<Identity> {
        if self.capability() != Capability::SubjectKeyHash {
            return None;
        }
        Identity::from_encoded(
            IdentityKind::SubjectKeyHash,
            &self.subject,
            &self.pub_key_hash,
        )
        .map_err(|error| {
            warn!(record = self.describe(), %error, "failed to decode OneCRL subject/key hash");
        })
        .ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Side {
    #[serde(rename = "OneCRL")]
    pub onecrl: String,
    #[serde(rename = "CCADB")]
    pub ccadb: String,
}

impl Side {
    fn new(onecrl: &str, ccadb: Option<&str>) -> Self {
        Self {
            onecrl: onecrl.to_string(),
            ccadb: ccadb.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Comparison {
    IssuerSerial {
        issuer: Side,
        serial: Side,
    },
    SubjectKeyHash {
        subject: Side,
        #[serde(rename = "keyHash")]
        key_hash: Side,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CN_HI: &str = "MA0xCzAJBgNVBAMTAmhp";

    fn issuer_serial(issuer: &str, serial: &str) -> OneCrlRecord {
        OneCrlRecord {
            issuer_name: issuer.into(),
            serial_number: serial.into(),
            ..OneCrlRecord::default()
        }
    }

    #[test]
    fn kinto_field_names_round_trip() {
        let raw = json!({
            "schema": 1552492993020u64,
            "details": {"bug": "https://bugzilla.example.org/show_bug.cgi?id=1", "who": "", "why": "", "name": "", "created": ""},
            "enabled": false,
            "issuerName": CN_HI,
            "serialNumber": "AQA=",
            "id": "abc",
            "last_modified": 1700000000000u64,
            "unrelated": true,
        });
        let record: OneCrlRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.id.as_deref(), Some("abc"));
        assert_eq!(record.details.bug, "https://bugzilla.example.org/show_bug.cgi?id=1");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["issuerName"], CN_HI);
        assert!(back.get("subject").is_none());
        assert!(back.get("unrelated").is_none());
    }

    #[test]
    fn capability_follows_populated_fields() {
        let mut record = issuer_serial(CN_HI, "AQA=");
        assert_eq!(record.capability(), Capability::IssuerSerial);
        record.subject = CN_HI.into();
        assert_eq!(record.capability(), Capability::IssuerSerial);
        record.pub_key_hash = "AAAA".into();
        assert_eq!(record.capability(), Capability::SubjectKeyHash);
        assert!(record.issuer_serial().is_none());
        assert_eq!(
            record.subject_key_hash().unwrap().as_str(),
            "CN=hi,AAAA"
        );
    }

    #[test]
    fn serial_padding_does_not_change_identity() {
        let padded = issuer_serial(CN_HI, "AQA=").issuer_serial().unwrap();
        let unpadded = issuer_serial(CN_HI, "AQA").issuer_serial().unwrap();
        assert_eq!(padded, unpadded);
        assert_eq!(padded.as_str(), "CN=hi,AQA=");
    }

    #[test]
    fn empty_or_malformed_entries_yield_nothing() {
        assert!(OneCrlRecord::default().issuer_serial().is_none());
        assert!(OneCrlRecord::default().subject_key_hash().is_none());
        assert!(issuer_serial("!!", "AQA=").issuer_serial().is_none());
        assert!(issuer_serial(CN_HI, "%%").issuer_serial().is_none());
    }

    #[test]
    fn comparison_renders_key_hash_as_uppercase_hex() {
        let record = OneCrlRecord {
            subject: CN_HI.into(),
            pub_key_hash: "3q2+7w==".into(),
            ..OneCrlRecord::default()
        };
        assert_eq!(
            serde_json::to_value(record.to_comparison().unwrap()).unwrap(),
            json!({
                "subject": {"OneCRL": CN_HI, "CCADB": ""},
                "keyHash": {"OneCRL": "3q2+7w==", "CCADB": "DEADBEEF"},
            })
        );
    }

    #[test]
    fn comparison_uses_report_columns_for_issuer_serial() {
        let mut source = Certificate::from_pem("");
        source.issuer_common_name = "Example Root".into();
        source.serial_number = "0100".into();
        let record = OneCrlRecord {
            source: Some(Arc::new(source)),
            ..issuer_serial(CN_HI, "AQA=")
        };
        assert_eq!(
            serde_json::to_value(record.to_comparison().unwrap()).unwrap(),
            json!({
                "issuer": {"OneCRL": CN_HI, "CCADB": "Example Root"},
                "serial": {"OneCRL": "AQA=", "CCADB": "0100"},
            })
        );
    }
}
