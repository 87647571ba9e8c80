use std::fmt;
use std::hash::{Hash, Hasher};

use crate::b64::{b64_decode, b64_encode};
use crate::der::DerError;
use crate::name::DistinguishedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    /// Issuer name + certificate serial number.
    IssuerSerial,
    /// Subject name + SHA-256 of the subject public key info.
    SubjectKeyHash,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::IssuerSerial => f.write_str("IssuerSerial"),
            IdentityKind::SubjectKeyHash => f.write_str("SubjectKeyHash"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("b64 decode error for '{input}': {source}")]
    Base64 {
        input: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("malformed name encoding: {0}")]
    Name(#[from] DerError),
}

/// Canonical key for a certificate: `"<normalized-name>,<padded base64 data>"`.
///
/// Equality and hashing look only at the canonical string.
#[derive(Debug, Clone)]
pub struct Identity {
    kind: IdentityKind,
    canonical: String,
}

impl Identity {
    /// Build from an already-rendered name. Callers are responsible for the
    /// name having been normalized.
    pub fn new(kind: IdentityKind, name: &str, data: &[u8]) -> Self {
        Self {
            kind,
            canonical: format!("{name},{}", b64_encode(data)),
        }
    }

    pub fn from_name(kind: IdentityKind, name: &DistinguishedName, data: &[u8]) -> Self {
        let name = name.clone().normalized();
        Self::new(kind, &name.to_string(), data)
    }

    pub fn from_der(kind: IdentityKind, name_der: &[u8], data: &[u8]) -> Result<Self, IdentityError> {
        let name = DistinguishedName::from_der(name_der)?;
        Ok(Self::from_name(kind, &name, data))
    }

    /// Build from the base64 forms stored in revocation entries: a DER
    /// encoded name and the serial or key hash bytes.
    pub fn from_encoded(
        kind: IdentityKind,
        name_b64: &str,
        data_b64: &str,
    ) -> Result<Self, IdentityError> {
        let name_der = b64_decode(name_b64)?;
        let data = b64_decode(data_b64)?;
        Self::from_der(kind, &name_der, &data)
    }

    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::{Attribute, AttributeValue, Oid, RelativeName};

    fn name(reversed_set: bool) -> DistinguishedName {
        let o = Attribute::new("2.5.4.10".parse::<Oid>().unwrap(), AttributeValue::utf8("Org"));
        let ou = Attribute::new("2.5.4.11".parse::<Oid>().unwrap(), AttributeValue::utf8("Unit"));
        let set = if reversed_set { vec![ou, o] } else { vec![o, ou] };
        DistinguishedName::new(vec![
            RelativeName::single("2.5.4.6".parse().unwrap(), AttributeValue::printable("US")),
            RelativeName::new(set),
        ])
    }

    #[test]
    fn reordered_sets_and_padding_are_equivalent() {
        let serial = [0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88];
        let a = Identity::from_encoded(
            IdentityKind::IssuerSerial,
            &b64_encode(&name(false).to_der().unwrap()),
            "/+7dzLuqmYg=",
        )
        .unwrap();
        let b = Identity::from_encoded(
            IdentityKind::IssuerSerial,
            &b64_encode(&name(true).to_der().unwrap()).trim_end_matches('=').to_string(),
            "/+7dzLuqmYg",
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Identity::from_name(IdentityKind::IssuerSerial, &name(true), &serial));
        assert!(a.as_str().ends_with(",/+7dzLuqmYg="));
    }

    #[test]
    fn different_serials_differ() {
        let a = Identity::from_name(IdentityKind::IssuerSerial, &name(false), &[1]);
        let b = Identity::from_name(IdentityKind::IssuerSerial, &name(false), &[2]);
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_inputs_error() {
        assert!(matches!(
            Identity::from_encoded(IdentityKind::SubjectKeyHash, "%%%", "AA=="),
            Err(IdentityError::Base64 { .. })
        ));
        assert!(matches!(
            Identity::from_encoded(IdentityKind::SubjectKeyHash, "AAAA", "AA=="),
            Err(IdentityError::Name(_))
        ));
    }
}
