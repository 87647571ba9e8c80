use std::fmt;

use crate::identity::Identity;

/// Which identities a record is able to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    IssuerSerial,
    SubjectKeyHash,
    /// The record carries enough data (typically the certificate itself) to
    /// produce both identities.
    Either,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::IssuerSerial => f.write_str("IssuerSerial"),
            Capability::SubjectKeyHash => f.write_str("SubjectKeyHash"),
            Capability::Either => f.write_str("Either"),
        }
    }
}

/// Anything that can be reconciled by certificate identity.
///
/// Derivation is fallible but soft: a record whose underlying data is
/// malformed returns `None` and should log why, since the implementor is
/// closest to the data.
pub trait Record: Send + Sync {
    fn capability(&self) -> Capability;
    fn issuer_serial(&self) -> Option<Identity>;
    fn subject_key_hash(&self) -> Option<Identity>;
}
