//! Certificate identities and the dual-indexed reconciliation set.
//!
//! A revocation can be referenced either by issuer name + serial number or by
//! subject name + public key hash. Different sources encode the same values in
//! different ways (attribute order inside an RDN, padded vs unpadded base64),
//! so every source funnels through [`Identity`] to obtain a comparable key.

mod b64;
pub mod der;
mod identity;
pub mod name;
mod record;
mod set;

pub use b64::{b64_decode, b64_encode};
pub use der::DerError;
pub use identity::{Identity, IdentityError, IdentityKind};
pub use name::{Attribute, AttributeValue, DistinguishedName, Oid, RelativeName};
pub use record::{Capability, Record};
pub use set::IdentitySet;
