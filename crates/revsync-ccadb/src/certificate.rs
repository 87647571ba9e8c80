use std::sync::OnceLock;

use openssl::x509::X509;
use revsync_identity::{Capability, Identity, IdentityKind, Record};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::CertificateError;

/// `OneCRL Status` of rows that are waiting to be added.
pub const READY_TO_ADD: &str = "Ready to Add";

/// One row of the report. Column names are the report's headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "CA Owner")]
    pub ca_owner: String,
    #[serde(rename = "Revocation Status")]
    pub revocation_status: String,
    #[serde(rename = "RFC 5280 Revocation Reason Code")]
    pub reason_code: String,
    #[serde(rename = "Date of Revocation")]
    pub date_of_revocation: String,
    #[serde(rename = "OneCRL Status")]
    pub onecrl_status: String,
    #[serde(rename = "OneCRL Bug Number")]
    pub onecrl_bug_number: String,
    #[serde(rename = "Certificate Serial Number")]
    pub serial_number: String,
    #[serde(rename = "CA Owner/Certificate Name")]
    pub certificate_name: String,
    #[serde(rename = "Certificate Issuer Common Name")]
    pub issuer_common_name: String,
    #[serde(rename = "Certificate Issuer Organization")]
    pub issuer_organization: String,
    #[serde(rename = "Certificate Subject Common Name")]
    pub subject_common_name: String,
    #[serde(rename = "Certificate Subject Organization")]
    pub subject_organization: String,
    #[serde(rename = "SHA-256 Fingerprint")]
    pub fingerprint: String,
    #[serde(rename = "Subject + SPKI SHA256")]
    pub subject_spki_hash: String,
    #[serde(rename = "Valid From [GMT]")]
    pub not_before: String,
    #[serde(rename = "Valid To [GMT]")]
    pub not_after: String,
    #[serde(rename = "Public Key Algorithm")]
    pub key_algorithm: String,
    #[serde(rename = "Signature Hash Algorithm")]
    pub signature_algorithm: String,
    #[serde(rename = "CRL URL(s)")]
    pub crl_urls: String,
    #[serde(rename = "Alternate CRL")]
    pub alternate_crl: String,
    #[serde(rename = "Comments")]
    pub comments: String,
    /// Read-only once built, since the identities derived from it are cached.
    #[serde(rename = "PEM Info")]
    pem_info: String,

    #[serde(skip)]
    identities: OnceLock<Identities>,
}

#[derive(Debug, Clone, Default)]
struct Identities {
    issuer_serial: Option<Identity>,
    subject_key_hash: Option<Identity>,
}

impl Certificate {
    /// A `Ready to Add` row carrying only the given PEM.
    pub fn from_pem(pem_info: impl Into<String>) -> Self {
        Self {
            onecrl_status: READY_TO_ADD.to_string(),
            pem_info: pem_info.into(),
            ..Self::default()
        }
    }

    pub fn is_ready_to_add(&self) -> bool {
        self.onecrl_status == READY_TO_ADD
    }

    /// The `PEM Info` column as the report delivered it.
    pub fn pem_info(&self) -> &str {
        &self.pem_info
    }

    /// The PEM with the stray single quotes and whitespace the report wraps
    /// it in removed.
    pub fn pem(&self) -> &str {
        self.pem_info.trim_matches('\'').trim()
    }

    pub fn parse(&self) -> Result<X509, CertificateError> {
        let pem = self.pem();
        if pem.is_empty() {
            return Err(CertificateError::EmptyPem);
        }
        X509::from_pem(pem.as_bytes()).map_err(|source| CertificateError::Pem {
            pem_info: self.pem_info.clone(),
            source,
        })
    }

    /// DER encoded issuer name and the serial number's magnitude bytes.
    pub fn raw_issuer_serial(&self) -> Result<(Vec<u8>, Vec<u8>), CertificateError> {
        let cert = self.parse()?;
        raw_issuer_serial(&cert)
    }

    fn identities(&self) -> &Identities {
        self.identities.get_or_init(|| match self.parse() {
            Ok(cert) => Identities {
                issuer_serial: self.log_failure("issuer/serial", issuer_serial(&cert)),
                subject_key_hash: self.log_failure("subject/key hash", subject_key_hash(&cert)),
            },
            Err(error) => {
                warn!(
                    certificate = %self.certificate_name,
                    serial = %self.serial_number,
                    %error,
                    "failed to parse CCADB certificate"
                );
                Identities::default()
            }
        })
    }

    fn log_failure(
        &self,
        what: &'static str,
        result: Result<Identity, CertificateError>,
    ) -> Option<Identity> {
        result
            .map_err(|error| {
                warn!(
                    certificate = %self.certificate_name,
                    serial = %self.serial_number,
                    %error,
                    "failed to derive {what} from CCADB certificate"
                );
            })
            .ok()
    }
}

fn raw_issuer_serial(cert: &X509) -> Result<(Vec<u8>, Vec<u8>), CertificateError> {
    let issuer = cert
        .issuer_name()
        .to_der()
        .map_err(|source| CertificateError::Field { field: "issuer", source })?;
    let serial = cert
        .serial_number()
        .to_bn()
        .map_err(|source| CertificateError::Field { field: "serial number", source })?
        .to_vec();
    Ok((issuer, serial))
}

fn issuer_serial(cert: &X509) -> Result<Identity, CertificateError> {
    let (issuer, serial) = raw_issuer_serial(cert)?;
    Ok(Identity::from_der(IdentityKind::IssuerSerial, &issuer, &serial)?)
}

fn subject_key_hash(cert: &X509) -> Result<Identity, CertificateError> {
    let subject = cert
        .subject_name()
        .to_der()
        .map_err(|source| CertificateError::Field { field: "subject", source })?;
    let spki = cert
        .public_key()
        .and_then(|key| key.public_key_to_der())
        .map_err(|source| CertificateError::Field {
            field: "subject public key info",
            source,
        })?;
    let hash = Sha256::digest(&spki);
    Ok(Identity::from_der(
        IdentityKind::SubjectKeyHash,
        &subject,
        hash.as_slice(),
    )?)
}

impl Record for Certificate {
    fn capability(&self) -> Capability {
        Capability::Either
    }

    fn issuer_serial(&self) -> Option<Identity> {
        self.identities().issuer_serial.clone()
    }

    fn subject_key_hash(&self) -> Option<Identity> {
        self.identities().subject_key_hash.clone()
    }
}
