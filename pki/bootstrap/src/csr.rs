use localtls_common::x509::name::CertificateName;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::pkey::PKeyRef;
use openssl::pkey::Private;

use self::proof::make_proof;
use self::proof::request_properties_hash;
use crate::san::SubjectAltNames;
use crate::template::ValidationError;

pub(crate) mod proof;

pub use self::proof::MakeRequestHashError;

/// The key usage flags carried by a certificate request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestedKeyUsage {
    pub non_repudiation: bool,
    pub digital_signature: bool,
    pub key_encipherment: bool,
}

impl Default for RequestedKeyUsage {
    /// The TLS server profile: {nonRepudiation, digitalSignature,
    /// keyEncipherment}.
    fn default() -> Self {
        Self {
            non_repudiation: true,
            digital_signature: true,
            key_encipherment: true,
        }
    }
}

/// A certificate signing request.
///
/// Immutable once built, consumed exactly once by the signing engine.
/// The request carries the server's public key only; the private key
/// never crosses to the CA side. The `proof` field is a signature
/// produced with the requester's private key over the canonical request
/// properties, so anyone holding the request can check that the
/// requester possesses the matching private key.
#[derive(Clone, Debug)]
pub struct CertificateRequest {
    pub(crate) subject: CertificateName,
    /// SubjectPublicKeyInfo, DER.
    pub(crate) public_key_der: Vec<u8>,
    pub(crate) ca: bool,
    pub(crate) key_usage: RequestedKeyUsage,
    pub(crate) subject_alt_names: SubjectAltNames,
    pub(crate) validity_days: u32,
    pub(crate) proof: Vec<u8>,
}

impl CertificateRequest {
    pub fn subject(&self) -> &CertificateName {
        &self.subject
    }

    pub fn subject_alt_names(&self) -> &SubjectAltNames {
        &self.subject_alt_names
    }

    pub fn key_usage(&self) -> RequestedKeyUsage {
        self.key_usage
    }
}

/// Builds a signing request for a TLS server certificate.
///
/// The request asserts `basicConstraints = CA:FALSE` and the TLS server
/// key usage profile. It fails when `subject_alt_names` is empty:
/// hostname validation in modern TLS clients requires at least one SAN
/// entry, so issuing a server certificate without one is a
/// misconfiguration, not a degraded mode.
pub fn build_request(
    server_key: &PKeyRef<Private>,
    subject: CertificateName,
    subject_alt_names: SubjectAltNames,
    validity_days: u32,
) -> Result<CertificateRequest, BuildRequestError> {
    if subject_alt_names.is_empty() {
        return Err(ValidationError::EmptySubjectAltNames)?;
    }
    if validity_days == 0 {
        return Err(ValidationError::InvalidValidity {
            days: validity_days,
        })?;
    }

    let public_key_der = server_key
        .public_key_to_der()
        .map_err(BuildRequestError::PublicKey)?;
    let properties = request_properties_hash(
        &subject,
        &subject_alt_names,
        validity_days,
        false,
        &public_key_der,
    )?;
    let proof = make_proof(server_key, &properties).map_err(BuildRequestError::Proof)?;

    Ok(CertificateRequest {
        subject,
        public_key_der,
        ca: false,
        key_usage: RequestedKeyUsage::default(),
        subject_alt_names,
        validity_days,
        proof,
    })
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum BuildRequestError {
    #[error("[{n}] {0}", n = self.name())]
    Validation(#[from] ValidationError),

    #[error("[{n}] Failed to encode the server public key: {0}", n = self.name())]
    PublicKey(ErrorStack),

    #[error("[{n}] {0}", n = self.name())]
    RequestHash(#[from] MakeRequestHashError),

    #[error("[{n}] Failed to sign the proof of possession: {0}", n = self.name())]
    Proof(ErrorStack),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use localtls_common::x509::key::KeyAlgorithm;
    use localtls_common::x509::key::make_key;
    use openssl::pkey::PKey;

    use super::BuildRequestError;
    use super::proof::request_properties_hash;
    use super::proof::verify_proof;
    use crate::san::SanEntry;
    use crate::san::SubjectAltNames;
    use crate::template::DnOverrides;
    use crate::template::DnTemplate;
    use crate::template::ValidationError;

    #[test]
    fn empty_san_set() -> Result<(), Box<dyn Error>> {
        let server_key = make_key(KeyAlgorithm::default())?;
        let subject = DnTemplate::default().materialize(&DnOverrides::default())?;
        let Err(BuildRequestError::Validation(ValidationError::EmptySubjectAltNames)) =
            super::build_request(&server_key, subject, SubjectAltNames::default(), 31)
        else {
            panic!()
        };
        Ok(())
    }

    #[test]
    fn single_san_entry() -> Result<(), Box<dyn Error>> {
        Ok({
            let server_key = make_key(KeyAlgorithm::default())?;
            let subject = DnTemplate::default().materialize(&DnOverrides::default())?;
            let request = super::build_request(
                &server_key,
                subject,
                [SanEntry::from("127.0.0.1")].into_iter().collect(),
                31,
            )?;
            assert_eq!(1, request.subject_alt_names().len());
            assert!(!request.ca);
        })
    }

    #[test]
    fn proof_of_possession() -> Result<(), Box<dyn Error>> {
        Ok({
            let server_key = make_key(KeyAlgorithm::default())?;
            let subject = DnTemplate::default().materialize(&DnOverrides::default())?;
            let request = super::build_request(
                &server_key,
                subject,
                [SanEntry::from("127.0.0.1")].into_iter().collect(),
                31,
            )?;

            let properties = request_properties_hash(
                &request.subject,
                &request.subject_alt_names,
                request.validity_days,
                request.ca,
                &request.public_key_der,
            )?;
            let public_key = PKey::public_key_from_der(&request.public_key_der)?;
            assert!(verify_proof(&public_key, &properties, &request.proof)?);

            let other_key = make_key(KeyAlgorithm::default())?;
            let other_public_key = PKey::public_key_from_der(&other_key.public_key_to_der()?)?;
            assert!(!verify_proof(&other_public_key, &properties, &request.proof)?);
        })
    }

    #[test]
    fn zero_validity() -> Result<(), Box<dyn Error>> {
        let server_key = make_key(KeyAlgorithm::default())?;
        let subject = DnTemplate::default().materialize(&DnOverrides::default())?;
        let Err(BuildRequestError::Validation(ValidationError::InvalidValidity { days: 0 })) =
            super::build_request(
                &server_key,
                subject,
                [SanEntry::from("127.0.0.1")].into_iter().collect(),
                0,
            )
        else {
            panic!()
        };
        Ok(())
    }
}
