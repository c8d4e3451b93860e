use std::time::Duration;
use std::time::SystemTime;

use localtls_common::x509::common_fields::SetCommonFieldsError;
use localtls_common::x509::common_fields::set_akid;
use localtls_common::x509::common_fields::set_common_fields;
use localtls_common::x509::name::MakeNameError;
use localtls_common::x509::name::make_name;
use localtls_common::x509::time::Asn1ToSystemTimeError;
use localtls_common::x509::validity::Validity;
use localtls_common::x509::validity::ValidityError;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::pkey::PKey;
use openssl::x509::X509;
use openssl::x509::X509Builder;
use openssl::x509::extension::BasicConstraints;
use openssl::x509::extension::KeyUsage;

use crate::ca::CertificateAuthority;
use crate::csr::CertificateRequest;
use crate::csr::MakeRequestHashError;
use crate::csr::proof::request_properties_hash;
use crate::csr::proof::verify_proof;
use crate::template::ValidationError;

const DAY: Duration = Duration::from_secs(3600 * 24);

/// Issues an end-entity certificate for a verified signing request.
///
/// The pipeline is linear: verify the proof of possession, enforce
/// policy, allocate a serial, build and sign. Any failure aborts
/// issuance; there is no degraded mode that signs an unverified
/// request.
pub fn issue(
    ca: &CertificateAuthority,
    request: CertificateRequest,
    validity_days: u32,
) -> Result<X509, SigningError> {
    if validity_days == 0 {
        return Err(ValidationError::InvalidValidity {
            days: validity_days,
        })?;
    }

    let public_key =
        PKey::public_key_from_der(&request.public_key_der).map_err(SigningError::ParsePublicKey)?;
    let properties = request_properties_hash(
        &request.subject,
        &request.subject_alt_names,
        request.validity_days,
        request.ca,
        &request.public_key_der,
    )?;
    // A malformed proof fails verification the same way a wrong one does.
    let verified = verify_proof(&public_key, &properties, &request.proof).unwrap_or(false);
    if !verified {
        return Err(SigningError::InvalidProofOfPossession);
    }

    // Requested extensions are enforced, never silently narrowed.
    if request.ca {
        return Err(SigningError::PolicyViolation);
    }

    let ca_validity: Validity = ca.certificate().try_into()?;
    let now = SystemTime::now();
    let remaining_days = ca_validity
        .to
        .duration_since(now)
        .map(|remaining| remaining.as_secs().div_ceil(DAY.as_secs()))
        .unwrap_or(0);
    if u64::from(validity_days) > remaining_days {
        return Err(SigningError::ExpiredPolicy {
            requested_days: validity_days,
            remaining_days,
        });
    }
    let mut window = Validity::days_from_now(validity_days);
    // The issued certificate must not outlive its trust anchor.
    window.to = window.to.min(ca_validity.to);

    let serial = ca.next_serial();

    let mut builder = X509Builder::new().map_err(SigningError::NewBuilder)?;
    builder
        .set_pubkey(&public_key)
        .map_err(SigningError::SetPublicKey)?;
    {
        let subject_name = make_name(&request.subject)?;
        set_common_fields(
            &mut builder,
            ca.certificate().subject_name(),
            &subject_name,
            window,
            serial,
        )?;
    }

    (|| {
        let basic_constraints = BasicConstraints::new().critical().build()?;
        builder.append_extension(basic_constraints)?;
        Ok(())
    })()
    .map_err(SigningError::BasicConstraints)?;

    (|| {
        let mut key_usage = KeyUsage::new();
        key_usage.critical();
        if request.key_usage.non_repudiation {
            key_usage.non_repudiation();
        }
        if request.key_usage.digital_signature {
            key_usage.digital_signature();
        }
        if request.key_usage.key_encipherment {
            key_usage.key_encipherment();
        }
        builder.append_extension(key_usage.build()?)?;
        Ok(())
    })()
    .map_err(SigningError::KeyUsage)?;

    (|| {
        let san = request
            .subject_alt_names
            .to_extension(&builder.x509v3_context(Some(ca.certificate()), None))?;
        builder.append_extension(san)?;
        Ok(())
    })()
    .map_err(SigningError::SubjectAlternativeName)?;

    set_akid(ca.certificate(), &mut builder).map_err(SigningError::AuthorityKeyIdentifier)?;

    builder
        .sign(ca.private_key(), openssl::hash::MessageDigest::sha256())
        .map_err(SigningError::Sign)?;

    Ok(builder.build())
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum SigningError {
    #[error("[{n}] {0}", n = self.name())]
    Validation(#[from] ValidationError),

    #[error("[{n}] Failed to parse the request's public key: {0}", n = self.name())]
    ParsePublicKey(ErrorStack),

    #[error("[{n}] {0}", n = self.name())]
    RequestHash(#[from] MakeRequestHashError),

    #[error("[{n}] The proof-of-possession signature does not verify against the request's public key", n = self.name())]
    InvalidProofOfPossession,

    #[error("[{n}] The request asks for CA:TRUE but only end-entity certificates are issued", n = self.name())]
    PolicyViolation,

    #[error("[{n}] {0}", n = self.name())]
    CaValidity(#[from] ValidityError<Asn1ToSystemTimeError>),

    #[error("[{n}] Requested {requested_days} days but the issuing CA only has {remaining_days} days left", n = self.name())]
    ExpiredPolicy {
        requested_days: u32,
        remaining_days: u64,
    },

    #[error("[{n}] Failed to create a new X509 Certificate builder: {0}", n = self.name())]
    NewBuilder(ErrorStack),

    #[error("[{n}] Failed to set the public key: {0}", n = self.name())]
    SetPublicKey(ErrorStack),

    #[error("[{n}] {0}", n = self.name())]
    MakeName(#[from] MakeNameError),

    #[error("[{n}] {0}", n = self.name())]
    SetCommonFields(#[from] SetCommonFieldsError),

    #[error("[{n}] Failed to set basic constraints: {0}", n = self.name())]
    BasicConstraints(ErrorStack),

    #[error("[{n}] Failed to set key usage: {0}", n = self.name())]
    KeyUsage(ErrorStack),

    #[error("[{n}] Failed to set subject alternative name: {0}", n = self.name())]
    SubjectAlternativeName(ErrorStack),

    #[error("[{n}] Failed to set AKID: {0}", n = self.name())]
    AuthorityKeyIdentifier(ErrorStack),

    #[error("[{n}] Failed to sign the certificate: {0}", n = self.name())]
    Sign(ErrorStack),
}
